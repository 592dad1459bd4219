use ethers::types::U256;
use std::error::Error as StdError;
use thiserror::Error;

use crate::{record::AmountError, wallet::WalletError};

/// Underlying failure reported by the wallet or the contract binding
pub type Cause = Box<dyn StdError + Send + Sync>;

#[derive(Error, Debug)]
pub enum CoordinatorError {
    #[error("No ethereum wallet found, please install MetaMask")]
    WalletMissing,

    #[error("Wallet authorization denied: {0}")]
    AuthorizationDenied(#[source] Cause),

    #[error("Wallet returned no accounts")]
    NoAccounts,

    #[error("No connected account")]
    NotConnected,

    #[error("A transaction is already being submitted")]
    SubmissionInFlight,

    #[error("Invalid recipient address `{0}`")]
    InvalidRecipient(String),

    #[error("Invalid amount: {0}")]
    Conversion(#[from] AmountError),

    #[error("Transaction failed: {0}")]
    TransactionFailed(#[source] Cause),

    #[error("Transaction count {0} does not fit in 64 bits")]
    CountOutOfRange(U256),

    #[error("Network error: {0}")]
    NetworkError(#[source] Cause),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CoordinatorError {
    /// Classifies a wallet failure; anything that is neither a rejection nor a
    /// vanished wallet becomes `otherwise`
    pub fn from_wallet<E: WalletError>(err: E, otherwise: fn(Cause) -> Self) -> Self {
        if err.is_missing_wallet() {
            CoordinatorError::WalletMissing
        } else if err.is_rejection() {
            CoordinatorError::AuthorizationDenied(Box::new(err))
        } else {
            otherwise(Box::new(err))
        }
    }

    pub fn network<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        CoordinatorError::NetworkError(Box::new(err))
    }

    pub fn transaction<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        CoordinatorError::TransactionFailed(Box::new(err))
    }
}
