use ethers::types::Address;
use std::fmt::Display;

use crate::record::{FormInput, TransactionRecord};

/// Account connection lifecycle. There is no way back from `Connected`:
/// wallet-side disconnects and account switches are not observed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected(Address),
}

impl ConnectionState {
    pub fn account(&self) -> Option<Address> {
        match self {
            ConnectionState::Connected(account) => Some(*account),
            _ => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.account().is_some()
    }
}

impl Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected(account) => write!(f, "connected as {account:?}"),
        }
    }
}

/// State changes pushed to the UI listener
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// No injected wallet, the user should be asked to install one
    InstallWalletPrompt,
    ConnectionChanged(ConnectionState),
    FormChanged(FormInput),
    LoadingChanged(bool),
    /// Always a complete snapshot of the contract's log
    TransactionsChanged(Vec<TransactionRecord>),
    TransactionCountChanged(u64),
}
