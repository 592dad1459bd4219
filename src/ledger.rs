use async_trait::async_trait;
use ethers::{
    contract::abigen,
    providers::{Middleware, PendingTransaction, ProviderError},
    types::{Address, TransactionReceipt, TxHash, U256},
};
use log::debug;
use std::{
    error::Error as StdError,
    fmt::{Debug, Formatter, Result as FmtResult},
    sync::Arc,
};
use thiserror::Error;

abigen!(TransactionsContract, "abi/Transactions.json");

/// One entry of the contract's transfer log
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferEntry {
    pub sender: Address,
    pub receiver: Address,
    pub amount: U256,
    pub message: String,
    pub timestamp: U256,
    pub keyword: String,
}

impl From<TransferStruct> for TransferEntry {
    fn from(src: TransferStruct) -> Self {
        Self {
            sender: src.sender,
            receiver: src.receiver,
            amount: src.amount,
            message: src.message,
            timestamp: src.timestamp,
            keyword: src.keyword,
        }
    }
}

/// Handle of a submitted `addToBlockchain` call, resolved by
/// [`TransactionLedger::wait_for_confirmation`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingRecord {
    pub tx_hash: TxHash,
}

impl PendingRecord {
    pub fn new(tx_hash: TxHash) -> Self {
        Self { tx_hash }
    }
}

/// Typed access to the deployed transfer-recording contract
#[async_trait(?Send)]
pub trait TransactionLedger {
    type Error: StdError + Send + Sync + 'static;

    /// Whole transfer log, oldest first
    async fn get_all_transactions(&self) -> Result<Vec<TransferEntry>, Self::Error>;

    async fn get_transaction_count(&self) -> Result<U256, Self::Error>;

    /// Records a transfer on chain, signed by `from`
    async fn add_to_blockchain(
        &self,
        from: Address,
        receiver: Address,
        amount: U256,
        message: String,
        keyword: String,
    ) -> Result<PendingRecord, Self::Error>;

    /// Suspends until the recording transaction is mined
    async fn wait_for_confirmation(
        &self,
        pending: &PendingRecord,
    ) -> Result<TransactionReceipt, Self::Error>;
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Contract(Box<dyn StdError + Send + Sync>),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Transaction {0:?} was dropped before confirmation")]
    Dropped(TxHash),
}

/// [`TransactionLedger`] backed by an ethers middleware, usually
/// `Provider<InjectedWallet>`
pub struct EthersLedger<M> {
    contract: TransactionsContract<M>,
    client: Arc<M>,
}

impl<M: Middleware + 'static> EthersLedger<M> {
    pub fn new(address: Address, client: Arc<M>) -> Self {
        Self { contract: TransactionsContract::new(address, client.clone()), client }
    }

    pub fn address(&self) -> Address {
        self.contract.address()
    }
}

impl<M: Middleware + 'static> Debug for EthersLedger<M> {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "EthersLedger at {:?}", self.address())
    }
}

fn contract_error<E: StdError + Send + Sync + 'static>(e: E) -> LedgerError {
    LedgerError::Contract(Box::new(e))
}

#[async_trait(?Send)]
impl<M: Middleware + 'static> TransactionLedger for EthersLedger<M> {
    type Error = LedgerError;

    async fn get_all_transactions(&self) -> Result<Vec<TransferEntry>, LedgerError> {
        let entries = self.contract.get_all_transactions().call().await.map_err(contract_error)?;
        Ok(entries.into_iter().map(TransferEntry::from).collect())
    }

    async fn get_transaction_count(&self) -> Result<U256, LedgerError> {
        self.contract.get_transaction_count().call().await.map_err(contract_error)
    }

    async fn add_to_blockchain(
        &self,
        from: Address,
        receiver: Address,
        amount: U256,
        message: String,
        keyword: String,
    ) -> Result<PendingRecord, LedgerError> {
        let call = self.contract.add_to_blockchain(receiver, amount, message, keyword).from(from);
        let pending = call.send().await.map_err(contract_error)?;
        debug!("addToBlockchain sent as {:?}", pending.tx_hash());
        Ok(PendingRecord::new(pending.tx_hash()))
    }

    async fn wait_for_confirmation(
        &self,
        pending: &PendingRecord,
    ) -> Result<TransactionReceipt, LedgerError> {
        PendingTransaction::new(pending.tx_hash, self.client.provider())
            .await?
            .ok_or(LedgerError::Dropped(pending.tx_hash))
    }
}
