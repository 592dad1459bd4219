//! In-memory wallet and contract used by the unit tests.

use async_trait::async_trait;
use ethers::types::{Address, TransactionReceipt, TransactionRequest, TxHash, U256};
use futures::channel::oneshot;
use std::cell::{Cell, RefCell};
use thiserror::Error;

use crate::{
    ledger::{PendingRecord, TransactionLedger, TransferEntry},
    wallet::{WalletError, WalletProvider},
};

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum MockError {
    #[error("User rejected the request")]
    Rejected,
    #[error("Internal JSON-RPC error")]
    Broken,
    #[error("No ethereum found")]
    Missing,
}

impl WalletError for MockError {
    fn is_rejection(&self) -> bool {
        *self == MockError::Rejected
    }

    fn is_missing_wallet(&self) -> bool {
        *self == MockError::Missing
    }
}

pub struct MockWallet {
    available: bool,
    accounts: Vec<Address>,
    authorization: RefCell<Result<Vec<Address>, MockError>>,
    send_failure: Cell<Option<MockError>>,
    sent: RefCell<Vec<TransactionRequest>>,
}

impl Default for MockWallet {
    fn default() -> Self {
        Self {
            available: true,
            accounts: Vec::new(),
            authorization: RefCell::new(Ok(Vec::new())),
            send_failure: Cell::new(None),
            sent: RefCell::new(Vec::new()),
        }
    }
}

impl MockWallet {
    pub fn missing() -> Self {
        Self { available: false, ..Self::default() }
    }

    /// Accounts already authorized in an earlier session
    pub fn with_accounts(accounts: Vec<Address>) -> Self {
        Self { accounts, ..Self::default() }
    }

    /// Answer to the next `request_accounts`
    pub fn authorize(&self, answer: Result<Vec<Address>, MockError>) {
        *self.authorization.borrow_mut() = answer;
    }

    pub fn fail_send(&self, err: MockError) {
        self.send_failure.set(Some(err));
    }

    pub fn sent(&self) -> Vec<TransactionRequest> {
        self.sent.borrow().clone()
    }
}

#[async_trait(?Send)]
impl WalletProvider for MockWallet {
    type Error = MockError;

    fn is_available(&self) -> bool {
        self.available
    }

    async fn accounts(&self) -> Result<Vec<Address>, MockError> {
        Ok(self.accounts.clone())
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, MockError> {
        self.authorization.borrow().clone()
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash, MockError> {
        if let Some(err) = self.send_failure.get() {
            return Err(err);
        }
        let mut sent = self.sent.borrow_mut();
        sent.push(tx);
        Ok(TxHash::from_low_u64_be(sent.len() as u64))
    }
}

/// Contract double: `addToBlockchain` appends to the log right away, as a
/// mined transaction would.
#[derive(Default)]
pub struct MockLedger {
    entries: RefCell<Vec<TransferEntry>>,
    calls: RefCell<Vec<&'static str>>,
    pending: Cell<Option<PendingRecord>>,
    gate: RefCell<Option<oneshot::Receiver<()>>>,
    count_failure: Cell<bool>,
    count_override: Cell<Option<U256>>,
    history_failure: Cell<bool>,
    confirmation_failure: Cell<bool>,
}

impl MockLedger {
    pub fn push_entry(&self, entry: TransferEntry) {
        self.entries.borrow_mut().push(entry);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }

    pub fn last_pending(&self) -> Option<PendingRecord> {
        self.pending.get()
    }

    /// Confirmation suspends until `gate` resolves
    pub fn hold_confirmation(&self, gate: oneshot::Receiver<()>) {
        *self.gate.borrow_mut() = Some(gate);
    }

    /// Count returned instead of the number of entries
    pub fn report_count(&self, count: U256) {
        self.count_override.set(Some(count));
    }

    pub fn fail_count(&self) {
        self.count_failure.set(true);
    }

    pub fn fail_history(&self) {
        self.history_failure.set(true);
    }

    pub fn fail_confirmation(&self) {
        self.confirmation_failure.set(true);
    }

    fn record(&self, call: &'static str) {
        self.calls.borrow_mut().push(call);
    }
}

#[async_trait(?Send)]
impl TransactionLedger for MockLedger {
    type Error = MockError;

    async fn get_all_transactions(&self) -> Result<Vec<TransferEntry>, MockError> {
        self.record("getAllTransactions");
        if self.history_failure.get() {
            return Err(MockError::Broken);
        }
        Ok(self.entries.borrow().clone())
    }

    async fn get_transaction_count(&self) -> Result<U256, MockError> {
        self.record("getTransactionCount");
        if self.count_failure.get() {
            return Err(MockError::Broken);
        }
        Ok(self
            .count_override
            .get()
            .unwrap_or_else(|| U256::from(self.entries.borrow().len() as u64)))
    }

    async fn add_to_blockchain(
        &self,
        from: Address,
        receiver: Address,
        amount: U256,
        message: String,
        keyword: String,
    ) -> Result<PendingRecord, MockError> {
        self.record("addToBlockchain");
        self.push_entry(TransferEntry {
            sender: from,
            receiver,
            amount,
            message,
            timestamp: U256::from(1_700_000_000u64),
            keyword,
        });
        let pending = PendingRecord::new(TxHash::repeat_byte(self.entries.borrow().len() as u8));
        self.pending.set(Some(pending));
        Ok(pending)
    }

    async fn wait_for_confirmation(
        &self,
        _pending: &PendingRecord,
    ) -> Result<TransactionReceipt, MockError> {
        self.record("waitForConfirmation");
        let gate = self.gate.borrow_mut().take();
        if let Some(gate) = gate {
            _ = gate.await;
        }
        if self.confirmation_failure.get() {
            return Err(MockError::Broken);
        }
        Ok(TransactionReceipt::default())
    }
}
