use ethers::types::{Address, TxHash, U256};
use log::{debug, error, info, warn};
use std::{
    cell::RefCell,
    fmt::{Debug, Formatter, Result as FmtResult},
    rc::Rc,
};
use tokio::sync::Mutex;

use crate::{
    error::{Cause, CoordinatorError},
    event::{ConnectionState, Event},
    ledger::TransactionLedger,
    record::{to_base_units, FormField, FormInput, TransactionRecord},
    storage::CountStore,
    wallet::{transfer_request, WalletError, WalletProvider},
};

/// Everything the UI renders, kept in one place
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransactionState {
    pub connection: ConnectionState,
    pub form: FormInput,
    pub is_loading: bool,
    pub transactions: Vec<TransactionRecord>,
    pub transaction_count: Option<u64>,
    pub wallet_missing: bool,
}

impl TransactionState {
    /// Folds a coordinator event into a UI-side copy of the state
    pub fn apply(&mut self, event: &Event) {
        match event {
            Event::InstallWalletPrompt => self.wallet_missing = true,
            Event::ConnectionChanged(connection) => self.connection = *connection,
            Event::FormChanged(form) => self.form = form.clone(),
            Event::LoadingChanged(loading) => self.is_loading = *loading,
            Event::TransactionsChanged(transactions) => self.transactions = transactions.clone(),
            Event::TransactionCountChanged(count) => self.transaction_count = Some(*count),
        }
    }
}

/// Outcome of [`TransactionCoordinator::initialize`]. Both checks always run.
#[derive(Debug)]
pub struct Initialization {
    pub account: Result<Option<Address>, CoordinatorError>,
    pub transaction_count: Result<Option<u64>, CoordinatorError>,
}

/// Binds an injected wallet and the transfer-recording contract to UI state.
///
/// Operations run on a single-threaded executor; state is never borrowed
/// across an await so the listener may read it back while handling an event.
pub struct TransactionCoordinator<W, L, S> {
    wallet: W,
    ledger: L,
    store: S,
    state: RefCell<TransactionState>,
    submission: Mutex<()>,
    listener: Option<Rc<dyn Fn(Event)>>,
}

impl<W, L, S> Debug for TransactionCoordinator<W, L, S> {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        let state = self.state.borrow();
        write!(
            f,
            "TransactionCoordinator {}, {} transactions, loading: {}",
            state.connection,
            state.transactions.len(),
            state.is_loading
        )
    }
}

impl<W, L, S> TransactionCoordinator<W, L, S>
where
    W: WalletProvider,
    L: TransactionLedger,
    S: CountStore,
{
    pub fn new(wallet: W, ledger: L, store: S, listener: Option<Rc<dyn Fn(Event)>>) -> Self {
        let state =
            TransactionState { transaction_count: store.load(), ..TransactionState::default() };
        Self {
            wallet,
            ledger,
            store,
            state: RefCell::new(state),
            submission: Mutex::new(()),
            listener,
        }
    }

    pub fn wallet(&self) -> &W {
        &self.wallet
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Snapshot of the whole state
    pub fn state(&self) -> TransactionState {
        self.state.borrow().clone()
    }

    pub fn connection(&self) -> ConnectionState {
        self.state.borrow().connection
    }

    pub fn connected_account(&self) -> Option<Address> {
        self.state.borrow().connection.account()
    }

    pub fn transactions(&self) -> Vec<TransactionRecord> {
        self.state.borrow().transactions.clone()
    }

    pub fn form(&self) -> FormInput {
        self.state.borrow().form.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    pub fn transaction_count(&self) -> Option<u64> {
        self.state.borrow().transaction_count
    }

    /// Runs the mount-time checks: an already authorized account (which also
    /// loads the history) and the on-chain transaction count.
    pub async fn initialize(&self) -> Initialization {
        let account = self.check_connected_account().await;
        let transaction_count = self.check_transaction_count().await;
        Initialization { account, transaction_count }
    }

    /// Asks the wallet for authorization and connects the first account
    pub async fn connect(&self) -> Result<Address, CoordinatorError> {
        self.ensure_wallet()?;

        let previous = self.connection();
        self.set_connection(ConnectionState::Connecting);

        let accounts = match self.wallet.request_accounts().await {
            Ok(accounts) => accounts,
            Err(err) => {
                error!("Account authorization failed: {err}");
                self.set_connection(previous);
                return Err(self.wallet_failure(err, CoordinatorError::NetworkError));
            }
        };

        let Some(account) = accounts.first().copied() else {
            warn!("Wallet authorized no accounts");
            self.set_connection(previous);
            return Err(CoordinatorError::NoAccounts);
        };

        info!("Connected {account:?}");
        self.set_connection(ConnectionState::Connected(account));
        if self.refresh_history().await.is_err() {
            warn!("Connected without transaction history");
        }
        Ok(account)
    }

    /// Looks for an account authorized in an earlier session, without prompting
    pub async fn check_connected_account(&self) -> Result<Option<Address>, CoordinatorError> {
        self.ensure_wallet()?;

        let accounts = self.wallet.accounts().await.map_err(|err| {
            error!("Cannot read wallet accounts: {err}");
            self.wallet_failure(err, CoordinatorError::NetworkError)
        })?;

        match accounts.first().copied() {
            Some(account) => {
                self.set_connection(ConnectionState::Connected(account));
                if self.refresh_history().await.is_err() {
                    warn!("Restored {account:?} without transaction history");
                }
                Ok(Some(account))
            }
            None => {
                info!("No accounts found");
                Ok(None)
            }
        }
    }

    /// Fetches the on-chain count and persists it. Skipped without a wallet.
    pub async fn check_transaction_count(&self) -> Result<Option<u64>, CoordinatorError> {
        if !self.wallet.is_available() {
            return Ok(None);
        }

        let count = self.ledger.get_transaction_count().await.map_err(|err| {
            error!("Cannot fetch transaction count: {err}");
            CoordinatorError::network(err)
        })?;
        if count > U256::from(u64::MAX) {
            error!("Transaction count {count} is out of range");
            return Err(CoordinatorError::CountOutOfRange(count));
        }
        let count = count.as_u64();

        self.store.store(count);
        self.state.borrow_mut().transaction_count = Some(count);
        self.emit(Event::TransactionCountChanged(count));
        Ok(Some(count))
    }

    /// Replaces the transaction list with a fresh copy of the contract's log.
    /// Without a wallet this silently does nothing.
    pub async fn refresh_history(&self) -> Result<(), CoordinatorError> {
        if !self.wallet.is_available() {
            debug!("Ethereum is not present");
            return Ok(());
        }

        let entries = self.ledger.get_all_transactions().await.map_err(|err| {
            error!("Cannot fetch transactions: {err}");
            CoordinatorError::network(err)
        })?;

        let transactions: Vec<TransactionRecord> =
            entries.into_iter().map(TransactionRecord::from).collect();
        debug!("Fetched {} transactions", transactions.len());

        self.state.borrow_mut().transactions = transactions.clone();
        self.emit(Event::TransactionsChanged(transactions));
        Ok(())
    }

    pub fn update_field(&self, field: FormField, value: impl Into<String>) {
        let form = {
            let mut state = self.state.borrow_mut();
            state.form.set(field, value);
            state.form.clone()
        };
        self.emit(Event::FormChanged(form));
    }

    pub fn set_form(&self, form: FormInput) {
        self.state.borrow_mut().form = form.clone();
        self.emit(Event::FormChanged(form));
    }

    /// Sends the value transfer, records it on the contract and waits for the
    /// record to be mined. Afterwards the count and history are re-read and the
    /// form is cleared. Only one submission runs at a time.
    pub async fn submit_transaction(&self) -> Result<TxHash, CoordinatorError> {
        let _guard = self.submission.try_lock().map_err(|_| {
            warn!("Submission ignored, another one is pending");
            CoordinatorError::SubmissionInFlight
        })?;

        self.ensure_wallet()?;
        let from = self.connected_account().ok_or(CoordinatorError::NotConnected)?;

        let FormInput { address_to, amount, keyword, message } = self.form();
        let receiver = parse_recipient(&address_to)?;
        let amount = to_base_units(&amount).map_err(|err| {
            error!("Cannot parse amount: {err}");
            CoordinatorError::from(err)
        })?;

        let transfer = self
            .wallet
            .send_transaction(transfer_request(from, receiver, amount))
            .await
            .map_err(|err| {
                error!("Value transfer failed: {err}");
                self.wallet_failure(err, CoordinatorError::TransactionFailed)
            })?;
        debug!("Value transfer sent as {transfer:?}");

        let pending = self
            .ledger
            .add_to_blockchain(from, receiver, amount, message, keyword)
            .await
            .map_err(|err| {
                error!("Cannot record transfer: {err}");
                CoordinatorError::transaction(err)
            })?;

        self.set_loading(true);
        info!("Loading - {:?}", pending.tx_hash);
        let confirmation = self.ledger.wait_for_confirmation(&pending).await;
        self.set_loading(false);

        if let Err(err) = confirmation {
            error!("Transfer record {:?} failed: {err}", pending.tx_hash);
            return Err(CoordinatorError::transaction(err));
        }
        info!("Success - {:?}", pending.tx_hash);

        self.check_transaction_count().await?;

        self.set_form(FormInput::default());
        if self.refresh_history().await.is_err() {
            warn!("Transfer {:?} recorded but history is stale", pending.tx_hash);
        }
        Ok(pending.tx_hash)
    }

    fn ensure_wallet(&self) -> Result<(), CoordinatorError> {
        if self.wallet.is_available() {
            return Ok(());
        }
        self.prompt_install();
        Err(CoordinatorError::WalletMissing)
    }

    /// A wallet that vanished mid-request gets the same prompt as one never found
    fn wallet_failure<E: WalletError>(
        &self,
        err: E,
        otherwise: fn(Cause) -> CoordinatorError,
    ) -> CoordinatorError {
        let err = CoordinatorError::from_wallet(err, otherwise);
        if matches!(err, CoordinatorError::WalletMissing) {
            self.prompt_install();
        }
        err
    }

    fn prompt_install(&self) {
        warn!("Please install metamask");
        self.state.borrow_mut().wallet_missing = true;
        self.emit(Event::InstallWalletPrompt);
    }

    fn set_connection(&self, connection: ConnectionState) {
        self.state.borrow_mut().connection = connection;
        self.emit(Event::ConnectionChanged(connection));
    }

    fn set_loading(&self, loading: bool) {
        self.state.borrow_mut().is_loading = loading;
        self.emit(Event::LoadingChanged(loading));
    }

    fn emit(&self, event: Event) {
        if let Some(listener) = &self.listener {
            listener(event);
        }
    }
}

fn parse_recipient(address: &str) -> Result<Address, CoordinatorError> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(CoordinatorError::InvalidRecipient(address.to_string()));
    }
    trimmed.parse().map_err(|_| CoordinatorError::InvalidRecipient(address.to_string()))
}
