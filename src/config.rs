use ethers::{providers::Provider, types::Address};
use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    rc::Rc,
    sync::Arc,
};

use crate::{
    coordinator::TransactionCoordinator,
    eip1193::InjectedWallet,
    error::CoordinatorError,
    event::Event,
    ledger::{EthersLedger, TransactionLedger},
    storage::{CountStore, LocalStorageCount, TRANSACTION_COUNT_KEY},
    wallet::WalletProvider,
};

/// Coordinator talking to `window.ethereum` and keeping the count in `localStorage`
pub type InjectedCoordinator =
    TransactionCoordinator<InjectedWallet, EthersLedger<Provider<InjectedWallet>>, LocalStorageCount>;

pub struct CoordinatorBuilder {
    pub contract_address: Option<String>,
    pub count_key: String,
    listener: Option<Rc<dyn Fn(Event)>>,
}

impl Debug for CoordinatorBuilder {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(
            f,
            "CoordinatorBuilder for contract {:?}, count key {}",
            self.contract_address, self.count_key
        )
    }
}

impl Default for CoordinatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CoordinatorBuilder {
    /// Contract address defaults to the `CONTRACT_ADDRESS` set at compile time
    pub fn new() -> Self {
        Self {
            contract_address: std::option_env!("CONTRACT_ADDRESS").map(str::to_string),
            count_key: TRANSACTION_COUNT_KEY.to_string(),
            listener: None,
        }
    }

    pub fn contract_address(&mut self, address: &str) -> &mut Self {
        self.contract_address = Some(address.to_string());
        self
    }

    pub fn count_key(&mut self, key: &str) -> &mut Self {
        self.count_key = key.to_string();
        self
    }

    pub fn listener(&mut self, listener: Rc<dyn Fn(Event)>) -> &mut Self {
        self.listener = Some(listener);
        self
    }

    pub fn contract(&self) -> Result<Address, CoordinatorError> {
        let address = self
            .contract_address
            .as_deref()
            .ok_or_else(|| CoordinatorError::InvalidConfig("contract address not set".into()))?;
        address
            .trim()
            .parse()
            .map_err(|_| CoordinatorError::InvalidConfig(format!("bad contract address {address}")))
    }

    pub fn build<W, L, S>(&self, wallet: W, ledger: L, store: S) -> TransactionCoordinator<W, L, S>
    where
        W: WalletProvider,
        L: TransactionLedger,
        S: CountStore,
    {
        TransactionCoordinator::new(wallet, ledger, store, self.listener.clone())
    }

    pub fn build_injected(&self) -> Result<InjectedCoordinator, CoordinatorError> {
        let address = self.contract()?;
        let wallet = InjectedWallet::new();
        let provider = Arc::new(Provider::new(wallet.clone()));
        let ledger = EthersLedger::new(address, provider);

        Ok(self.build(wallet, ledger, LocalStorageCount::new(&self.count_key)))
    }
}
