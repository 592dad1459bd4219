pub mod config;
pub mod coordinator;
pub mod eip1193;
pub mod error;
pub mod event;
pub mod ledger;
pub mod record;
pub mod storage;
pub mod wallet;

#[cfg(feature = "leptos")]
pub mod leptos;
#[cfg(feature = "yew")]
pub mod yew;

#[cfg(test)]
mod mock;

pub use config::{CoordinatorBuilder, InjectedCoordinator};
pub use coordinator::{Initialization, TransactionCoordinator, TransactionState};
pub use eip1193::{error::Eip1193Error, InjectedWallet};
pub use error::CoordinatorError;
pub use event::{ConnectionState, Event};
pub use ledger::{EthersLedger, PendingRecord, TransactionLedger, TransferEntry};
pub use record::{AmountError, FormField, FormInput, TransactionRecord};
pub use storage::{CountStore, LocalStorageCount, MemoryCountStore};
pub use wallet::{WalletError, WalletProvider};

/// Routes `log` output to the browser console and panics to `console.error`
pub fn init_logging(level: log::Level) {
    console_error_panic_hook::set_once();
    if let Err(err) = console_log::init_with_level(level) {
        log::warn!("Logger already initialized: {err}");
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
wasm_bindgen_test::wasm_bindgen_test_configure!(run_in_browser);
