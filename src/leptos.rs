use std::rc::Rc;

use crate::{
    config::{CoordinatorBuilder, InjectedCoordinator},
    coordinator::TransactionState,
    event::Event,
    record::{FormField, FormInput, TransactionRecord},
};
use ethers::types::Address;
use leptos::*;
use log::{debug, error};

/// Root component for the transfer UI. Descendants get the state and actions
/// with `use_context::<TransactionContext>()`
#[component]
pub fn TransactionProvider(children: Children) -> impl IntoView {
    debug!("Creating transaction context");

    provide_context(TransactionContext::new());

    children()
}

#[derive(Clone, Debug)]
pub struct TransactionContext {
    coordinator: Option<Rc<InjectedCoordinator>>,
    state: ReadSignal<TransactionState>,
}

impl TransactionContext {
    pub(crate) fn new() -> Self {
        let (state, set_state) = create_signal(TransactionState::default());

        let mut builder = CoordinatorBuilder::new();
        builder.listener(Rc::new(move |event: Event| set_state.update(|s| s.apply(&event))));

        let coordinator = match builder.build_injected() {
            Ok(coordinator) => Some(Rc::new(coordinator)),
            Err(err) => {
                error!("Cannot create transaction coordinator: {err}");
                None
            }
        };

        if let Some(coordinator) = coordinator.clone() {
            if let Some(count) = coordinator.transaction_count() {
                set_state.update(|s| s.transaction_count = Some(count));
            }
            spawn_local(async move {
                let init = coordinator.initialize().await;
                debug!("Transaction context initialized: {init:?}");
            });
        }

        Self { coordinator, state }
    }

    /// Asks the wallet to connect; shows the install prompt when there is none
    pub fn connect(&self) {
        match self.coordinator.clone() {
            Some(coordinator) => spawn_local(async move {
                if let Err(err) = coordinator.connect().await {
                    error!("Connecting wallet failed: {err}");
                }
            }),
            None => error!("Transaction context is not configured!"),
        }
    }

    pub fn update_field(&self, field: FormField, value: String) {
        if let Some(coordinator) = &self.coordinator {
            coordinator.update_field(field, value);
        }
    }

    /// Sends the transfer in the form. Ignored while another one is pending.
    pub fn submit_transaction(&self) {
        if let Some(coordinator) = self.coordinator.clone() {
            spawn_local(async move {
                match coordinator.submit_transaction().await {
                    Ok(hash) => debug!("Transfer {hash:?} recorded"),
                    Err(err) => error!("Sending transaction failed: {err}"),
                }
            });
        }
    }

    /// Reactive view of the whole state
    pub fn state(&self) -> ReadSignal<TransactionState> {
        self.state
    }

    pub fn connected_account(&self) -> Option<Address> {
        self.state.with(|s| s.connection.account())
    }

    pub fn transactions(&self) -> Vec<TransactionRecord> {
        self.state.with(|s| s.transactions.clone())
    }

    pub fn form(&self) -> FormInput {
        self.state.with(|s| s.form.clone())
    }

    pub fn is_loading(&self) -> bool {
        self.state.with(|s| s.is_loading)
    }

    pub fn wallet_missing(&self) -> bool {
        self.state.with(|s| s.wallet_missing)
    }

    pub fn transaction_count(&self) -> Option<u64> {
        self.state.with(|s| s.transaction_count)
    }
}
