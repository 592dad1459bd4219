use crate::{
    config::{CoordinatorBuilder, InjectedCoordinator},
    coordinator::TransactionState,
    event::Event,
    record::{FormField, FormInput, TransactionRecord},
};
use ethers::types::Address;
use log::{debug, error};
use std::rc::Rc;
use yew::{
    function_component, html, platform::spawn_local, prelude::*, Children, ContextProvider, Html,
    Properties,
};

impl Reducible for TransactionState {
    type Action = Event;

    fn reduce(self: Rc<Self>, action: Event) -> Rc<Self> {
        let mut state = (*self).clone();
        state.apply(&action);
        Rc::new(state)
    }
}

#[derive(Properties, PartialEq)]
pub struct Props {
    #[prop_or_default]
    pub children: Children,
}

#[function_component(TransactionContextProvider)]
pub fn transaction_context_provider(props: &Props) -> Html {
    let transactions = use_transactions();

    html! {
        <ContextProvider<UseTransactions> context={transactions}>
            {for props.children.iter()}
        </ContextProvider<UseTransactions>>
    }
}

/// Context value handed to components: the rendered state plus the actions
/// that change it
#[derive(Clone, Debug)]
pub struct UseTransactions {
    coordinator: Option<Rc<InjectedCoordinator>>,
    pub state: UseReducerHandle<TransactionState>,
}

impl PartialEq for UseTransactions {
    fn eq(&self, other: &Self) -> bool {
        self.state == other.state
    }
}

impl UseTransactions {
    /// Asks the wallet to connect; shows the install prompt when there is none
    pub fn connect(&self) {
        if let Some(coordinator) = self.coordinator.clone() {
            spawn_local(async move {
                if let Err(err) = coordinator.connect().await {
                    error!("Connecting wallet failed: {err}");
                }
            });
        } else {
            error!("Transaction context is not configured!");
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

    pub fn connected_account(&self) -> Option<Address> {
        self.state.connection.account()
    }

    pub fn transactions(&self) -> &[TransactionRecord] {
        &self.state.transactions
    }

    pub fn form(&self) -> &FormInput {
        &self.state.form
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading
    }

    /// Set once an operation found no injected wallet
    pub fn wallet_missing(&self) -> bool {
        self.state.wallet_missing
    }

    pub fn transaction_count(&self) -> Option<u64> {
        self.state.transaction_count
    }
}

#[hook]
pub fn use_transactions() -> UseTransactions {
    let state = use_reducer(TransactionState::default);

    let dispatcher = state.dispatcher();
    let coordinator = use_memo((), move |_| {
        let mut builder = CoordinatorBuilder::new();
        builder.listener(Rc::new(move |event: Event| dispatcher.dispatch(event)));
        match builder.build_injected() {
            Ok(coordinator) => Some(Rc::new(coordinator)),
            Err(err) => {
                error!("Cannot create transaction coordinator: {err}");
                None
            }
        }
    });
    let coordinator = (*coordinator).clone();

    {
        let coordinator = coordinator.clone();
        let dispatcher = state.dispatcher();
        yew_hooks::use_effect_once(move || {
            if let Some(coordinator) = coordinator {
                if let Some(count) = coordinator.transaction_count() {
                    dispatcher.dispatch(Event::TransactionCountChanged(count));
                }
                spawn_local(async move {
                    let init = coordinator.initialize().await;
                    debug!("Transaction context initialized: {init:?}");
                });
            }
            || {}
        });
    }

    UseTransactions { coordinator, state }
}
