pub mod error;
pub mod ethereum;

use crate::{
    eip1193::{
        error::Eip1193Error,
        ethereum::{Ethereum, RequestArguments},
    },
    wallet::WalletProvider,
};
use async_trait::async_trait;
use ethers::{
    providers::JsonRpcClient,
    types::{Address, TransactionRequest, TxHash},
};
use futures::channel::oneshot;
use gloo_utils::format::JsValueSerdeExt;
use log::debug;
use serde::{de::DeserializeOwned, Serialize};
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::spawn_local;

#[derive(Debug, Clone, Default)]
// `window.ethereum` is a JS object and neither Send nor Sync, so the
// handle is looked up again on every request instead of being stored.
pub struct InjectedWallet {}

impl InjectedWallet {
    pub fn new() -> Self {
        InjectedWallet {}
    }

    pub fn is_injected() -> bool {
        Ethereum::default_opt().is_ok()
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl JsonRpcClient for InjectedWallet {
    type Error = Eip1193Error;

    /// Sends the request via `window.ethereum` in Js
    async fn request<T: Serialize + Send + Sync, R: DeserializeOwned + Send>(
        &self,
        method: &str,
        params: T,
    ) -> Result<R, Self::Error> {
        let (sender, receiver) = oneshot::channel();

        let method = method.to_string();
        let params = parse_params(params)?;
        spawn_local(async move {
            let res = match Ethereum::default_opt() {
                Ok(ethereum) => {
                    match ethereum.request(RequestArguments::new(&method, params)).await {
                        Ok(value) => stringify(&value),
                        Err(e) => Err(e.into()),
                    }
                }
                Err(e) => Err(e),
            };
            _ = sender.send(res);
        });

        let res = receiver.await.map_err(|_| Eip1193Error::CommunicationError)?;
        Ok(serde_json::from_str(&res?)?)
    }
}

#[async_trait(?Send)]
impl WalletProvider for InjectedWallet {
    type Error = Eip1193Error;

    fn is_available(&self) -> bool {
        Self::is_injected()
    }

    async fn accounts(&self) -> Result<Vec<Address>, Eip1193Error> {
        self.request("eth_accounts", ()).await
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, Eip1193Error> {
        self.request("eth_requestAccounts", ()).await
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash, Eip1193Error> {
        debug!("eth_sendTransaction {tx:?}");
        self.request("eth_sendTransaction", [tx]).await
    }
}

fn stringify(value: &JsValue) -> Result<String, Eip1193Error> {
    if value.is_undefined() {
        return Ok("null".to_string());
    }
    js_sys::JSON::stringify(value)?.as_string().ok_or(Eip1193Error::JsParseError)
}

/// Serializes request params into the positional array wallets expect.
///
/// Typed transactions serialized by ethers carry `type: "0x02"` while injected
/// wallets only accept the unpadded `"0x2"`, so transaction types are rewritten.
fn parse_params<T: Serialize>(params: T) -> Result<JsValue, Eip1193Error> {
    let mut value = serde_json::to_value(&params)?;
    match &mut value {
        serde_json::Value::Null => return Ok(js_sys::Array::new().into()),
        serde_json::Value::Array(items) => items.iter_mut().for_each(normalize_tx_type),
        other => normalize_tx_type(other),
    }
    Ok(JsValue::from_serde(&value)?)
}

fn normalize_tx_type(item: &mut serde_json::Value) {
    if let Some(kind) = item.get_mut("type") {
        let unpadded = match kind.as_str() {
            Some(s) if s.starts_with("0x0") && s.len() > 3 => format!("0x{}", &s[3..]),
            _ => return,
        };
        *kind = serde_json::Value::String(unpadded);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn padded_transaction_types_are_shortened() {
        for i in 1..4 {
            let mut tx = json!({ "type": format!("0x0{i}"), "value": "0x1" });
            normalize_tx_type(&mut tx);
            assert_eq!(tx["type"], json!(format!("0x{i}")));
            assert_eq!(tx["value"], json!("0x1"));
        }
    }

    #[test]
    fn other_types_are_left_alone() {
        let mut tx = json!({ "type": "0x2", "to": "0x01" });
        normalize_tx_type(&mut tx);
        assert_eq!(tx["type"], json!("0x2"));

        let mut legacy = json!({ "gas": "0x5208" });
        normalize_tx_type(&mut legacy);
        assert_eq!(legacy, json!({ "gas": "0x5208" }));
    }
}
