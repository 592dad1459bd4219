use crate::eip1193::error::Eip1193Error;
use wasm_bindgen::{prelude::wasm_bindgen, JsValue};

/// Argument object of `window.ethereum.request({ method, params })`
#[wasm_bindgen]
#[derive(Debug)]
pub struct RequestArguments {
    method: String,
    params: JsValue,
}

#[wasm_bindgen]
impl RequestArguments {
    #[wasm_bindgen(getter)]
    pub fn method(&self) -> String {
        self.method.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn params(&self) -> JsValue {
        self.params.clone()
    }
}

impl RequestArguments {
    pub(crate) fn new(method: &str, params: JsValue) -> Self {
        Self { method: method.to_owned(), params }
    }
}

#[wasm_bindgen]
extern "C" {
    #[derive(Clone, Debug)]
    /// An EIP-1193 provider object. Available by convention at `window.ethereum`
    pub(crate) type Ethereum;

    #[wasm_bindgen(catch, method)]
    pub(crate) async fn request(_: &Ethereum, args: RequestArguments) -> Result<JsValue, JsValue>;
}

impl Ethereum {
    pub(crate) fn default_opt() -> Result<Self, Eip1193Error> {
        match get_provider_js() {
            Ok(Some(eth)) => Ok(eth),
            _ => Err(Eip1193Error::JsNoEthereum),
        }
    }
}

#[wasm_bindgen(inline_js = "export function get_provider_js() {return window.ethereum}")]
extern "C" {
    #[wasm_bindgen(catch)]
    fn get_provider_js() -> Result<Option<Ethereum>, JsValue>;
}
