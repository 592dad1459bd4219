use async_trait::async_trait;
use ethers::types::{Address, TransactionRequest, TxHash, U256};
use std::error::Error as StdError;

/// Gas allowance sent along with a plain value transfer (`0x5208`)
pub const TRANSFER_GAS_LIMIT: u64 = 21_000;

/// Lets the coordinator tell a refused request apart from a broken one
pub trait WalletError: StdError + Send + Sync + 'static {
    /// The user declined the request in the wallet
    fn is_rejection(&self) -> bool;

    /// The wallet disappeared between the availability check and the call
    fn is_missing_wallet(&self) -> bool {
        false
    }
}

/// Account custody and signing capability, normally the injected `window.ethereum`.
#[async_trait(?Send)]
pub trait WalletProvider {
    type Error: WalletError;

    /// Whether a wallet is present in the execution environment
    fn is_available(&self) -> bool;

    /// Already authorized accounts, never prompts the user
    async fn accounts(&self) -> Result<Vec<Address>, Self::Error>;

    /// Asks the user to authorize this site
    async fn request_accounts(&self) -> Result<Vec<Address>, Self::Error>;

    /// Signs and broadcasts a raw transaction, resolving to its hash
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash, Self::Error>;
}

/// Plain value transfer the wallet is asked to sign before the transfer is recorded
pub fn transfer_request(from: Address, to: Address, value: U256) -> TransactionRequest {
    TransactionRequest::new().from(from).to(to).gas(TRANSFER_GAS_LIMIT).value(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::NameOrAddress;

    #[test]
    fn transfer_carries_fixed_gas_limit() {
        let from = Address::repeat_byte(0xaa);
        let to = Address::repeat_byte(0xbb);
        let tx = transfer_request(from, to, U256::exp10(18));

        assert_eq!(tx.from, Some(from));
        assert_eq!(tx.to, Some(NameOrAddress::Address(to)));
        assert_eq!(tx.gas, Some(U256::from(0x5208u64)));
        assert_eq!(tx.value, Some(U256::exp10(18)));
    }
}
