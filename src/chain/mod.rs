//! The chain RPC surface the engine consumes.
//!
//! Everything the engine reads from or writes to the chain goes through
//! [`ChainClient`], so any node transport (or an in-memory double) can be
//! plugged in. [`EthersChain`] adapts any ethers `Middleware`.

mod provider;

pub use provider::EthersChain;

use async_trait::async_trait;
use ethers::abi::AbiDecode;
use ethers::types::{Address, Bytes, H256, U256};

use crate::prelude::Result;
use crate::Error;

/// A read-only call or a gas-estimation request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallMsg {
    pub from: Option<Address>,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub gas_price: Option<U256>,
}

impl CallMsg {
    pub fn new(to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            to,
            data: data.into(),
            ..Default::default()
        }
    }

    pub fn from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    pub fn value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    pub fn gas_price(mut self, gas_price: U256) -> Self {
        self.gas_price = Some(gas_price);
        self
    }
}

/// Error text from the node. Callers wrap it into the taxonomy variant that
/// names the failing step.
pub type RpcResult<T> = std::result::Result<T, String>;

#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn chain_id(&self) -> RpcResult<u64>;
    /// Nonce at the latest block.
    async fn nonce_at(&self, account: Address) -> RpcResult<U256>;
    async fn pending_nonce_at(&self, account: Address) -> RpcResult<U256>;
    async fn suggest_gas_price(&self) -> RpcResult<U256>;
    async fn estimate_gas(&self, call: &CallMsg) -> RpcResult<U256>;
    /// Broadcast an RLP-encoded signed transaction and return its hash.
    async fn send_raw_transaction(&self, raw: Bytes) -> RpcResult<H256>;
    async fn code_at(&self, account: Address) -> RpcResult<Bytes>;
    async fn call_contract(&self, call: &CallMsg) -> RpcResult<Bytes>;
}

/// `eth_call` a view function and decode its single return value.
pub(crate) async fn call_view<T: AbiDecode>(
    chain: &dyn ChainClient,
    what: &'static str,
    contract: Address,
    calldata: impl Into<Bytes>,
) -> Result<T> {
    let raw = chain
        .call_contract(&CallMsg::new(contract, calldata))
        .await
        .map_err(|message| Error::ChainRead {
            what,
            contract,
            message,
        })?;
    T::decode(raw.as_ref()).map_err(|e| Error::ChainRead {
        what,
        contract,
        message: format!("cannot decode return data 0x{}: {e}", hex::encode(&raw)),
    })
}
