use std::sync::Arc;

use async_trait::async_trait;
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, BlockNumber, Bytes, TransactionRequest, H256, U256};

use super::{CallMsg, ChainClient, RpcResult};
use crate::prelude::Result;
use crate::Error;

/// [`ChainClient`] over an ethers middleware stack.
#[derive(Debug, Clone)]
pub struct EthersChain<M> {
    inner: Arc<M>,
}

impl<M: Middleware> EthersChain<M> {
    pub fn new(inner: Arc<M>) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &Arc<M> {
        &self.inner
    }
}

impl EthersChain<Provider<Http>> {
    pub fn connect(rpc_url: &str) -> Result<Self> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| Error::Configuration(format!("invalid RPC url {rpc_url}: {e}")))?;
        Ok(Self::new(Arc::new(provider)))
    }
}

fn to_typed(call: &CallMsg) -> TypedTransaction {
    let mut tx = TransactionRequest::new()
        .to(call.to)
        .value(call.value)
        .data(call.data.clone());
    if let Some(from) = call.from {
        tx = tx.from(from);
    }
    if let Some(gas_price) = call.gas_price {
        tx = tx.gas_price(gas_price);
    }
    tx.into()
}

#[async_trait]
impl<M> ChainClient for EthersChain<M>
where
    M: Middleware + 'static,
{
    async fn chain_id(&self) -> RpcResult<u64> {
        self.inner
            .get_chainid()
            .await
            .map(|id| id.as_u64())
            .map_err(|e| e.to_string())
    }

    async fn nonce_at(&self, account: Address) -> RpcResult<U256> {
        self.inner
            .get_transaction_count(account, Some(BlockNumber::Latest.into()))
            .await
            .map_err(|e| e.to_string())
    }

    async fn pending_nonce_at(&self, account: Address) -> RpcResult<U256> {
        self.inner
            .get_transaction_count(account, Some(BlockNumber::Pending.into()))
            .await
            .map_err(|e| e.to_string())
    }

    async fn suggest_gas_price(&self) -> RpcResult<U256> {
        self.inner.get_gas_price().await.map_err(|e| e.to_string())
    }

    async fn estimate_gas(&self, call: &CallMsg) -> RpcResult<U256> {
        self.inner
            .estimate_gas(&to_typed(call), None)
            .await
            .map_err(|e| e.to_string())
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> RpcResult<H256> {
        self.inner
            .send_raw_transaction(raw)
            .await
            .map(|pending| pending.tx_hash())
            .map_err(|e| e.to_string())
    }

    async fn code_at(&self, account: Address) -> RpcResult<Bytes> {
        self.inner
            .get_code(account, None)
            .await
            .map_err(|e| e.to_string())
    }

    async fn call_contract(&self, call: &CallMsg) -> RpcResult<Bytes> {
        self.inner
            .call(&to_typed(call), None)
            .await
            .map_err(|e| e.to_string())
    }
}
