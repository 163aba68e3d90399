use std::sync::Arc;

use dashmap::DashMap;
use ethers::abi::AbiEncode;
use ethers::types::{Address, Bytes, Signature, H256, U256};
use log::info;
use tokio::sync::Mutex;

use super::GasEstimator;
use crate::bindings::gnosis_safe::{ExecTransactionCall, NonceCall};
use crate::chain::{call_view, ChainClient};
use crate::prelude::Result;
use crate::sender::TransactionSender;
use crate::signature::{
    pack_signature, safe_tx_typed_data, verify_typed_signature, SafeOperation, SafeTransaction,
};
use crate::signer::SignerBackend;

/// A signed SafeTx and the `execTransaction` calldata carrying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedExecution {
    pub wallet: Address,
    pub transaction: SafeTransaction,
    pub signature: Signature,
    pub calldata: Bytes,
}

/// Runs calls through a single-owner Safe: nonce, gas, sign, encode,
/// submit to the wallet.
pub struct SafeExecutor {
    chain: Arc<dyn ChainClient>,
    signer: SignerBackend,
    sender: TransactionSender,
    estimator: GasEstimator,
    chain_id: u64,
    // one lock per wallet, held from the nonce read until submission returns
    locks: DashMap<Address, Arc<Mutex<()>>>,
}

impl std::fmt::Debug for SafeExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SafeExecutor")
            .field("owner", &self.signer.address())
            .field("sender", &self.sender)
            .field("chain_id", &self.chain_id)
            .finish()
    }
}

impl SafeExecutor {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        signer: SignerBackend,
        sender: TransactionSender,
        estimator: GasEstimator,
        chain_id: u64,
    ) -> Self {
        Self {
            chain,
            signer,
            sender,
            estimator,
            chain_id,
            locks: DashMap::new(),
        }
    }

    pub fn owner(&self) -> Address {
        self.signer.address()
    }

    pub fn estimator(&self) -> &GasEstimator {
        &self.estimator
    }

    fn wallet_lock(&self, wallet: Address) -> Arc<Mutex<()>> {
        self.locks.entry(wallet).or_default().value().clone()
    }

    /// Everything up to submission. `safe_tx_gas` of `None` or zero is
    /// estimated; it has to be settled before signing since it is signed.
    pub async fn prepare(
        &self,
        wallet: Address,
        to: Address,
        value: U256,
        data: Bytes,
        operation: SafeOperation,
        safe_tx_gas: Option<U256>,
    ) -> Result<PreparedExecution> {
        let nonce: U256 = call_view(
            self.chain.as_ref(),
            "Safe nonce",
            wallet,
            NonceCall.encode(),
        )
        .await?;

        let safe_tx_gas = match safe_tx_gas {
            Some(gas) if !gas.is_zero() => gas,
            _ => {
                self.estimator
                    .estimate_relayed_gas(wallet, to, value, &data)
                    .await?
            }
        };

        let transaction = SafeTransaction::new(to, value, data, operation, safe_tx_gas, nonce);
        let typed_data = safe_tx_typed_data(self.chain_id, wallet, &transaction);
        let signature = self.signer.sign_typed_data(&typed_data).await?;
        verify_typed_signature(&typed_data, &signature, self.signer.address())?;

        let calldata = encode_exec_transaction(&transaction, &signature);
        Ok(PreparedExecution {
            wallet,
            transaction,
            signature,
            calldata,
        })
    }

    /// Execute `to.call(data)` from `wallet`. The outer transaction goes to
    /// the wallet, never to `to`.
    pub async fn execute(
        &self,
        wallet: Address,
        to: Address,
        value: U256,
        data: Bytes,
        operation: SafeOperation,
        safe_tx_gas: Option<U256>,
    ) -> Result<H256> {
        let lock = self.wallet_lock(wallet);
        let _guard = lock.lock().await;

        let prepared = self
            .prepare(wallet, to, value, data, operation, safe_tx_gas)
            .await?;
        let hash = self
            .sender
            .send(wallet, prepared.calldata, U256::zero())
            .await?;
        info!(
            "safe {wallet:?} nonce {} -> {to:?}: {hash:?}",
            prepared.transaction.nonce
        );
        Ok(hash)
    }
}

/// `execTransaction` calldata for a signed SafeTx.
pub fn encode_exec_transaction(tx: &SafeTransaction, signature: &Signature) -> Bytes {
    ExecTransactionCall {
        to: tx.to,
        value: tx.value,
        data: tx.data.clone(),
        operation: tx.operation.as_u8(),
        safe_tx_gas: tx.safe_tx_gas,
        base_gas: tx.base_gas,
        gas_price: tx.gas_price,
        gas_token: tx.gas_token,
        refund_receiver: tx.refund_receiver,
        signatures: pack_signature(signature),
    }
    .encode()
    .into()
}
