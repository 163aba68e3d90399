use std::sync::Arc;

use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, TransactionRequest, H256, U256};
use log::{debug, info};
use tokio::sync::Mutex;

use crate::chain::{CallMsg, ChainClient};
use crate::prelude::Result;
use crate::signer::SignerBackend;
use crate::Error;

/// Signs legacy transactions locally and broadcasts them. Returns as soon
/// as the node accepts the transaction.
#[derive(Clone)]
pub struct DirectSender {
    chain: Arc<dyn ChainClient>,
    signer: SignerBackend,
    chain_id: u64,
    // held from the pending-nonce read until the node has the transaction
    nonce_lock: Arc<Mutex<()>>,
}

impl std::fmt::Debug for DirectSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectSender")
            .field("from", &self.signer.address())
            .field("chain_id", &self.chain_id)
            .finish()
    }
}

impl DirectSender {
    pub fn new(chain: Arc<dyn ChainClient>, signer: SignerBackend, chain_id: u64) -> Self {
        Self {
            chain,
            signer: signer.with_chain_id(chain_id),
            chain_id,
            nonce_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn from_address(&self) -> Address {
        self.signer.address()
    }

    pub async fn send(&self, to: Address, data: Bytes, value: U256) -> Result<H256> {
        let from = self.signer.address();
        let _guard = self.nonce_lock.lock().await;

        let nonce = self
            .chain
            .pending_nonce_at(from)
            .await
            .map_err(|message| Error::SubmissionFailed {
                step: "fetching pending nonce",
                to,
                message,
            })?;
        let gas_price = self
            .chain
            .suggest_gas_price()
            .await
            .map_err(|message| Error::SubmissionFailed {
                step: "fetching gas price",
                to,
                message,
            })?;
        let gas = self
            .chain
            .estimate_gas(
                &CallMsg::new(to, data.clone())
                    .from(from)
                    .value(value)
                    .gas_price(gas_price),
            )
            .await
            .map_err(|message| Error::SubmissionFailed {
                step: "estimating gas",
                to,
                message,
            })?;
        debug!("direct tx from {from:?}: nonce {nonce}, gas {gas} at {gas_price}");

        let tx: TypedTransaction = TransactionRequest::new()
            .from(from)
            .to(to)
            .value(value)
            .data(data)
            .nonce(nonce)
            .gas(gas)
            .gas_price(gas_price)
            .chain_id(self.chain_id)
            .into();
        let raw = self.signer.sign_transaction(&tx)?;

        let hash = self
            .chain
            .send_raw_transaction(raw)
            .await
            .map_err(|message| Error::SubmissionFailed {
                step: "broadcasting",
                to,
                message,
            })?;
        info!("sent {hash:?} from {from:?} to {to:?} (nonce {nonce})");
        Ok(hash)
    }
}
