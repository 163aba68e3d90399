//! One `send(to, data, value) -> hash` contract over both submission paths.

mod direct;
mod polling;

pub use direct::DirectSender;
pub use polling::PollingSender;

use std::sync::Arc;

use ethers::types::{Address, Bytes, H256, U256};

use crate::chain::ChainClient;
use crate::custodial::PollPolicy;
use crate::prelude::Result;
use crate::signer::SignerBackend;

#[derive(Debug, Clone)]
pub enum TransactionSender {
    Direct(DirectSender),
    RemotePolling(PollingSender),
}

impl TransactionSender {
    /// The sender paired with `signer`: local and keystore keys broadcast
    /// directly, the custodial key submits through its service.
    pub fn for_signer(
        chain: Arc<dyn ChainClient>,
        signer: SignerBackend,
        chain_id: u64,
        poll: PollPolicy,
    ) -> Self {
        match signer {
            SignerBackend::Custodial(custodial) => TransactionSender::RemotePolling(
                PollingSender::new(custodial.api().clone(), Some(poll)),
            ),
            local => TransactionSender::Direct(DirectSender::new(chain, local, chain_id)),
        }
    }

    pub async fn send(&self, to: Address, data: Bytes, value: U256) -> Result<H256> {
        match self {
            TransactionSender::Direct(sender) => sender.send(to, data, value).await,
            TransactionSender::RemotePolling(sender) => sender.send(to, data, value).await,
        }
    }
}
