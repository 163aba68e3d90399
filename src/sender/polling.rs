use std::sync::Arc;

use ethers::types::{Address, Bytes, H256, U256};
use log::info;

use crate::custodial::{poll_until, ContractCall, CustodialApi, PollPolicy};
use crate::prelude::Result;
use crate::Error;

/// Hands the call to the custody service, which owns nonce and gas, then
/// blocks until the service reports it CONFIRMING with a hash.
#[derive(Clone)]
pub struct PollingSender {
    api: Arc<dyn CustodialApi>,
    poll: PollPolicy,
}

impl std::fmt::Debug for PollingSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollingSender").field("poll", &self.poll).finish()
    }
}

impl PollingSender {
    pub fn new(api: Arc<dyn CustodialApi>, poll: Option<PollPolicy>) -> Self {
        Self {
            api,
            poll: poll.unwrap_or_default(),
        }
    }

    pub async fn send(&self, to: Address, data: Bytes, value: U256) -> Result<H256> {
        let call = ContractCall { to, data, value };
        let id = self
            .api
            .submit_contract_call(&call)
            .await
            .map_err(|e| Error::SubmissionFailed {
                step: "submitting to custody service",
                to,
                message: e.to_string(),
            })?;

        let (api, request) = (&self.api, id.as_str());
        let hash = poll_until(&self.poll, request, || async move {
            let record = api.transaction_status(request).await.map_err(|e| {
                Error::SubmissionFailed {
                    step: "polling custody status",
                    to,
                    message: e.to_string(),
                }
            })?;
            Ok(record.call_observation())
        })
        .await?;
        info!("custody transaction {id} to {to:?} confirming as {hash:?}");
        Ok(hash)
    }
}
