use std::fmt;
use std::sync::Arc;

use ethers::types::transaction::eip712::TypedData;
use ethers::types::{Address, Signature};
use log::info;

use crate::custodial::{poll_until, CustodialApi, PollPolicy};
use crate::prelude::Result;
use crate::signature::normalize_signature;
use crate::Error;

/// Typed-data signing through the custody service. Signing requests are
/// asynchronous on the service side and are polled to completion.
#[derive(Clone)]
pub struct CustodialSigner {
    api: Arc<dyn CustodialApi>,
    address: Address,
    poll: PollPolicy,
}

impl fmt::Debug for CustodialSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustodialSigner")
            .field("address", &self.address)
            .field("poll", &self.poll)
            .finish()
    }
}

impl CustodialSigner {
    pub fn new(api: Arc<dyn CustodialApi>, address: Address, poll: Option<PollPolicy>) -> Self {
        Self {
            api,
            address,
            poll: poll.unwrap_or_default(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn api(&self) -> &Arc<dyn CustodialApi> {
        &self.api
    }

    pub fn poll_policy(&self) -> &PollPolicy {
        &self.poll
    }

    pub async fn sign_typed_data(&self, typed_data: &TypedData) -> Result<Signature> {
        let kind = typed_data.primary_type.as_str();
        let id = self.api.submit_typed_data(typed_data).await.map_err(|e| {
            Error::SignatureFailure(format!("custody {kind} signing request not accepted: {e}"))
        })?;
        let (api, request) = (&self.api, id.as_str());
        let raw = poll_until(&self.poll, request, || async move {
            Ok(api.transaction_status(request).await?.signature_observation())
        })
        .await
        .map_err(|e| signing_failure(kind, e))?;
        info!("custody signature {id} ready for {:?}", self.address);
        normalize_signature(&raw)
    }
}

/// Every way a remote signing request can end without a signature.
fn signing_failure(kind: &str, error: Error) -> Error {
    let message = match error {
        Error::ConfirmationTimeout { id, attempts } => {
            format!("custody {kind} signing request {id} still pending after {attempts} attempts")
        }
        Error::RemoteTransactionFailed { id, status, reason } => {
            format!("custody {kind} signing request {id} ended as {status}: {reason}")
        }
        other => format!("custody {kind} signing request failed: {other}"),
    };
    Error::SignatureFailure(message)
}
