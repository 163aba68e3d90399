//! The remote MPC custody service: it holds the key, signs typed data on
//! request, and builds, signs and broadcasts contract calls itself.

mod client;
mod poll;

pub use client::HttpCustodialClient;
pub use poll::{poll_until, Observation, PollPolicy, PollState};

use async_trait::async_trait;
use ethers::types::transaction::eip712::TypedData;
use ethers::types::{Address, Bytes, H256, U256};
use serde::{Deserialize, Serialize};

use crate::prelude::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustodialConfig {
    pub base_url: String,
    pub api_key: String,
    pub wallet_id: String,
    /// Address of the custodial key; known up front so no lookup is needed
    pub address: Address,
    /// Chain code in the service's own naming (e.g. `MATIC`)
    pub chain_code: String,
}

/// A contract call for the service to build, sign and broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RemoteStatus {
    Submitted,
    PendingScreening,
    PendingAuthorization,
    PendingSignature,
    Broadcasting,
    Confirming,
    Completed,
    Failed,
    Rejected,
    #[serde(other)]
    Unknown,
}

impl RemoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteStatus::Submitted => "SUBMITTED",
            RemoteStatus::PendingScreening => "PENDING_SCREENING",
            RemoteStatus::PendingAuthorization => "PENDING_AUTHORIZATION",
            RemoteStatus::PendingSignature => "PENDING_SIGNATURE",
            RemoteStatus::Broadcasting => "BROADCASTING",
            RemoteStatus::Confirming => "CONFIRMING",
            RemoteStatus::Completed => "COMPLETED",
            RemoteStatus::Failed => "FAILED",
            RemoteStatus::Rejected => "REJECTED",
            RemoteStatus::Unknown => "UNKNOWN",
        }
    }
}

/// Status record of a submitted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTransaction {
    pub id: String,
    pub status: RemoteStatus,
    pub transaction_hash: Option<H256>,
    pub signature: Option<Bytes>,
    pub failed_reason: Option<String>,
}

impl RemoteTransaction {
    /// A contract call is done once it reaches CONFIRMING with a hash.
    pub fn call_observation(self) -> Observation<H256> {
        match (self.status, self.transaction_hash) {
            (RemoteStatus::Confirming | RemoteStatus::Completed, Some(hash)) => {
                Observation::Ready(hash)
            }
            (status @ (RemoteStatus::Failed | RemoteStatus::Rejected), _) => Observation::Failed {
                status: status.as_str().to_string(),
                reason: self.failed_reason.unwrap_or_default(),
            },
            (status, _) => Observation::Pending {
                status: status.as_str().to_string(),
            },
        }
    }

    /// A message-sign request is done once the signature is attached.
    pub fn signature_observation(self) -> Observation<Bytes> {
        match (self.status, self.signature) {
            (RemoteStatus::Completed, Some(signature)) => Observation::Ready(signature),
            (status @ (RemoteStatus::Failed | RemoteStatus::Rejected), _) => Observation::Failed {
                status: status.as_str().to_string(),
                reason: self.failed_reason.unwrap_or_default(),
            },
            (status, _) => Observation::Pending {
                status: status.as_str().to_string(),
            },
        }
    }
}

#[async_trait]
pub trait CustodialApi: Send + Sync {
    /// Submit a contract call; returns the service's transaction id.
    async fn submit_contract_call(&self, call: &ContractCall) -> Result<String>;
    /// Submit an EIP-712 document for signing; returns the request id.
    async fn submit_typed_data(&self, typed_data: &TypedData) -> Result<String>;
    async fn transaction_status(&self, id: &str) -> Result<RemoteTransaction>;
}
