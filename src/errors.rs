use ethers::types::{Address, H256};
use thiserror::Error;

use crate::engine::SignatureMode;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Unsupported chain id {0}")]
    UnsupportedChain(u64),
    #[error("Signature mode {0:?} is not supported")]
    UnsupportedMode(SignatureMode),
    #[error("No signer configured for {0}")]
    MissingSigner(&'static str),

    #[error("Failed to derive smart wallet address for {owner:?}: {message}")]
    DerivationFailed { owner: Address, message: String },
    #[error("Failed to encode {what}: {message}")]
    Encoding { what: &'static str, message: String },
    #[error("Gas estimation failed for call to {to:?} through {wallet:?}: {message}")]
    EstimationFailed {
        wallet: Address,
        to: Address,
        message: String,
    },
    #[error("Signature failure: {0}")]
    SignatureFailure(String),
    #[error("Submission failed while {step} (to {to:?}): {message}")]
    SubmissionFailed {
        step: &'static str,
        to: Address,
        message: String,
    },
    #[error("Remote transaction {id} not confirmed after {attempts} attempts")]
    ConfirmationTimeout { id: String, attempts: u32 },
    #[error("Remote transaction {id} ended as {status}: {reason}")]
    RemoteTransactionFailed {
        id: String,
        status: String,
        reason: String,
    },
    #[error("Smart wallet {0:?} is already deployed")]
    AlreadyDeployed(Address),
    #[error("Smart wallet {0:?} is not deployed")]
    NotDeployed(Address),

    #[error("Chain read failed for {what} on {contract:?}: {message}")]
    ChainRead {
        what: &'static str,
        contract: Address,
        message: String,
    },
    #[error("Approval pass aborted at {grant} after {} submitted transaction(s): {source}", submitted.len())]
    ApprovalAborted {
        grant: String,
        submitted: Vec<H256>,
        #[source]
        source: Box<Error>,
    },

    #[error("Wallet error: {0}")]
    Wallet(String),
    #[error("Private key parse error: {0}")]
    PrivateKeyParse(String),
    #[error("Json parse error: {0}")]
    JsonParse(String),
    #[error("Generic request error: {0}")]
    GenericRequest(String),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::GenericRequest(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::JsonParse(e.to_string())
    }
}
