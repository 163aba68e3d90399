//! Who controls the account: an in-process key, a keystore file, or the
//! custody service.

mod custodial;
mod keystore;

pub use custodial::CustodialSigner;
pub use keystore::KeystoreSigner;

use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::transaction::eip712::TypedData;
use ethers::types::{Address, Bytes, Signature};

use crate::config::SignerSettings;
use crate::custodial::{CustodialApi, HttpCustodialClient, PollPolicy};
use crate::prelude::Result;
use crate::signature::{clob_auth_typed_data, ClobAuthHeaders};
use crate::Error;

#[derive(Debug, Clone)]
pub enum SignerBackend {
    Local(LocalWallet),
    Keystore(KeystoreSigner),
    Custodial(CustodialSigner),
}

impl SignerBackend {
    pub fn from_private_key(key: &str) -> Result<Self> {
        let wallet = LocalWallet::from_str(key.trim_start_matches("0x"))
            .map_err(|e| Error::PrivateKeyParse(e.to_string()))?;
        Ok(SignerBackend::Local(wallet))
    }

    pub fn from_settings(settings: &SignerSettings, poll: &PollPolicy) -> Result<Self> {
        match settings {
            SignerSettings::PrivateKey(key) => Self::from_private_key(key),
            SignerSettings::Keystore {
                path,
                password,
                address,
            } => {
                let keystore = match address {
                    Some(address) if path.is_dir() => {
                        KeystoreSigner::from_directory(path, password, *address)?
                    }
                    _ => KeystoreSigner::from_file(path, password, *address)?,
                };
                Ok(SignerBackend::Keystore(keystore))
            }
            SignerSettings::Custodial(config) => {
                let api: Arc<dyn CustodialApi> =
                    Arc::new(HttpCustodialClient::new(None, config.clone()));
                Ok(SignerBackend::Custodial(CustodialSigner::new(
                    api,
                    config.address,
                    Some(poll.clone()),
                )))
            }
        }
    }

    /// Address of the controlling key. Never touches the network.
    pub fn address(&self) -> Address {
        match self {
            SignerBackend::Local(wallet) => wallet.address(),
            SignerBackend::Keystore(keystore) => keystore.wallet().address(),
            SignerBackend::Custodial(custodial) => custodial.address(),
        }
    }

    /// Whether transactions go through the custody service rather than
    /// being signed here.
    pub fn is_custodial(&self) -> bool {
        matches!(self, SignerBackend::Custodial(_))
    }

    /// Bind local keys to `chain_id` for EIP-155 transaction signing.
    pub fn with_chain_id(self, chain_id: u64) -> Self {
        match self {
            SignerBackend::Local(wallet) => SignerBackend::Local(wallet.with_chain_id(chain_id)),
            SignerBackend::Keystore(keystore) => {
                SignerBackend::Keystore(keystore.with_chain_id(chain_id))
            }
            custodial @ SignerBackend::Custodial(_) => custodial,
        }
    }

    /// Sign an EIP-712 document. The result always carries `v` in {27, 28}.
    pub async fn sign_typed_data(&self, typed_data: &TypedData) -> Result<Signature> {
        match self {
            SignerBackend::Local(wallet) => sign_locally(wallet, typed_data).await,
            SignerBackend::Keystore(keystore) => sign_locally(keystore.wallet(), typed_data).await,
            SignerBackend::Custodial(custodial) => custodial.sign_typed_data(typed_data).await,
        }
    }

    /// RLP-encode and sign a raw transaction. The custody backend cannot do
    /// this; its calls are submitted to the service instead.
    pub fn sign_transaction(&self, tx: &TypedTransaction) -> Result<Bytes> {
        let wallet = match self {
            SignerBackend::Local(wallet) => wallet,
            SignerBackend::Keystore(keystore) => keystore.wallet(),
            SignerBackend::Custodial(_) => {
                return Err(Error::SignatureFailure(
                    "custodial signer does not sign raw transactions".to_string(),
                ))
            }
        };
        let signature = wallet
            .sign_transaction_sync(tx)
            .map_err(|e| Error::SignatureFailure(e.to_string()))?;
        Ok(tx.rlp_signed(&signature))
    }

    /// Sign a ClobAuth challenge and return the L1 authentication headers.
    /// `timestamp` defaults to now, `nonce` to 0.
    pub async fn clob_auth_headers(
        &self,
        chain_id: u64,
        timestamp: Option<i64>,
        nonce: Option<u64>,
    ) -> Result<ClobAuthHeaders> {
        let timestamp = timestamp.unwrap_or_else(|| Utc::now().timestamp());
        let nonce = nonce.unwrap_or_default();
        let address = self.address();
        let typed_data = clob_auth_typed_data(address, chain_id, timestamp, nonce);
        let signature = self.sign_typed_data(&typed_data).await?;
        Ok(ClobAuthHeaders {
            address,
            signature,
            timestamp,
            nonce,
        })
    }
}

async fn sign_locally(wallet: &LocalWallet, typed_data: &TypedData) -> Result<Signature> {
    wallet
        .sign_typed_data(typed_data)
        .await
        .map_err(|e| Error::SignatureFailure(e.to_string()))
}
