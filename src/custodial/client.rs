use async_trait::async_trait;
use ethers::types::transaction::eip712::TypedData;
use ethers::types::{Bytes, H256};
use log::{debug, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::{ContractCall, CustodialApi, CustodialConfig, RemoteStatus, RemoteTransaction};
use crate::prelude::Result;
use crate::Error;

const API_KEY_HEADER: &str = "X-API-KEY";

/// REST client for the custody service.
#[derive(Debug, Clone)]
pub struct HttpCustodialClient {
    client: Client,
    config: CustodialConfig,
}

#[derive(Deserialize)]
struct SubmitResponse {
    transaction_id: String,
}

#[derive(Deserialize)]
struct TransactionResponse {
    transaction_id: String,
    status: RemoteStatus,
    #[serde(default)]
    transaction_hash: Option<String>,
    #[serde(default)]
    signature: Option<String>,
    #[serde(default)]
    failed_reason: Option<String>,
}

#[derive(Serialize)]
struct Source<'a> {
    source_type: &'static str,
    wallet_id: &'a str,
    address: String,
}

impl HttpCustodialClient {
    pub fn new(client: Option<Client>, config: CustodialConfig) -> Self {
        Self {
            client: client.unwrap_or_default(),
            config,
        }
    }

    pub fn config(&self) -> &CustodialConfig {
        &self.config
    }

    fn source(&self) -> Source<'_> {
        Source {
            source_type: "Org-Controlled",
            wallet_id: &self.config.wallet_id,
            address: format!("{:?}", self.config.address),
        }
    }

    async fn post(&self, endpoint: &str, body: serde_json::Value) -> Result<SubmitResponse> {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint);
        let body = serde_json::to_string(&body)?;
        debug!("POST {url}: {body}");

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(Error::GenericRequest(format!(
                "custody service returned {status} for {endpoint}: {text}"
            )));
        }
        Ok(serde_json::from_str(&text)?)
    }
}

fn parse_hash(id: &str, raw: &str) -> Result<H256> {
    raw.parse::<H256>()
        .map_err(|e| Error::JsonParse(format!("transaction {id}: bad hash {raw}: {e}")))
}

fn parse_signature(id: &str, raw: &str) -> Result<Bytes> {
    raw.parse::<Bytes>()
        .map_err(|e| Error::JsonParse(format!("transaction {id}: bad signature {raw}: {e}")))
}

#[async_trait]
impl CustodialApi for HttpCustodialClient {
    async fn submit_contract_call(&self, call: &ContractCall) -> Result<String> {
        let body = json!({
            "request_id": Uuid::new_v4().to_string(),
            "chain_id": self.config.chain_code,
            "source": self.source(),
            "destination": {
                "destination_type": "EVM_Contract",
                "address": format!("{:?}", call.to),
                "value": call.value.to_string(),
                "calldata": format!("0x{}", hex::encode(&call.data)),
            },
        });
        let submitted = self.post("/transactions/contract_call", body).await?;
        info!(
            "custody contract call to {:?} submitted as {}",
            call.to, submitted.transaction_id
        );
        Ok(submitted.transaction_id)
    }

    async fn submit_typed_data(&self, typed_data: &TypedData) -> Result<String> {
        let body = json!({
            "request_id": Uuid::new_v4().to_string(),
            "chain_id": self.config.chain_code,
            "source": self.source(),
            "destination": {
                "destination_type": "EVM_EIP_712_Signature",
                "structured_data": typed_data,
            },
        });
        let submitted = self.post("/transactions/message_sign", body).await?;
        info!(
            "custody {} signature requested as {}",
            typed_data.primary_type, submitted.transaction_id
        );
        Ok(submitted.transaction_id)
    }

    async fn transaction_status(&self, id: &str) -> Result<RemoteTransaction> {
        let url = format!(
            "{}/transactions/{id}",
            self.config.base_url.trim_end_matches('/')
        );
        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(Error::GenericRequest(format!(
                "custody service returned {status} for transaction {id}: {text}"
            )));
        }
        let record: TransactionResponse = serde_json::from_str(&text)?;

        Ok(RemoteTransaction {
            transaction_hash: record
                .transaction_hash
                .as_deref()
                .filter(|h| !h.is_empty())
                .map(|h| parse_hash(id, h))
                .transpose()?,
            signature: record
                .signature
                .as_deref()
                .filter(|s| !s.is_empty())
                .map(|s| parse_signature(id, s))
                .transpose()?,
            id: record.transaction_id,
            status: record.status,
            failed_reason: record.failed_reason,
        })
    }
}
