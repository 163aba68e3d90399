use ethers::abi::AbiEncode;
use ethers::types::{Address, Bytes, H256, U256};
use log::info;

use super::Route;
use crate::bindings::{conditional_tokens, neg_risk_adapter};
use crate::config::ContractConfig;
use crate::consts::BINARY_PARTITION;
use crate::prelude::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarketKind {
    /// Binary market settled directly on the conditional tokens
    #[default]
    Standard,
    /// Market routed through the neg-risk adapter
    NegRisk,
}

fn binary_partition() -> Vec<U256> {
    BINARY_PARTITION.iter().map(|i| U256::from(*i)).collect()
}

/// Split `amount` collateral (base units) into a full outcome set.
pub fn split_call(
    contracts: &ContractConfig,
    condition_id: H256,
    amount: U256,
    kind: MarketKind,
) -> (Address, Bytes) {
    match kind {
        MarketKind::Standard => (
            contracts.conditional_tokens,
            conditional_tokens::SplitPositionCall {
                collateral_token: contracts.collateral,
                parent_collection_id: [0u8; 32],
                condition_id: condition_id.0,
                partition: binary_partition(),
                amount,
            }
            .encode()
            .into(),
        ),
        MarketKind::NegRisk => (
            contracts.neg_risk_adapter,
            neg_risk_adapter::SplitPositionCall {
                condition_id: condition_id.0,
                amount,
            }
            .encode()
            .into(),
        ),
    }
}

/// Merge `amount` of each outcome back into collateral.
pub fn merge_call(
    contracts: &ContractConfig,
    condition_id: H256,
    amount: U256,
    kind: MarketKind,
) -> (Address, Bytes) {
    match kind {
        MarketKind::Standard => (
            contracts.conditional_tokens,
            conditional_tokens::MergePositionsCall {
                collateral_token: contracts.collateral,
                parent_collection_id: [0u8; 32],
                condition_id: condition_id.0,
                partition: binary_partition(),
                amount,
            }
            .encode()
            .into(),
        ),
        MarketKind::NegRisk => (
            contracts.neg_risk_adapter,
            neg_risk_adapter::MergePositionsCall {
                condition_id: condition_id.0,
                amount,
            }
            .encode()
            .into(),
        ),
    }
}

/// Redeem both outcomes of a resolved standard market.
pub fn redeem_call(contracts: &ContractConfig, condition_id: H256) -> (Address, Bytes) {
    (
        contracts.conditional_tokens,
        conditional_tokens::RedeemPositionsCall {
            collateral_token: contracts.collateral,
            parent_collection_id: [0u8; 32],
            condition_id: condition_id.0,
            index_sets: binary_partition(),
        }
        .encode()
        .into(),
    )
}

/// Redeem a resolved neg-risk market; `amounts` are per outcome.
pub fn redeem_neg_risk_call(
    contracts: &ContractConfig,
    condition_id: H256,
    amounts: Vec<U256>,
) -> (Address, Bytes) {
    (
        contracts.neg_risk_adapter,
        neg_risk_adapter::RedeemPositionsCall {
            condition_id: condition_id.0,
            amounts,
        }
        .encode()
        .into(),
    )
}

/// Split/merge/redeem over whichever [`Route`] the engine is in.
#[derive(Debug, Clone, Copy)]
pub struct PositionOps<'a> {
    route: &'a Route,
    contracts: &'a ContractConfig,
}

impl<'a> PositionOps<'a> {
    pub fn new(route: &'a Route, contracts: &'a ContractConfig) -> Self {
        Self { route, contracts }
    }

    async fn submit(&self, action: &str, (to, data): (Address, Bytes)) -> Result<H256> {
        let hash = self.route.send(to, data, U256::zero()).await?;
        info!("{action} for {:?} submitted: {hash:?}", self.route.holder());
        Ok(hash)
    }

    pub async fn split(&self, condition_id: H256, amount: U256, kind: MarketKind) -> Result<H256> {
        self.submit("split", split_call(self.contracts, condition_id, amount, kind))
            .await
    }

    pub async fn merge(&self, condition_id: H256, amount: U256, kind: MarketKind) -> Result<H256> {
        self.submit("merge", merge_call(self.contracts, condition_id, amount, kind))
            .await
    }

    pub async fn redeem(&self, condition_id: H256) -> Result<H256> {
        self.submit("redeem", redeem_call(self.contracts, condition_id))
            .await
    }

    pub async fn redeem_neg_risk(&self, condition_id: H256, amounts: Vec<U256>) -> Result<H256> {
        self.submit(
            "neg-risk redeem",
            redeem_neg_risk_call(self.contracts, condition_id, amounts),
        )
        .await
    }
}
