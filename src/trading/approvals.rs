use std::fmt;
use std::sync::Arc;

use ethers::abi::AbiEncode;
use ethers::types::{Address, Bytes, H256, U256};
use log::{error, info};

use super::{AllowanceSnapshot, Route};
use crate::bindings::collateral_token::ApproveCall;
use crate::bindings::conditional_tokens::SetApprovalForAllCall;
use crate::chain::ChainClient;
use crate::config::{AllowancePolicy, ContractConfig};
use crate::prelude::Result;
use crate::Error;

/// Venue contracts that must be allowed to move the holder's tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Spender {
    Exchange,
    NegRiskAdapter,
    NegRiskExchange,
}

impl Spender {
    pub fn address(&self, contracts: &ContractConfig) -> Address {
        match self {
            Spender::Exchange => contracts.exchange,
            Spender::NegRiskAdapter => contracts.neg_risk_adapter,
            Spender::NegRiskExchange => contracts.neg_risk_exchange,
        }
    }
}

impl fmt::Display for Spender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Spender::Exchange => "exchange",
            Spender::NegRiskAdapter => "neg-risk adapter",
            Spender::NegRiskExchange => "neg-risk exchange",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grant {
    /// ERC-20 allowance on the collateral token
    Collateral(Spender),
    /// ERC-1155 operator approval on the conditional tokens
    ConditionalTokens(Spender),
}

/// The six grants trading needs, in submission order.
pub const REQUIRED_GRANTS: [Grant; 6] = [
    Grant::Collateral(Spender::Exchange),
    Grant::Collateral(Spender::NegRiskAdapter),
    Grant::Collateral(Spender::NegRiskExchange),
    Grant::ConditionalTokens(Spender::Exchange),
    Grant::ConditionalTokens(Spender::NegRiskAdapter),
    Grant::ConditionalTokens(Spender::NegRiskExchange),
];

impl Grant {
    pub fn is_satisfied(&self, snapshot: &AllowanceSnapshot, policy: &AllowancePolicy) -> bool {
        match self {
            Grant::Collateral(spender) => policy.is_satisfied(snapshot.allowance(*spender)),
            Grant::ConditionalTokens(spender) => snapshot.ctf_approved(*spender),
        }
    }

    /// Token contract to call and the calldata that grants this.
    pub fn call(&self, contracts: &ContractConfig, policy: &AllowancePolicy) -> (Address, Bytes) {
        match self {
            Grant::Collateral(spender) => (
                contracts.collateral,
                ApproveCall {
                    spender: spender.address(contracts),
                    amount: policy.grant_amount(),
                }
                .encode()
                .into(),
            ),
            Grant::ConditionalTokens(spender) => (
                contracts.conditional_tokens,
                SetApprovalForAllCall {
                    operator: spender.address(contracts),
                    approved: true,
                }
                .encode()
                .into(),
            ),
        }
    }
}

impl fmt::Display for Grant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grant::Collateral(spender) => write!(f, "USDC -> {spender}"),
            Grant::ConditionalTokens(spender) => write!(f, "CTF -> {spender}"),
        }
    }
}

/// Brings a holder's approvals up to [`REQUIRED_GRANTS`] in one pass,
/// submitting only what is missing.
#[derive(Clone)]
pub struct ApprovalOrchestrator {
    chain: Arc<dyn ChainClient>,
    contracts: ContractConfig,
    policy: AllowancePolicy,
}

impl ApprovalOrchestrator {
    pub fn new(chain: Arc<dyn ChainClient>, contracts: ContractConfig, policy: AllowancePolicy) -> Self {
        Self {
            chain,
            contracts,
            policy,
        }
    }

    /// Grants not yet satisfied by `snapshot`, in submission order.
    pub fn missing(&self, snapshot: &AllowanceSnapshot) -> Vec<Grant> {
        REQUIRED_GRANTS
            .iter()
            .copied()
            .filter(|grant| !grant.is_satisfied(snapshot, &self.policy))
            .collect()
    }

    /// Returns the hashes of the transactions actually submitted. A failure
    /// stops the pass; what was already submitted stays submitted and is
    /// reported in [`Error::ApprovalAborted`].
    pub async fn ensure_trading_enabled(&self, route: &Route) -> Result<Vec<H256>> {
        let holder = route.holder();
        let snapshot = AllowanceSnapshot::read(self.chain.as_ref(), &self.contracts, holder).await?;
        info!("approval status {snapshot}");

        let missing = self.missing(&snapshot);
        if missing.is_empty() {
            info!("{holder:?}: all trading approvals already in place");
            return Ok(Vec::new());
        }
        info!(
            "{holder:?}: {} of {} grants missing under {:?}",
            missing.len(),
            REQUIRED_GRANTS.len(),
            self.policy
        );

        let mut submitted = Vec::with_capacity(missing.len());
        for grant in missing {
            let (token, calldata) = grant.call(&self.contracts, &self.policy);
            info!("{holder:?}: granting {grant}");
            match route.send(token, calldata, U256::zero()).await {
                Ok(hash) => {
                    info!("{holder:?}: {grant} submitted as {hash:?}");
                    submitted.push(hash);
                }
                Err(e) => {
                    error!("{holder:?}: {grant} failed after {} submitted: {e}", submitted.len());
                    return Err(Error::ApprovalAborted {
                        grant: grant.to_string(),
                        submitted,
                        source: Box::new(e),
                    });
                }
            }
        }
        Ok(submitted)
    }
}
