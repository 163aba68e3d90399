use std::fmt;

use ethers::abi::AbiEncode;
use ethers::types::{Address, U256};

use super::Spender;
use crate::bindings::collateral_token::{AllowanceCall, BalanceOfCall};
use crate::bindings::conditional_tokens::IsApprovedForAllCall;
use crate::chain::{call_view, ChainClient};
use crate::config::ContractConfig;
use crate::consts::COLLATERAL_TOKEN_DECIMALS;
use crate::prelude::Result;

/// One read of everything the approval pass looks at. Consumed once, never
/// stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowanceSnapshot {
    pub holder: Address,
    pub collateral_balance: U256,
    pub allowance_exchange: U256,
    pub allowance_neg_risk_adapter: U256,
    pub allowance_neg_risk_exchange: U256,
    pub ctf_approved_exchange: bool,
    pub ctf_approved_neg_risk_adapter: bool,
    pub ctf_approved_neg_risk_exchange: bool,
}

impl AllowanceSnapshot {
    pub async fn read(
        chain: &dyn ChainClient,
        contracts: &ContractConfig,
        holder: Address,
    ) -> Result<Self> {
        let collateral = contracts.collateral;
        let ctf = contracts.conditional_tokens;
        let allowance = |spender: Address| {
            call_view::<U256>(
                chain,
                "collateral allowance",
                collateral,
                AllowanceCall {
                    owner: holder,
                    spender,
                }
                .encode(),
            )
        };
        let approved = |operator: Address| {
            call_view::<bool>(
                chain,
                "conditional token approval",
                ctf,
                IsApprovedForAllCall {
                    owner: holder,
                    operator,
                }
                .encode(),
            )
        };

        Ok(Self {
            holder,
            collateral_balance: call_view(
                chain,
                "collateral balance",
                collateral,
                BalanceOfCall { account: holder }.encode(),
            )
            .await?,
            allowance_exchange: allowance(contracts.exchange).await?,
            allowance_neg_risk_adapter: allowance(contracts.neg_risk_adapter).await?,
            allowance_neg_risk_exchange: allowance(contracts.neg_risk_exchange).await?,
            ctf_approved_exchange: approved(contracts.exchange).await?,
            ctf_approved_neg_risk_adapter: approved(contracts.neg_risk_adapter).await?,
            ctf_approved_neg_risk_exchange: approved(contracts.neg_risk_exchange).await?,
        })
    }

    pub fn allowance(&self, spender: Spender) -> U256 {
        match spender {
            Spender::Exchange => self.allowance_exchange,
            Spender::NegRiskAdapter => self.allowance_neg_risk_adapter,
            Spender::NegRiskExchange => self.allowance_neg_risk_exchange,
        }
    }

    pub fn ctf_approved(&self, spender: Spender) -> bool {
        match spender {
            Spender::Exchange => self.ctf_approved_exchange,
            Spender::NegRiskAdapter => self.ctf_approved_neg_risk_adapter,
            Spender::NegRiskExchange => self.ctf_approved_neg_risk_exchange,
        }
    }
}

/// Base units to a decimal collateral amount, e.g. `1500000` -> `1.500000`.
pub fn format_collateral(amount: U256) -> String {
    let scale = U256::exp10(COLLATERAL_TOKEN_DECIMALS as usize);
    let whole = amount / scale;
    let fraction = (amount % scale).as_u64();
    format!(
        "{whole}.{fraction:0width$}",
        width = COLLATERAL_TOKEN_DECIMALS as usize
    )
}

fn mark(ok: bool) -> &'static str {
    if ok {
        "yes"
    } else {
        "no"
    }
}

/// Allowances are shown as amounts; whether one suffices depends on the
/// allowance policy, not on the snapshot.
fn amount(allowance: U256) -> String {
    if allowance == U256::MAX {
        "unlimited".to_string()
    } else {
        format_collateral(allowance)
    }
}

impl fmt::Display for AllowanceSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}: balance {} USDC; USDC->exchange {}, USDC->neg-risk adapter {}, USDC->neg-risk exchange {}; CTF->exchange {}, CTF->neg-risk adapter {}, CTF->neg-risk exchange {}",
            self.holder,
            format_collateral(self.collateral_balance),
            amount(self.allowance_exchange),
            amount(self.allowance_neg_risk_adapter),
            amount(self.allowance_neg_risk_exchange),
            mark(self.ctf_approved_exchange),
            mark(self.ctf_approved_neg_risk_adapter),
            mark(self.ctf_approved_neg_risk_exchange),
        )
    }
}
