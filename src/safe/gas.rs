use std::sync::Arc;

use ethers::abi::AbiEncode;
use ethers::types::{Address, Bytes, U256};
use log::debug;

use crate::bindings::gnosis_safe::SimulateAndRevertCall;
use crate::chain::{CallMsg, ChainClient};
use crate::config::GasPolicy;
use crate::prelude::Result;
use crate::Error;

/// `safeTxGas` for a relayed call. Deliberately biased high: the Safe
/// reverts with GS010 when `gasleft()` is short of what `safeTxGas` asks
/// for.
#[derive(Clone)]
pub struct GasEstimator {
    chain: Arc<dyn ChainClient>,
    policy: GasPolicy,
}

impl GasEstimator {
    pub fn new(chain: Arc<dyn ChainClient>, policy: GasPolicy) -> Self {
        Self { chain, policy }
    }

    pub fn policy(&self) -> &GasPolicy {
        &self.policy
    }

    /// Estimate `simulateAndRevert(to, data)` on the wallet. That call
    /// always reverts, so most nodes refuse to estimate it; then estimate
    /// the inner call as sent from the wallet and add the Safe overhead.
    /// The buffer applies on both paths.
    pub async fn estimate_relayed_gas(
        &self,
        wallet: Address,
        to: Address,
        value: U256,
        data: &Bytes,
    ) -> Result<U256> {
        let simulate = SimulateAndRevertCall {
            target_contract: to,
            calldata_payload: data.clone(),
        }
        .encode();

        let simulate_err = match self.chain.estimate_gas(&CallMsg::new(wallet, simulate)).await {
            Ok(gas) => {
                let budget = self.policy.apply_buffer(gas);
                debug!("safeTxGas for {to:?} via {wallet:?}: simulated {gas}, budget {budget}");
                return Ok(budget);
            }
            Err(e) => e,
        };

        let inner = self
            .chain
            .estimate_gas(&CallMsg::new(to, data.clone()).from(wallet).value(value))
            .await
            .map_err(|message| Error::EstimationFailed {
                wallet,
                to,
                message: format!("simulateAndRevert: {simulate_err}; direct: {message}"),
            })?;
        let budget = self
            .policy
            .apply_buffer(inner + U256::from(self.policy.safe_overhead));
        debug!("safeTxGas for {to:?} via {wallet:?}: direct {inner}, budget {budget}");
        Ok(budget)
    }
}
