use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::consts::{
    AMOY_CHAIN_ID, DEFAULT_SAFE_GAS_BUFFER_PERCENT, DEFAULT_SAFE_GAS_OVERHEAD, POLYGON_CHAIN_ID,
};
use crate::custodial::{CustodialConfig, PollPolicy};
use crate::engine::SignatureMode;
use crate::prelude::Result;
use crate::Error;

/// Deployed contract addresses for one chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractConfig {
    /// USDC.e collateral token
    pub collateral: Address,
    /// Gnosis ConditionalTokens framework (ERC-1155 outcome tokens)
    pub conditional_tokens: Address,
    /// CTF exchange for standard markets
    pub exchange: Address,
    /// NegRisk adapter, also the split/merge entry point of neg-risk markets
    pub neg_risk_adapter: Address,
    /// CTF exchange for neg-risk markets
    pub neg_risk_exchange: Address,
    /// Polymarket SafeProxyFactory
    pub safe_proxy_factory: Address,
}

const MATIC_CONTRACTS: [&str; 6] = [
    "0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174",
    "0x4D97DCd97eC945f40cF65F87097ACe5EA0476045",
    "0x4bFb41d5B3570DeFd03C39a9A4D8dE6Bd8B8982E",
    "0xd91E80cF2E7be2e162c6513ceD06f1dD0dA35296",
    "0xC5d563A36AE78145C45a50134d48A1215220f80a",
    "0xaacFeEa03eb1561C4e67d661e40682Bd20E3541b",
];

const AMOY_CONTRACTS: [&str; 6] = [
    "0x9c4e1703476e875070ee25b56a58b008cfb8fa78",
    "0x69308FB512518e39F9b16112fA8d994F4e2Bf8bB",
    "0xdFE02Eb6733538f8Ea35D585af8DE5958AD99E40",
    "0xd91E80cF2E7be2e162c6513ceD06f1dD0dA35296",
    "0xC5d563A36AE78145C45a50134d48A1215220f80a",
    "0xaacFeEa03eb1561C4e67d661e40682Bd20E3541b",
];

impl ContractConfig {
    /// Address table for a supported chain. Anything but Polygon and Amoy is
    /// rejected.
    pub fn for_chain(chain_id: u64) -> Result<Self> {
        let table = match chain_id {
            POLYGON_CHAIN_ID => MATIC_CONTRACTS,
            AMOY_CHAIN_ID => AMOY_CONTRACTS,
            other => return Err(Error::UnsupportedChain(other)),
        };
        let [collateral, conditional_tokens, exchange, neg_risk_adapter, neg_risk_exchange, safe_proxy_factory] =
            table.map(parse_address);

        Ok(ContractConfig {
            collateral: collateral?,
            conditional_tokens: conditional_tokens?,
            exchange: exchange?,
            neg_risk_adapter: neg_risk_adapter?,
            neg_risk_exchange: neg_risk_exchange?,
            safe_proxy_factory: safe_proxy_factory?,
        })
    }
}

fn parse_address(s: &str) -> Result<Address> {
    Address::from_str(s).map_err(|e| Error::Configuration(format!("invalid address {s}: {e}")))
}

/// Gas budget a relayed call must authorize. Both numbers are tied to the
/// deployed Safe version's `gasleft()` check (GS010).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasPolicy {
    /// Added to the direct inner-call estimate for Safe bookkeeping
    pub safe_overhead: u64,
    /// Multiplier applied last, in percent (150 = 1.5x)
    pub buffer_percent: u64,
}

impl Default for GasPolicy {
    fn default() -> Self {
        Self {
            safe_overhead: DEFAULT_SAFE_GAS_OVERHEAD,
            buffer_percent: DEFAULT_SAFE_GAS_BUFFER_PERCENT,
        }
    }
}

impl GasPolicy {
    pub fn apply_buffer(&self, gas: U256) -> U256 {
        gas * U256::from(self.buffer_percent) / U256::from(100u64)
    }
}

/// How much collateral allowance the orchestrator grants to each spender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AllowancePolicy {
    /// Approve `U256::MAX` once; any non-zero allowance counts as granted.
    #[default]
    Unlimited,
    /// Approve exactly this amount; an allowance below it is re-granted.
    AtLeast(U256),
}

impl AllowancePolicy {
    pub fn grant_amount(&self) -> U256 {
        match self {
            AllowancePolicy::Unlimited => U256::MAX,
            AllowancePolicy::AtLeast(amount) => *amount,
        }
    }

    pub fn is_satisfied(&self, current: U256) -> bool {
        match self {
            AllowancePolicy::Unlimited => !current.is_zero(),
            AllowancePolicy::AtLeast(amount) => current >= *amount,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EnginePolicy {
    pub gas: GasPolicy,
    pub allowance: AllowancePolicy,
    pub poll: PollPolicy,
}

/// Where the controlling key comes from.
#[derive(Debug, Clone)]
pub enum SignerSettings {
    PrivateKey(String),
    Keystore {
        path: PathBuf,
        password: String,
        address: Option<Address>,
    },
    Custodial(CustodialConfig),
}

/// Process configuration read from the environment (after `dotenv`).
#[derive(Debug, Clone)]
pub struct Settings {
    pub rpc_url: String,
    pub mode: SignatureMode,
    pub signer: SignerSettings,
    pub policy: EnginePolicy,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let rpc_url = required("RPC_URL")?;
        let mode = match env::var("SIGNATURE_MODE") {
            Ok(m) => m.parse()?,
            Err(_) => SignatureMode::Eoa,
        };

        let signer = if let Ok(key) = env::var("PRIVATE_KEY") {
            SignerSettings::PrivateKey(key)
        } else if let Ok(path) = env::var("KEYSTORE_PATH") {
            SignerSettings::Keystore {
                path: PathBuf::from(path),
                password: required("KEYSTORE_PASSWORD")?,
                address: env::var("KEYSTORE_ADDRESS")
                    .ok()
                    .map(|a| parse_address(&a))
                    .transpose()?,
            }
        } else if let Ok(base_url) = env::var("CUSTODIAL_API_URL") {
            SignerSettings::Custodial(CustodialConfig {
                base_url,
                api_key: required("CUSTODIAL_API_KEY")?,
                wallet_id: required("CUSTODIAL_WALLET_ID")?,
                address: parse_address(&required("CUSTODIAL_ADDRESS")?)?,
                chain_code: env::var("CUSTODIAL_CHAIN_CODE").unwrap_or_else(|_| "MATIC".to_string()),
            })
        } else {
            return Err(Error::Configuration(
                "set PRIVATE_KEY, KEYSTORE_PATH or CUSTODIAL_API_URL".to_string(),
            ));
        };

        let mut policy = EnginePolicy::default();
        if let Some(overhead) = optional_u64("SAFE_GAS_OVERHEAD")? {
            policy.gas.safe_overhead = overhead;
        }
        if let Some(percent) = optional_u64("SAFE_GAS_BUFFER_PERCENT")? {
            policy.gas.buffer_percent = percent;
        }
        if let Some(amount) = optional_u64("APPROVAL_AMOUNT")? {
            policy.allowance = AllowancePolicy::AtLeast(U256::from(amount));
        }
        if let Some(attempts) = optional_u64("CUSTODIAL_POLL_ATTEMPTS")? {
            policy.poll.max_attempts = u32::try_from(attempts).map_err(|_| {
                Error::Configuration(format!("CUSTODIAL_POLL_ATTEMPTS too large: {attempts}"))
            })?;
        }

        Ok(Settings {
            rpc_url,
            mode,
            signer,
            policy,
        })
    }
}

fn required(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Configuration(format!("{name} is not set")))
}

fn optional_u64(name: &str) -> Result<Option<u64>> {
    env::var(name)
        .ok()
        .map(|v| {
            v.parse::<u64>()
                .map_err(|e| Error::Configuration(format!("{name}: {e}")))
        })
        .transpose()
}
