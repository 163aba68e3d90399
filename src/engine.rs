use std::str::FromStr;
use std::sync::Arc;

use ethers::types::{Address, Bytes, H256, U256};
use log::info;

use crate::chain::{ChainClient, EthersChain};
use crate::config::{ContractConfig, EnginePolicy, Settings};
use crate::prelude::Result;
use crate::safe::{
    deploy_smart_wallet, is_deployed, AddressCache, GasEstimator, SafeExecutor,
    SmartWalletAccount,
};
use crate::sender::TransactionSender;
use crate::signature::{ClobAuthHeaders, SafeOperation};
use crate::signer::SignerBackend;
use crate::trading::{AllowanceSnapshot, ApprovalOrchestrator, MarketKind, PositionOps, Route};
use crate::Error;

/// Which account trades. Fixed for the engine's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureMode {
    /// The controlling key's own account
    #[default]
    Eoa,
    /// The owner's Gnosis Safe, relayed through `execTransaction`
    SmartWallet,
    /// Polymarket proxy wallets; recognised but not supported
    Proxy,
}

impl FromStr for SignatureMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "eoa" | "0" => Ok(SignatureMode::Eoa),
            "proxy" | "1" => Ok(SignatureMode::Proxy),
            "safe" | "smart_wallet" | "gnosis_safe" | "2" => Ok(SignatureMode::SmartWallet),
            other => Err(Error::Configuration(format!("unknown signature mode {other}"))),
        }
    }
}

/// Binds one chain, one contract set and one signature mode. Every trading
/// call goes through the route the mode selects.
pub struct TradingEngine {
    chain: Arc<dyn ChainClient>,
    chain_id: u64,
    contracts: ContractConfig,
    mode: SignatureMode,
    policy: EnginePolicy,
    signer: Option<SignerBackend>,
    sender: Option<TransactionSender>,
    executor: Option<Arc<SafeExecutor>>,
    cache: AddressCache,
    estimator: GasEstimator,
    orchestrator: ApprovalOrchestrator,
}

impl std::fmt::Debug for TradingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TradingEngine")
            .field("chain_id", &self.chain_id)
            .field("mode", &self.mode)
            .field("signer", &self.signer.as_ref().map(|s| s.address()))
            .finish()
    }
}

impl TradingEngine {
    /// `contracts` defaults to the table for the chain's id. Without a
    /// signer the engine can still derive addresses and read approvals.
    pub async fn new(
        chain: Arc<dyn ChainClient>,
        signer: Option<SignerBackend>,
        mode: SignatureMode,
        contracts: Option<ContractConfig>,
        policy: Option<EnginePolicy>,
    ) -> Result<Self> {
        if mode == SignatureMode::Proxy {
            return Err(Error::UnsupportedMode(mode));
        }
        let chain_id = chain
            .chain_id()
            .await
            .map_err(|e| Error::Configuration(format!("cannot read chain id: {e}")))?;
        let contracts = match contracts {
            Some(contracts) => contracts,
            None => ContractConfig::for_chain(chain_id)?,
        };
        let policy = policy.unwrap_or_default();

        let signer = signer.map(|s| s.with_chain_id(chain_id));
        let sender = signer.clone().map(|s| {
            TransactionSender::for_signer(chain.clone(), s, chain_id, policy.poll.clone())
        });
        let estimator = GasEstimator::new(chain.clone(), policy.gas);
        let executor = match (&signer, &sender, mode) {
            (Some(signer), Some(sender), SignatureMode::SmartWallet) => Some(Arc::new(SafeExecutor::new(
                chain.clone(),
                signer.clone(),
                sender.clone(),
                estimator.clone(),
                chain_id,
            ))),
            _ => None,
        };

        info!(
            "engine on chain {chain_id} in {mode:?} mode for {:?}",
            signer.as_ref().map(|s| s.address())
        );
        Ok(Self {
            cache: AddressCache::new(chain.clone(), contracts.safe_proxy_factory),
            orchestrator: ApprovalOrchestrator::new(chain.clone(), contracts, policy.allowance),
            chain,
            chain_id,
            contracts,
            mode,
            policy,
            signer,
            sender,
            executor,
            estimator,
        })
    }

    /// Connect over HTTP and build the signer described by `settings`.
    pub async fn from_settings(settings: &Settings) -> Result<Self> {
        let chain: Arc<dyn ChainClient> = Arc::new(EthersChain::connect(&settings.rpc_url)?);
        let signer = SignerBackend::from_settings(&settings.signer, &settings.policy.poll)?;
        Self::new(
            chain,
            Some(signer),
            settings.mode,
            None,
            Some(settings.policy.clone()),
        )
        .await
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn contracts(&self) -> &ContractConfig {
        &self.contracts
    }

    pub fn mode(&self) -> SignatureMode {
        self.mode
    }

    pub fn policy(&self) -> &EnginePolicy {
        &self.policy
    }

    pub fn signer(&self) -> Result<&SignerBackend> {
        self.signer.as_ref().ok_or(Error::MissingSigner("signing"))
    }

    fn sender(&self) -> Result<&TransactionSender> {
        self.sender
            .as_ref()
            .ok_or(Error::MissingSigner("transaction submission"))
    }

    fn executor(&self) -> Result<&Arc<SafeExecutor>> {
        match (self.mode, &self.executor) {
            (SignatureMode::SmartWallet, Some(executor)) => Ok(executor),
            (SignatureMode::SmartWallet, None) => Err(Error::MissingSigner("relayed execution")),
            (mode, _) => Err(Error::UnsupportedMode(mode)),
        }
    }

    /// Memoized owner -> smart wallet lookup.
    pub async fn smart_wallet_address(&self, owner: Address) -> Result<Address> {
        self.cache.smart_wallet_address(owner).await
    }

    pub async fn smart_wallet_account(&self, owner: Address) -> Result<SmartWalletAccount> {
        self.cache.account(owner).await
    }

    /// The account that holds funds and approvals in this mode.
    pub async fn trading_address(&self) -> Result<Address> {
        let owner = self.signer()?.address();
        match self.mode {
            SignatureMode::SmartWallet => self.smart_wallet_address(owner).await,
            _ => Ok(owner),
        }
    }

    /// The route the current mode sends through. In smart-wallet mode the
    /// Safe must already be deployed.
    pub async fn route(&self) -> Result<Route> {
        let owner = self.signer()?.address();
        match self.mode {
            SignatureMode::Eoa => Ok(Route::Direct {
                sender: self.sender()?.clone(),
                account: owner,
            }),
            SignatureMode::SmartWallet => {
                let executor = self.executor()?.clone();
                let wallet = self.smart_wallet_address(owner).await?;
                if !is_deployed(self.chain.as_ref(), wallet).await? {
                    return Err(Error::NotDeployed(wallet));
                }
                Ok(Route::Relayed { executor, wallet })
            }
            SignatureMode::Proxy => Err(Error::UnsupportedMode(self.mode)),
        }
    }

    /// Deploy the signer's Safe. Fails with `AlreadyDeployed` if it has code.
    pub async fn deploy_smart_wallet(&self) -> Result<(Address, H256)> {
        deploy_smart_wallet(&self.cache, self.signer()?, self.sender()?, self.chain_id).await
    }

    pub async fn estimate_relayed_gas(
        &self,
        wallet: Address,
        to: Address,
        value: U256,
        data: &Bytes,
    ) -> Result<U256> {
        self.estimator
            .estimate_relayed_gas(wallet, to, value, data)
            .await
    }

    /// Run an arbitrary call through the signer's Safe.
    pub async fn execute_through_wallet(
        &self,
        to: Address,
        value: U256,
        data: Bytes,
        operation: SafeOperation,
        safe_tx_gas: Option<U256>,
    ) -> Result<H256> {
        let executor = self.executor()?;
        let wallet = match self.route().await? {
            Route::Relayed { wallet, .. } => wallet,
            Route::Direct { .. } => return Err(Error::UnsupportedMode(self.mode)),
        };
        executor
            .execute(wallet, to, value, data, operation, safe_tx_gas)
            .await
    }

    pub async fn allowance_snapshot(&self, holder: Address) -> Result<AllowanceSnapshot> {
        AllowanceSnapshot::read(self.chain.as_ref(), &self.contracts, holder).await
    }

    /// Submit whichever of the six trading approvals are missing and return
    /// their hashes; an empty result means nothing was needed.
    pub async fn ensure_trading_enabled(&self) -> Result<Vec<H256>> {
        let route = self.route().await?;
        self.orchestrator.ensure_trading_enabled(&route).await
    }

    pub async fn split(&self, condition_id: H256, amount: U256, kind: MarketKind) -> Result<H256> {
        let route = self.route().await?;
        PositionOps::new(&route, &self.contracts)
            .split(condition_id, amount, kind)
            .await
    }

    pub async fn merge(&self, condition_id: H256, amount: U256, kind: MarketKind) -> Result<H256> {
        let route = self.route().await?;
        PositionOps::new(&route, &self.contracts)
            .merge(condition_id, amount, kind)
            .await
    }

    pub async fn redeem(&self, condition_id: H256) -> Result<H256> {
        let route = self.route().await?;
        PositionOps::new(&route, &self.contracts)
            .redeem(condition_id)
            .await
    }

    pub async fn redeem_neg_risk(&self, condition_id: H256, amounts: Vec<U256>) -> Result<H256> {
        let route = self.route().await?;
        PositionOps::new(&route, &self.contracts)
            .redeem_neg_risk(condition_id, amounts)
            .await
    }

    /// L1 headers for the CLOB API, signed by the controlling key.
    pub async fn clob_auth_headers(
        &self,
        timestamp: Option<i64>,
        nonce: Option<u64>,
    ) -> Result<ClobAuthHeaders> {
        self.signer()?
            .clob_auth_headers(self.chain_id, timestamp, nonce)
            .await
    }
}
