#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ethers::abi::{AbiDecode, AbiEncode};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::transaction::eip712::{Eip712, TypedData};
use ethers::types::{Address, Bytes, Signature, Transaction, TransactionRequest, H256, U256};
use ethers::utils::{keccak256, rlp};

use pm_wallet::bindings::collateral_token::{AllowanceCall, ApproveCall, BalanceOfCall};
use pm_wallet::bindings::conditional_tokens::{IsApprovedForAllCall, SetApprovalForAllCall};
use pm_wallet::bindings::gnosis_safe::{ExecTransactionCall, NonceCall, SimulateAndRevertCall};
use pm_wallet::bindings::safe_proxy_factory::{ComputeProxyAddressCall, CreateProxyCall};
use pm_wallet::chain::{CallMsg, ChainClient, RpcResult};
use pm_wallet::custodial::{ContractCall, CustodialApi, RemoteStatus, RemoteTransaction};
use pm_wallet::prelude::Result;
use pm_wallet::signature::{
    create_proxy_typed_data, normalize_signature, safe_tx_typed_data, SafeOperation,
    SafeTransaction,
};
use pm_wallet::{derive_create2_address, ContractConfig, Error};

pub const OWNER_KEY: &str = "e908f86dbb4d55ac876378565aafeabc187f6690f046459397b17d9b9a19688e";
pub const CUSTODY_KEY: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
pub const CHAIN_ID: u64 = 137;

pub fn owner_wallet() -> LocalWallet {
    OWNER_KEY.parse::<LocalWallet>().unwrap().with_chain_id(CHAIN_ID)
}

pub fn contracts() -> ContractConfig {
    ContractConfig::for_chain(CHAIN_ID).unwrap()
}

/// A transaction the chain accepted.
#[derive(Debug, Clone)]
pub struct Sent {
    pub hash: H256,
    pub from: Address,
    /// Outer recipient
    pub to: Address,
    pub input: Bytes,
    /// Account the inner call acted for (the Safe for relayed calls)
    pub holder: Address,
    /// Contract the inner call hit
    pub target: Address,
    pub inner: Bytes,
    pub safe_tx_gas: Option<U256>,
}

#[derive(Debug, Default)]
pub struct ChainState {
    pub chain_id: u64,
    pub nonces: HashMap<Address, U256>,
    pub code: HashSet<Address>,
    /// wallet -> owner
    pub safes: HashMap<Address, Address>,
    pub safe_nonces: HashMap<Address, U256>,
    pub allowances: HashMap<(Address, Address), U256>,
    pub approvals: HashSet<(Address, Address)>,
    pub balances: HashMap<Address, U256>,
    pub sent: Vec<Sent>,
    pub factory_reads: usize,
    /// Base inner-call estimate; calldata adds 16 gas per byte
    pub inner_gas: u64,
    /// When set, `simulateAndRevert` estimates succeed with this value
    pub simulate_gas: Option<u64>,
    pub fail_estimates: bool,
    /// Reject broadcasts once this many transactions were accepted
    pub fail_after: Option<usize>,
}

pub struct MockChain {
    contracts: ContractConfig,
    pub state: Mutex<ChainState>,
}

fn word<T: AbiEncode>(value: T) -> Bytes {
    Bytes::from(value.encode())
}

impl MockChain {
    pub fn new() -> Arc<Self> {
        Self::with_chain_id(CHAIN_ID)
    }

    pub fn with_chain_id(chain_id: u64) -> Arc<Self> {
        Arc::new(Self {
            contracts: contracts(),
            state: Mutex::new(ChainState {
                chain_id,
                inner_gas: 50_000,
                ..Default::default()
            }),
        })
    }

    pub fn client(self: &Arc<Self>) -> Arc<dyn ChainClient> {
        self.clone()
    }

    /// Give `owner` a deployed Safe and return its address.
    pub fn deploy_safe_for(&self, owner: Address) -> Address {
        let wallet = derive_create2_address(self.contracts.safe_proxy_factory, owner).unwrap();
        let mut state = self.state.lock().unwrap();
        state.code.insert(wallet);
        state.safes.insert(wallet, owner);
        wallet
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&mut ChainState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn inner_estimate(&self, data_len: usize) -> U256 {
        let base = self.state.lock().unwrap().inner_gas;
        U256::from(base + 16 * data_len as u64)
    }

    fn read(&self, call: &CallMsg) -> RpcResult<Bytes> {
        let data = call.data.as_ref();
        let mut state = self.state.lock().unwrap();
        let c = &self.contracts;

        if call.to == c.safe_proxy_factory {
            if let Ok(req) = ComputeProxyAddressCall::decode(data) {
                state.factory_reads += 1;
                let wallet = derive_create2_address(c.safe_proxy_factory, req.user)
                    .map_err(|e| e.to_string())?;
                return Ok(word(wallet));
            }
        }
        if call.to == c.collateral {
            if let Ok(req) = AllowanceCall::decode(data) {
                let value = state
                    .allowances
                    .get(&(req.owner, req.spender))
                    .copied()
                    .unwrap_or_default();
                return Ok(word(value));
            }
            if let Ok(req) = BalanceOfCall::decode(data) {
                return Ok(word(state.balances.get(&req.account).copied().unwrap_or_default()));
            }
        }
        if call.to == c.conditional_tokens {
            if let Ok(req) = IsApprovedForAllCall::decode(data) {
                return Ok(word(state.approvals.contains(&(req.owner, req.operator))));
            }
        }
        if state.code.contains(&call.to) && NonceCall::decode(data).is_ok() {
            let nonce = state.safe_nonces.get(&call.to).copied().unwrap_or_default();
            return Ok(word(nonce));
        }
        Err(format!("execution reverted: no handler for call to {:?}", call.to))
    }

    /// Apply the effect of `data` sent to `target` on behalf of `holder`.
    fn apply(&self, state: &mut ChainState, holder: Address, target: Address, data: &[u8]) -> RpcResult<()> {
        let c = &self.contracts;
        if target == c.collateral {
            if let Ok(req) = ApproveCall::decode(data) {
                state.allowances.insert((holder, req.spender), req.amount);
            }
        } else if target == c.conditional_tokens {
            if let Ok(req) = SetApprovalForAllCall::decode(data) {
                if req.approved {
                    state.approvals.insert((holder, req.operator));
                } else {
                    state.approvals.remove(&(holder, req.operator));
                }
            }
        } else if target == c.safe_proxy_factory {
            if let Ok(req) = CreateProxyCall::decode(data) {
                let typed = create_proxy_typed_data(
                    state.chain_id,
                    c.safe_proxy_factory,
                    req.payment_token,
                    req.payment,
                    req.payment_receiver,
                );
                let signature = Signature {
                    r: U256::from_big_endian(&req.create_sig.r),
                    s: U256::from_big_endian(&req.create_sig.s),
                    v: req.create_sig.v as u64,
                };
                let owner = signature
                    .recover(typed.encode_eip712().map_err(|e| e.to_string())?)
                    .map_err(|e| e.to_string())?;
                let wallet = derive_create2_address(c.safe_proxy_factory, owner)
                    .map_err(|e| e.to_string())?;
                if state.code.contains(&wallet) {
                    return Err("execution reverted: create2 collision".to_string());
                }
                state.code.insert(wallet);
                state.safes.insert(wallet, owner);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn chain_id(&self) -> RpcResult<u64> {
        Ok(self.state.lock().unwrap().chain_id)
    }

    async fn nonce_at(&self, account: Address) -> RpcResult<U256> {
        Ok(self.state.lock().unwrap().nonces.get(&account).copied().unwrap_or_default())
    }

    async fn pending_nonce_at(&self, account: Address) -> RpcResult<U256> {
        self.nonce_at(account).await
    }

    async fn suggest_gas_price(&self) -> RpcResult<U256> {
        Ok(U256::from(30_000_000_000u64))
    }

    async fn estimate_gas(&self, call: &CallMsg) -> RpcResult<U256> {
        let state = self.state.lock().unwrap();
        if SimulateAndRevertCall::decode(call.data.as_ref()).is_ok() {
            return match state.simulate_gas {
                Some(gas) => Ok(U256::from(gas)),
                None => Err("execution reverted".to_string()),
            };
        }
        if state.fail_estimates {
            return Err("execution reverted: out of gas".to_string());
        }
        Ok(U256::from(state.inner_gas + 16 * call.data.len() as u64))
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> RpcResult<H256> {
        let mut tx: Transaction = rlp::decode(raw.as_ref()).map_err(|e| e.to_string())?;
        tx.from = tx.recover_from().map_err(|e| e.to_string())?;
        let hash = H256::from(keccak256(raw.as_ref()));
        let to = tx.to.ok_or("contract creation not supported")?;
        let mut state = self.state.lock().unwrap();

        if let Some(limit) = state.fail_after {
            if state.sent.len() >= limit {
                return Err("broadcast rejected".to_string());
            }
        }
        let expected = state.nonces.get(&tx.from).copied().unwrap_or_default();
        if tx.nonce != expected {
            return Err(format!("nonce mismatch: got {}, expected {expected}", tx.nonce));
        }

        let (holder, target, inner, safe_tx_gas) = match state.safes.get(&to).copied() {
            Some(owner) => {
                let exec = ExecTransactionCall::decode(tx.input.as_ref())
                    .map_err(|e| format!("wallet only accepts execTransaction: {e}"))?;
                let safe_nonce = state.safe_nonces.get(&to).copied().unwrap_or_default();
                let operation = if exec.operation == 1 {
                    SafeOperation::DelegateCall
                } else {
                    SafeOperation::Call
                };
                let mut safe_tx = SafeTransaction::new(
                    exec.to,
                    exec.value,
                    exec.data.clone(),
                    operation,
                    exec.safe_tx_gas,
                    safe_nonce,
                );
                safe_tx.base_gas = exec.base_gas;
                safe_tx.gas_price = exec.gas_price;
                safe_tx.gas_token = exec.gas_token;
                safe_tx.refund_receiver = exec.refund_receiver;

                let digest = safe_tx_typed_data(state.chain_id, to, &safe_tx)
                    .encode_eip712()
                    .map_err(|e| e.to_string())?;
                let signature = normalize_signature(&exec.signatures).map_err(|e| e.to_string())?;
                let signer = signature.recover(digest).map_err(|e| e.to_string())?;
                if signer != owner {
                    return Err("execution reverted: GS026".to_string());
                }
                state.safe_nonces.insert(to, safe_nonce + 1);
                (to, exec.to, exec.data, Some(exec.safe_tx_gas))
            }
            None => (tx.from, to, tx.input.clone(), None),
        };

        self.apply(&mut state, holder, target, inner.as_ref())?;
        state.nonces.insert(tx.from, expected + 1);
        state.sent.push(Sent {
            hash,
            from: tx.from,
            to,
            input: tx.input,
            holder,
            target,
            inner,
            safe_tx_gas,
        });
        Ok(hash)
    }

    async fn code_at(&self, account: Address) -> RpcResult<Bytes> {
        let deployed = self.state.lock().unwrap().code.contains(&account);
        Ok(if deployed {
            Bytes::from(vec![0x60, 0x80, 0x60, 0x40])
        } else {
            Bytes::new()
        })
    }

    async fn call_contract(&self, call: &CallMsg) -> RpcResult<Bytes> {
        self.read(call)
    }
}

#[derive(Debug, Clone)]
enum Request {
    Call(RpcResult<H256>),
    Sign(Bytes),
}

#[derive(Debug, Default)]
pub struct CustodyState {
    next_id: u32,
    requests: HashMap<String, Request>,
    reads: HashMap<String, u32>,
    /// Status reads reported as in flight before the result shows up
    pub pending_reads: u32,
    pub never_confirm: bool,
    /// Signing requests end as REJECTED
    pub reject_signing: bool,
    /// Status reads fail at the transport level
    pub fail_status: bool,
    pub status_reads: u32,
    pub calls: Vec<ContractCall>,
}

/// Custody service double: it signs with its own key and broadcasts to the
/// mock chain when a call is submitted.
pub struct MockCustodial {
    wallet: LocalWallet,
    chain: Arc<MockChain>,
    pub state: Mutex<CustodyState>,
}

impl MockCustodial {
    pub fn new(chain: Arc<MockChain>) -> Arc<Self> {
        Arc::new(Self {
            wallet: CUSTODY_KEY.parse::<LocalWallet>().unwrap().with_chain_id(CHAIN_ID),
            chain,
            state: Mutex::new(CustodyState::default()),
        })
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    fn register(&self, request: Request) -> String {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("custody-{}", state.next_id);
        state.requests.insert(id.clone(), request);
        id
    }
}

#[async_trait]
impl CustodialApi for MockCustodial {
    async fn submit_contract_call(&self, call: &ContractCall) -> Result<String> {
        self.state.lock().unwrap().calls.push(call.clone());
        let from = self.wallet.address();
        let nonce = self.chain.pending_nonce_at(from).await.unwrap_or_default();
        let tx: TypedTransaction = TransactionRequest::new()
            .from(from)
            .to(call.to)
            .value(call.value)
            .data(call.data.clone())
            .nonce(nonce)
            .gas(500_000u64)
            .gas_price(30_000_000_000u64)
            .chain_id(CHAIN_ID)
            .into();
        let signature = self
            .wallet
            .sign_transaction_sync(&tx)
            .map_err(|e| Error::SignatureFailure(e.to_string()))?;
        let outcome = self.chain.send_raw_transaction(tx.rlp_signed(&signature)).await;
        Ok(self.register(Request::Call(outcome)))
    }

    async fn submit_typed_data(&self, typed_data: &TypedData) -> Result<String> {
        let signature = self
            .wallet
            .sign_typed_data(typed_data)
            .await
            .map_err(|e| Error::SignatureFailure(e.to_string()))?;
        // the service reports raw recovery ids
        let mut raw = signature.to_vec();
        raw[64] -= 27;
        Ok(self.register(Request::Sign(Bytes::from(raw))))
    }

    async fn transaction_status(&self, id: &str) -> Result<RemoteTransaction> {
        let mut state = self.state.lock().unwrap();
        state.status_reads += 1;
        if state.fail_status {
            return Err(Error::GenericRequest("connection reset".to_string()));
        }
        let reads = {
            let entry = state.reads.entry(id.to_string()).or_default();
            *entry += 1;
            *entry
        };
        let request = state
            .requests
            .get(id)
            .cloned()
            .ok_or_else(|| Error::GenericRequest(format!("unknown transaction {id}")))?;

        let mut record = RemoteTransaction {
            id: id.to_string(),
            status: RemoteStatus::PendingSignature,
            transaction_hash: None,
            signature: None,
            failed_reason: None,
        };
        if state.never_confirm || reads <= state.pending_reads {
            return Ok(record);
        }
        match request {
            Request::Call(Ok(hash)) => {
                record.status = RemoteStatus::Confirming;
                record.transaction_hash = Some(hash);
            }
            Request::Call(Err(reason)) => {
                record.status = RemoteStatus::Failed;
                record.failed_reason = Some(reason);
            }
            Request::Sign(_) if state.reject_signing => {
                record.status = RemoteStatus::Rejected;
                record.failed_reason = Some("blocked by signing policy".to_string());
            }
            Request::Sign(signature) => {
                record.status = RemoteStatus::Completed;
                record.signature = Some(signature);
            }
        }
        Ok(record)
    }
}

pub async fn engine(
    chain: &Arc<MockChain>,
    mode: pm_wallet::SignatureMode,
    policy: Option<pm_wallet::EnginePolicy>,
) -> pm_wallet::TradingEngine {
    let signer = pm_wallet::SignerBackend::Local(owner_wallet());
    pm_wallet::TradingEngine::new(chain.client(), Some(signer), mode, None, policy)
        .await
        .unwrap()
}

/// A smart-wallet engine whose Safe is already deployed.
pub async fn safe_engine(chain: &Arc<MockChain>) -> (pm_wallet::TradingEngine, Address) {
    let wallet = chain.deploy_safe_for(owner_wallet().address());
    (engine(chain, pm_wallet::SignatureMode::SmartWallet, None).await, wallet)
}
