use std::str::FromStr;
use std::sync::Arc;

use dashmap::DashMap;
use ethers::abi::{encode, AbiEncode, Token};
use ethers::types::{Address, H256};
use ethers::utils::{get_create2_address_from_hash, keccak256};
use log::debug;

use crate::bindings::safe_proxy_factory::ComputeProxyAddressCall;
use crate::chain::{CallMsg, ChainClient};
use crate::consts::SAFE_INIT_CODE_HASH;
use crate::prelude::Result;
use crate::Error;

/// Owner's smart wallet and whether it has code right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmartWalletAccount {
    pub owner: Address,
    pub address: Address,
    pub deployed: bool,
}

/// Owner -> smart wallet memo. Derivation is pure, so entries are never
/// invalidated; deployment status is never cached.
pub struct AddressCache {
    chain: Arc<dyn ChainClient>,
    factory: Address,
    entries: DashMap<Address, Address>,
}

impl std::fmt::Debug for AddressCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddressCache")
            .field("factory", &self.factory)
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl AddressCache {
    pub fn new(chain: Arc<dyn ChainClient>, factory: Address) -> Self {
        Self {
            chain,
            factory,
            entries: DashMap::new(),
        }
    }

    pub fn factory(&self) -> Address {
        self.factory
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Smart wallet address for `owner`, asking the factory's
    /// `computeProxyAddress` on first sight only.
    pub async fn smart_wallet_address(&self, owner: Address) -> Result<Address> {
        if let Some(address) = self.entries.get(&owner).map(|entry| *entry.value()) {
            return Ok(address);
        }

        let calldata = ComputeProxyAddressCall { user: owner }.encode();
        let raw = self
            .chain
            .call_contract(&CallMsg::new(self.factory, calldata))
            .await
            .map_err(|message| Error::DerivationFailed { owner, message })?;
        let address = decode_address(&raw).ok_or_else(|| Error::DerivationFailed {
            owner,
            message: format!("unexpected return data 0x{}", hex::encode(&raw)),
        })?;
        debug!("smart wallet of {owner:?} is {address:?}");

        // a concurrent lookup may have raced us; both computed the same value
        Ok(*self.entries.entry(owner).or_insert(address).value())
    }

    /// Address plus a fresh deployment check.
    pub async fn account(&self, owner: Address) -> Result<SmartWalletAccount> {
        let address = self.smart_wallet_address(owner).await?;
        let deployed = is_deployed(self.chain.as_ref(), address).await?;
        Ok(SmartWalletAccount {
            owner,
            address,
            deployed,
        })
    }
}

fn decode_address(raw: &[u8]) -> Option<Address> {
    if raw.len() != 32 || raw[..12].iter().any(|b| *b != 0) {
        return None;
    }
    Some(Address::from_slice(&raw[12..]))
}

pub(crate) async fn is_deployed(chain: &dyn ChainClient, address: Address) -> Result<bool> {
    let code = chain
        .code_at(address)
        .await
        .map_err(|message| Error::ChainRead {
            what: "wallet code",
            contract: address,
            message,
        })?;
    Ok(!code.is_empty())
}

/// The factory's CREATE2 derivation done offline:
/// salt = keccak256(abi.encode(owner)).
pub fn derive_create2_address(factory: Address, owner: Address) -> Result<Address> {
    let init_code_hash = H256::from_str(SAFE_INIT_CODE_HASH).map_err(|e| Error::DerivationFailed {
        owner,
        message: format!("bad init code hash: {e}"),
    })?;
    let salt = keccak256(encode(&[Token::Address(owner)]));
    Ok(get_create2_address_from_hash(factory, salt, init_code_hash))
}
