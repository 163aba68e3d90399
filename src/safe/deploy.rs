use ethers::abi::AbiEncode;
use ethers::types::{Address, Bytes, H256, U256};
use log::info;

use super::AddressCache;
use crate::bindings::safe_proxy_factory::CreateProxyCall;
use crate::bindings::Sig;
use crate::prelude::Result;
use crate::sender::TransactionSender;
use crate::signature::{create_proxy_typed_data, split_signature, verify_typed_signature};
use crate::signer::SignerBackend;
use crate::Error;

/// `createProxy` calldata with no deployment payment.
pub fn encode_create_proxy(create_sig: Sig) -> Bytes {
    CreateProxyCall {
        payment_token: Address::zero(),
        payment: U256::zero(),
        payment_receiver: Address::zero(),
        create_sig,
    }
    .encode()
    .into()
}

/// Deploy the signer's Safe through the factory and return its address
/// with the deployment transaction hash.
pub async fn deploy_smart_wallet(
    cache: &AddressCache,
    signer: &SignerBackend,
    sender: &TransactionSender,
    chain_id: u64,
) -> Result<(Address, H256)> {
    let owner = signer.address();
    let account = cache.account(owner).await?;
    if account.deployed {
        return Err(Error::AlreadyDeployed(account.address));
    }

    let typed_data = create_proxy_typed_data(
        chain_id,
        cache.factory(),
        Address::zero(),
        U256::zero(),
        Address::zero(),
    );
    let signature = signer.sign_typed_data(&typed_data).await?;
    verify_typed_signature(&typed_data, &signature, owner)?;

    let hash = sender
        .send(
            cache.factory(),
            encode_create_proxy(split_signature(&signature)),
            U256::zero(),
        )
        .await?;
    info!("deploying safe {:?} for {owner:?}: {hash:?}", account.address);
    Ok((account.address, hash))
}
