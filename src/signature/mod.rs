//! EIP-712 documents and the signature plumbing around them.

mod clob_auth;
mod typed_data;

pub use clob_auth::{
    ClobAuthHeaders, POLY_ADDRESS_HEADER, POLY_NONCE_HEADER, POLY_SIGNATURE_HEADER,
    POLY_TIMESTAMP_HEADER,
};
pub use typed_data::{
    clob_auth_typed_data, create_proxy_typed_data, safe_tx_typed_data, SafeOperation,
    SafeTransaction,
};

use ethers::types::transaction::eip712::{Eip712, TypedData};
use ethers::types::{Address, Bytes, Signature, U256};

use crate::bindings::Sig;
use crate::prelude::Result;
use crate::Error;

/// Parse a 65-byte `r || s || v` signature, lifting a raw recovery id
/// (0/1) to the 27/28 form Safe and the factory expect.
pub fn normalize_signature(raw: &[u8]) -> Result<Signature> {
    if raw.len() != 65 {
        return Err(Error::SignatureFailure(format!(
            "expected 65 signature bytes, got {}",
            raw.len()
        )));
    }
    let mut v = raw[64] as u64;
    if v < 27 {
        v += 27;
    }
    if v != 27 && v != 28 {
        return Err(Error::SignatureFailure(format!("invalid recovery byte {v}")));
    }
    Ok(Signature {
        r: U256::from_big_endian(&raw[0..32]),
        s: U256::from_big_endian(&raw[32..64]),
        v,
    })
}

/// Check that `signature` over `typed_data` recovers to `expected`.
pub fn verify_typed_signature(
    typed_data: &TypedData,
    signature: &Signature,
    expected: Address,
) -> Result<()> {
    let digest = typed_data.encode_eip712().map_err(|e| Error::Encoding {
        what: "typed data digest",
        message: e.to_string(),
    })?;
    let recovered = signature
        .recover(digest)
        .map_err(|e| Error::SignatureFailure(e.to_string()))?;
    if recovered != expected {
        return Err(Error::SignatureFailure(format!(
            "{} signature recovers to {recovered:?}, expected {expected:?}",
            typed_data.primary_type
        )));
    }
    Ok(())
}

/// The packed `signatures` blob for a threshold-1 Safe: a single
/// `r || s || v` with `v` in {27, 28}.
pub fn pack_signature(signature: &Signature) -> Bytes {
    Bytes::from(signature.to_vec())
}

/// Split into the `(v, r, s)` struct the factory's `createProxy` takes.
pub fn split_signature(signature: &Signature) -> Sig {
    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    signature.r.to_big_endian(&mut r);
    signature.s.to_big_endian(&mut s);
    Sig {
        v: signature.v as u8,
        r,
        s,
    }
}
