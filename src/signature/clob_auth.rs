use std::collections::HashMap;

use ethers::types::{Address, Signature};
use ethers::utils::to_checksum;

pub const POLY_ADDRESS_HEADER: &str = "POLY_ADDRESS";
pub const POLY_SIGNATURE_HEADER: &str = "POLY_SIGNATURE";
pub const POLY_TIMESTAMP_HEADER: &str = "POLY_TIMESTAMP";
pub const POLY_NONCE_HEADER: &str = "POLY_NONCE";

/// L1 authentication headers derived from a signed ClobAuth document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClobAuthHeaders {
    pub address: Address,
    pub signature: Signature,
    pub timestamp: i64,
    pub nonce: u64,
}

impl ClobAuthHeaders {
    pub fn to_map(&self) -> HashMap<String, String> {
        HashMap::from([
            (
                POLY_ADDRESS_HEADER.to_string(),
                to_checksum(&self.address, None),
            ),
            (
                POLY_SIGNATURE_HEADER.to_string(),
                format!("0x{}", hex::encode(self.signature.to_vec())),
            ),
            (POLY_TIMESTAMP_HEADER.to_string(), self.timestamp.to_string()),
            (POLY_NONCE_HEADER.to_string(), self.nonce.to_string()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::U256;

    #[test]
    fn header_map_has_all_four_entries() {
        let headers = ClobAuthHeaders {
            address: "0x2791bca1f2de4661ed88a30c99a7a9449aa84174".parse().unwrap(),
            signature: Signature {
                r: U256::one(),
                s: U256::from(2u64),
                v: 27,
            },
            timestamp: 1_700_000_000,
            nonce: 3,
        };
        let map = headers.to_map();

        assert_eq!(map.len(), 4);
        assert_eq!(
            map.get(POLY_ADDRESS_HEADER).unwrap(),
            "0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174"
        );
        assert_eq!(map.get(POLY_TIMESTAMP_HEADER).unwrap(), "1700000000");
        assert_eq!(map.get(POLY_NONCE_HEADER).unwrap(), "3");
        let signature = map.get(POLY_SIGNATURE_HEADER).unwrap();
        assert!(signature.starts_with("0x"));
        assert_eq!(signature.len(), 2 + 130);
        assert!(signature.ends_with("1b"));
    }
}
