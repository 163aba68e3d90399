use std::fs;
use std::path::{Path, PathBuf};

use ethers::signers::{LocalWallet, Signer};
use ethers::types::Address;
use log::{debug, info};

use crate::prelude::Result;
use crate::Error;

/// A key decrypted from a Web3 secret-storage (v3) keystore file.
#[derive(Debug, Clone)]
pub struct KeystoreSigner {
    wallet: LocalWallet,
    path: PathBuf,
}

impl KeystoreSigner {
    /// Decrypt `path`. When `expected` is given the decrypted key must
    /// belong to that address.
    pub fn from_file(
        path: impl AsRef<Path>,
        password: &str,
        expected: Option<Address>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let wallet = LocalWallet::decrypt_keystore(path, password)
            .map_err(|e| Error::Wallet(format!("cannot decrypt {}: {e}", path.display())))?;
        if let Some(expected) = expected {
            if wallet.address() != expected {
                return Err(Error::Wallet(format!(
                    "keystore {} holds {:?}, expected {expected:?}",
                    path.display(),
                    wallet.address()
                )));
            }
        }
        info!("loaded keystore {} for {:?}", path.display(), wallet.address());
        Ok(Self {
            wallet,
            path: path.to_path_buf(),
        })
    }

    /// Find the keystore for `address` in `dir`.
    ///
    /// Files whose `address` field names another account are skipped
    /// without decrypting; files without the field are decrypted and
    /// compared.
    pub fn from_directory(dir: impl AsRef<Path>, password: &str, address: Address) -> Result<Self> {
        let dir = dir.as_ref();
        let wanted = hex::encode(address.as_bytes());
        let entries = fs::read_dir(dir)
            .map_err(|e| Error::Wallet(format!("cannot read {}: {e}", dir.display())))?;

        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(_) => continue,
            };
            if !path.is_file() {
                continue;
            }
            let declared = fs::read_to_string(&path)
                .ok()
                .and_then(|raw| serde_json::from_str::<serde_json::Value>(&raw).ok())
                .and_then(|json| json.get("address").and_then(|a| a.as_str()).map(str::to_lowercase));

            match declared {
                Some(declared) if declared.trim_start_matches("0x") != wanted => {
                    debug!("skipping keystore {} for {declared}", path.display());
                }
                Some(_) => return Self::from_file(&path, password, Some(address)),
                None => {
                    if let Ok(signer) = Self::from_file(&path, password, Some(address)) {
                        return Ok(signer);
                    }
                }
            }
        }

        Err(Error::Wallet(format!(
            "no keystore for {address:?} in {}",
            dir.display()
        )))
    }

    /// Generate a fresh key into `dir`, encrypted with `password`.
    pub fn create(dir: impl AsRef<Path>, password: &str) -> Result<Self> {
        let dir = dir.as_ref();
        let mut rng = rand::thread_rng();
        let (wallet, name) = LocalWallet::new_keystore(dir, &mut rng, password, None)
            .map_err(|e| Error::Wallet(e.to_string()))?;
        Ok(Self {
            wallet,
            path: dir.join(name),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn wallet(&self) -> &LocalWallet {
        &self.wallet
    }

    pub(crate) fn with_chain_id(self, chain_id: u64) -> Self {
        Self {
            wallet: self.wallet.with_chain_id(chain_id),
            path: self.path,
        }
    }
}
