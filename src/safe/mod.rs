//! Single-owner Gnosis Safe support: address derivation, deployment, gas
//! estimation and relayed execution.

mod address;
mod deploy;
mod executor;
mod gas;

pub use address::{derive_create2_address, AddressCache, SmartWalletAccount};
pub use deploy::{deploy_smart_wallet, encode_create_proxy};
pub use executor::{encode_exec_transaction, PreparedExecution, SafeExecutor};
pub use gas::GasEstimator;

pub(crate) use address::is_deployed;
