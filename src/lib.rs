pub mod bindings;
pub mod chain;
pub mod config;
pub mod consts;
pub mod custodial;
pub mod engine;
mod errors;
pub mod prelude;
pub mod safe;
pub mod sender;
pub mod signature;
pub mod signer;
pub mod trading;

pub use chain::{CallMsg, ChainClient, EthersChain};
pub use config::{AllowancePolicy, ContractConfig, EnginePolicy, GasPolicy, Settings, SignerSettings};
pub use custodial::{CustodialApi, CustodialConfig, HttpCustodialClient, PollPolicy};
pub use engine::{SignatureMode, TradingEngine};
pub use errors::Error;
pub use safe::{derive_create2_address, SafeExecutor, SmartWalletAccount};
pub use sender::TransactionSender;
pub use signature::{SafeOperation, SafeTransaction};
pub use signer::{CustodialSigner, KeystoreSigner, SignerBackend};
pub use trading::{AllowanceSnapshot, MarketKind, Route};
