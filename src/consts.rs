pub const POLYGON_CHAIN_ID: u64 = 137;
pub const AMOY_CHAIN_ID: u64 = 80002;

/// EIP-712 domain name of the Polymarket SafeProxyFactory. The factory's
/// domain has no version field.
pub const SAFE_FACTORY_DOMAIN_NAME: &str = "Polymarket Contract Proxy Factory";

pub const CLOB_AUTH_DOMAIN_NAME: &str = "ClobAuthDomain";
pub const CLOB_AUTH_DOMAIN_VERSION: &str = "1";
pub const CLOB_AUTH_MESSAGE: &str = "This message attests that I control the given wallet";

/// keccak256 of the Safe proxy creation code used by the factory's CREATE2.
pub const SAFE_INIT_CODE_HASH: &str =
    "0x2bce2127ff07fb632d16c8347c4ebf501f4841168bed00d9e6ef715ddb6fcecf";

/// Collateral and conditional tokens both use 6 decimals; amounts handed to
/// the engine are always in base units.
pub const COLLATERAL_TOKEN_DECIMALS: u32 = 6;
pub const CONDITIONAL_TOKEN_DECIMALS: u32 = 6;

/// Outcome index sets of a binary market (YES = 0b01, NO = 0b10).
pub const BINARY_PARTITION: [u64; 2] = [1, 2];

pub const DEFAULT_SAFE_GAS_OVERHEAD: u64 = 15_000;
pub const DEFAULT_SAFE_GAS_BUFFER_PERCENT: u64 = 150;
pub const DEFAULT_POLL_ATTEMPTS: u32 = 100;
