use std::collections::BTreeMap;

use ethers::types::transaction::eip712::{EIP712Domain, Eip712DomainType, TypedData};
use ethers::types::{Address, Bytes, U256};
use serde_json::Value;

use crate::consts::{
    CLOB_AUTH_DOMAIN_NAME, CLOB_AUTH_DOMAIN_VERSION, CLOB_AUTH_MESSAGE, SAFE_FACTORY_DOMAIN_NAME,
};

/// How the wallet performs the inner call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum SafeOperation {
    #[default]
    Call = 0,
    DelegateCall = 1,
}

impl SafeOperation {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// The tuple a Safe hashes and verifies. Every field is signed, so nothing
/// may change between building the typed data and encoding
/// `execTransaction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeTransaction {
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub operation: SafeOperation,
    pub safe_tx_gas: U256,
    pub base_gas: U256,
    pub gas_price: U256,
    pub gas_token: Address,
    pub refund_receiver: Address,
    pub nonce: U256,
}

impl SafeTransaction {
    /// A relayed call with no refund: base gas, gas price, gas token and
    /// refund receiver are all zero.
    pub fn new(
        to: Address,
        value: U256,
        data: Bytes,
        operation: SafeOperation,
        safe_tx_gas: U256,
        nonce: U256,
    ) -> Self {
        Self {
            to,
            value,
            data,
            operation,
            safe_tx_gas,
            base_gas: U256::zero(),
            gas_price: U256::zero(),
            gas_token: Address::zero(),
            refund_receiver: Address::zero(),
            nonce,
        }
    }
}

fn field(name: &str, ty: &str) -> Eip712DomainType {
    Eip712DomainType {
        name: name.to_string(),
        r#type: ty.to_string(),
    }
}

fn address_string(address: Address) -> Value {
    // H160's Debug form is the full lower-case 0x-prefixed hex
    Value::String(format!("{address:?}"))
}

fn decimal_string(n: U256) -> Value {
    Value::String(n.to_string())
}

fn document(
    domain: EIP712Domain,
    domain_fields: Vec<Eip712DomainType>,
    primary_type: &str,
    fields: Vec<Eip712DomainType>,
    message: BTreeMap<String, Value>,
) -> TypedData {
    let mut types = BTreeMap::new();
    types.insert("EIP712Domain".to_string(), domain_fields);
    types.insert(primary_type.to_string(), fields);
    TypedData {
        domain,
        types,
        primary_type: primary_type.to_string(),
        message,
    }
}

/// CreateProxy document signed by the owner to deploy their Safe through the
/// factory. The factory's domain carries no version.
pub fn create_proxy_typed_data(
    chain_id: u64,
    factory: Address,
    payment_token: Address,
    payment: U256,
    payment_receiver: Address,
) -> TypedData {
    let domain = EIP712Domain {
        name: Some(SAFE_FACTORY_DOMAIN_NAME.to_string()),
        version: None,
        chain_id: Some(U256::from(chain_id)),
        verifying_contract: Some(factory),
        salt: None,
    };

    let message = BTreeMap::from([
        ("paymentToken".to_string(), address_string(payment_token)),
        ("payment".to_string(), decimal_string(payment)),
        ("paymentReceiver".to_string(), address_string(payment_receiver)),
    ]);

    document(
        domain,
        vec![
            field("name", "string"),
            field("chainId", "uint256"),
            field("verifyingContract", "address"),
        ],
        "CreateProxy",
        vec![
            field("paymentToken", "address"),
            field("payment", "uint256"),
            field("paymentReceiver", "address"),
        ],
        message,
    )
}

/// SafeTx document for a relayed call through `wallet`. The Safe's domain
/// is only `{chainId, verifyingContract}`.
pub fn safe_tx_typed_data(chain_id: u64, wallet: Address, tx: &SafeTransaction) -> TypedData {
    let domain = EIP712Domain {
        name: None,
        version: None,
        chain_id: Some(U256::from(chain_id)),
        verifying_contract: Some(wallet),
        salt: None,
    };

    let message = BTreeMap::from([
        ("to".to_string(), address_string(tx.to)),
        ("value".to_string(), decimal_string(tx.value)),
        (
            "data".to_string(),
            Value::String(format!("0x{}", hex::encode(&tx.data))),
        ),
        (
            "operation".to_string(),
            Value::String(tx.operation.as_u8().to_string()),
        ),
        ("safeTxGas".to_string(), decimal_string(tx.safe_tx_gas)),
        ("baseGas".to_string(), decimal_string(tx.base_gas)),
        ("gasPrice".to_string(), decimal_string(tx.gas_price)),
        ("gasToken".to_string(), address_string(tx.gas_token)),
        ("refundReceiver".to_string(), address_string(tx.refund_receiver)),
        ("nonce".to_string(), decimal_string(tx.nonce)),
    ]);

    document(
        domain,
        vec![
            field("chainId", "uint256"),
            field("verifyingContract", "address"),
        ],
        "SafeTx",
        vec![
            field("to", "address"),
            field("value", "uint256"),
            field("data", "bytes"),
            field("operation", "uint8"),
            field("safeTxGas", "uint256"),
            field("baseGas", "uint256"),
            field("gasPrice", "uint256"),
            field("gasToken", "address"),
            field("refundReceiver", "address"),
            field("nonce", "uint256"),
        ],
        message,
    )
}

/// ClobAuth challenge for L1 API authentication. The caller supplies the
/// timestamp so the document stays deterministic.
pub fn clob_auth_typed_data(signer: Address, chain_id: u64, timestamp: i64, nonce: u64) -> TypedData {
    let domain = EIP712Domain {
        name: Some(CLOB_AUTH_DOMAIN_NAME.to_string()),
        version: Some(CLOB_AUTH_DOMAIN_VERSION.to_string()),
        chain_id: Some(U256::from(chain_id)),
        verifying_contract: None,
        salt: None,
    };

    let message = BTreeMap::from([
        ("address".to_string(), address_string(signer)),
        ("timestamp".to_string(), Value::String(timestamp.to_string())),
        ("nonce".to_string(), Value::String(nonce.to_string())),
        (
            "message".to_string(),
            Value::String(CLOB_AUTH_MESSAGE.to_string()),
        ),
    ]);

    document(
        domain,
        vec![
            field("name", "string"),
            field("version", "string"),
            field("chainId", "uint256"),
        ],
        "ClobAuth",
        vec![
            field("address", "address"),
            field("timestamp", "string"),
            field("nonce", "uint256"),
            field("message", "string"),
        ],
        message,
    )
}
