//! Call marshalling for the contracts the engine talks to.
//!
//! Only the functions the engine encodes or reads are declared. Generated
//! `*Call` structs are used as pure ABI encoders (`AbiEncode::encode`), so
//! no middleware is needed to build calldata.
#![allow(clippy::too_many_arguments)]

use ethers::contract::abigen;

abigen!(
    CollateralToken,
    r#"[
        function approve(address spender, uint256 amount) external returns (bool)
        function allowance(address owner, address spender) external view returns (uint256)
        function balanceOf(address account) external view returns (uint256)
    ]"#,
);

abigen!(
    ConditionalTokens,
    r#"[
        function setApprovalForAll(address operator, bool approved) external
        function isApprovedForAll(address owner, address operator) external view returns (bool)
        function splitPosition(address collateralToken, bytes32 parentCollectionId, bytes32 conditionId, uint256[] partition, uint256 amount) external
        function mergePositions(address collateralToken, bytes32 parentCollectionId, bytes32 conditionId, uint256[] partition, uint256 amount) external
        function redeemPositions(address collateralToken, bytes32 parentCollectionId, bytes32 conditionId, uint256[] indexSets) external
    ]"#,
);

abigen!(
    NegRiskAdapter,
    r#"[
        function splitPosition(bytes32 conditionId, uint256 amount) external
        function mergePositions(bytes32 conditionId, uint256 amount) external
        function redeemPositions(bytes32 conditionId, uint256[] amounts) external
    ]"#,
);

abigen!(
    GnosisSafe,
    r#"[
        function nonce() external view returns (uint256)
        function execTransaction(address to, uint256 value, bytes data, uint8 operation, uint256 safeTxGas, uint256 baseGas, uint256 gasPrice, address gasToken, address refundReceiver, bytes signatures) external payable returns (bool)
        function simulateAndRevert(address targetContract, bytes calldataPayload) external
    ]"#,
);

abigen!(
    SafeProxyFactory,
    r#"[
        struct Sig { uint8 v; bytes32 r; bytes32 s; }
        function computeProxyAddress(address user) external view returns (address)
        function createProxy(address paymentToken, uint256 payment, address paymentReceiver, Sig createSig) external
    ]"#,
);
