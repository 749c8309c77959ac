//! Event signature hashes the extractor matches against `log.topics[0]`.

use alloy_primitives::{keccak256, B256};

/// `CreateEthscription(address,string)` — ESIP-3.
pub fn create_ethscription_topic() -> B256 {
    keccak256("CreateEthscription(address,string)")
}

/// `ethscriptions_protocol_TransferEthscription(address,address,bytes32)` —
/// ESIP-1.
pub fn esip1_transfer_topic() -> B256 {
    keccak256("ethscriptions_protocol_TransferEthscription(address,address,bytes32)")
}

/// `ethscriptions_protocol_TransferEthscriptionForPreviousOwner(address,address,address,bytes32)`
/// — ESIP-2.
pub fn esip2_transfer_topic() -> B256 {
    keccak256(
        "ethscriptions_protocol_TransferEthscriptionForPreviousOwner(address,address,address,bytes32)",
    )
}
