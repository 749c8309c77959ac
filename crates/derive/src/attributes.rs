//! The Attributes Transaction Builder: encodes and decodes the fixed-layout
//! packed calldata carried by the attributes deposit at the head of every
//! L2 block.
//!
//! Layout (164 bytes total, all integers big-endian and unpadded to their
//! declared width):
//!
//! ```text
//! selector (4)  = keccak256("setL1BlockValuesEcotone()")[:4]
//! u32 base_fee_scalar
//! u32 blob_base_fee_scalar
//! u64 sequence_number
//! u64 l1_timestamp
//! u64 l1_number
//! u256 l1_base_fee
//! u256 l1_blob_base_fee
//! bytes32 l1_hash
//! bytes32 batcher_hash
//! ```
//!
//! This format is external: an L2 predeploy contract decodes it, so changing
//! field order or width is a breaking protocol change.

use crate::errors::AttributesCalldataError;
use alloy_primitives::U256;
use ethscript_primitives::{ByteString, Hash32, L1Attributes};

/// `setL1BlockValuesEcotone()`, matching the OP-Stack selector this layout
/// was modeled on.
const SELECTOR: [u8; 4] = [0x44, 0x0a, 0x5e, 0x20];

/// Total calldata length for the packed layout.
pub const ATTRIBUTES_CALLDATA_LEN: usize = 164;

/// Encodes `attrs` into the fixed 164-byte packed calldata.
pub fn encode_calldata(attrs: &L1Attributes) -> ByteString {
    let mut buf = Vec::with_capacity(ATTRIBUTES_CALLDATA_LEN);
    buf.extend_from_slice(&SELECTOR);
    buf.extend_from_slice(&attrs.base_fee_scalar.to_be_bytes());
    buf.extend_from_slice(&attrs.blob_base_fee_scalar.to_be_bytes());
    buf.extend_from_slice(&attrs.sequence_number.to_be_bytes());
    buf.extend_from_slice(&attrs.timestamp.to_be_bytes());
    buf.extend_from_slice(&attrs.number.to_be_bytes());
    buf.extend_from_slice(&attrs.base_fee.to_be_bytes::<32>());
    buf.extend_from_slice(&attrs.blob_base_fee.to_be_bytes::<32>());
    buf.extend_from_slice(attrs.hash.as_slice());
    buf.extend_from_slice(attrs.batcher_hash.as_slice());
    debug_assert_eq!(buf.len(), ATTRIBUTES_CALLDATA_LEN);
    ByteString::from(buf)
}

/// Decodes a previously encoded attributes payload. Used by tests (P9) and
/// by any component that needs to read the L2 chain's attributes back.
pub fn decode_calldata(calldata: &[u8]) -> Result<L1Attributes, AttributesCalldataError> {
    if calldata.len() != ATTRIBUTES_CALLDATA_LEN {
        return Err(AttributesCalldataError::InvalidLength(calldata.len()));
    }
    let selector: [u8; 4] = calldata[0..4].try_into().expect("checked length");
    if selector != SELECTOR {
        return Err(AttributesCalldataError::InvalidSelector(selector));
    }

    let base_fee_scalar = u32::from_be_bytes(calldata[4..8].try_into().unwrap());
    let blob_base_fee_scalar = u32::from_be_bytes(calldata[8..12].try_into().unwrap());
    let sequence_number = u64::from_be_bytes(calldata[12..20].try_into().unwrap());
    let timestamp = u64::from_be_bytes(calldata[20..28].try_into().unwrap());
    let number = u64::from_be_bytes(calldata[28..36].try_into().unwrap());
    let base_fee = U256::from_be_slice(&calldata[36..68]);
    let blob_base_fee = U256::from_be_slice(&calldata[68..100]);
    let hash = Hash32::from_slice(&calldata[100..132]);
    let batcher_hash = Hash32::from_slice(&calldata[132..164]);

    Ok(L1Attributes {
        number,
        hash,
        timestamp,
        base_fee,
        blob_base_fee,
        blob_base_fee_scalar,
        base_fee_scalar,
        sequence_number,
        batcher_hash,
    })
}
