//! The payload attributes this core sends to `engine_forkchoiceUpdated`.
//!
//! These mirror the standard Engine API `PayloadAttributesV2`/`V3` shape,
//! extended with the OP-Stack-style `transactions` / `noTxPool` / `gasLimit`
//! fields needed to force the attributes deposit (and any ethscription
//! deposits) into the block the execution client builds, the same way
//! `OpPayloadAttributes` extends the vanilla attributes.

use alloy_eips::eip4895::Withdrawal;
use alloy_primitives::{Address, Bytes, B256};
use serde::{Deserialize, Serialize};

/// Payload attributes sent alongside a forkchoice update to request a block
/// build.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadAttributes {
    /// Timestamp of the block to build.
    pub timestamp: u64,
    /// `prevRandao` for the block to build.
    pub prev_randao: B256,
    /// Fee recipient for the block to build.
    pub suggested_fee_recipient: Address,
    /// Always empty: this protocol has no L1-to-L2 value bridging and no
    /// withdrawal queue.
    pub withdrawals: Vec<Withdrawal>,
    /// Present once the L1 origin is post-Cancun; selects the V3 payload
    /// attributes shape.
    pub parent_beacon_block_root: Option<B256>,
    /// RLP-encoded deposit transactions (attributes tx, then any
    /// ethscription deposits) the execution client must include first, in
    /// order.
    pub transactions: Vec<Bytes>,
    /// Always `true`. The execution client's own mempool never contributes
    /// transactions in this protocol; every L2 transaction originates from
    /// L1 derivation.
    pub no_tx_pool: bool,
    /// Overrides the execution client's configured gas limit, if set.
    pub gas_limit: Option<u64>,
}

impl PayloadAttributes {
    /// `true` if this is the attributes shape introduced alongside
    /// `engine_forkchoiceUpdatedV3` (i.e. the L1 origin carries a beacon
    /// block root).
    pub const fn is_v3(&self) -> bool {
        self.parent_beacon_block_root.is_some()
    }
}
