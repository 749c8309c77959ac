//! The [`EngineApi`] trait: the L2 Block Proposer's view of the Engine
//! Client (spec §4.B, §4.E), abstracted for testability the same way
//! [`crate::l1_provider::L1Provider`] abstracts the L1 RPC Client.
//!
//! Grounded on the teacher's `EngineController` trait
//! (`crates/driver/src/engine.rs`): the same three-method shape
//! (`forkchoice_updated`, `get_payload`, `new_payload`).

use async_trait::async_trait;
use ethscript_engine::{BuiltBlock, EngineClient, EngineError, PayloadAttributes};
use ethscript_primitives::Hash32;

/// One L2 block's worth of fork-choice state, forwarded verbatim to
/// `engine_forkchoiceUpdated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForkchoiceState {
    /// The current (unsafe) head.
    pub head: Hash32,
    /// The current safe block.
    pub safe: Hash32,
    /// The current finalized block.
    pub finalized: Hash32,
}

impl From<ForkchoiceState> for alloy_rpc_types_engine::ForkchoiceState {
    fn from(value: ForkchoiceState) -> Self {
        Self {
            head_block_hash: value.head,
            safe_block_hash: value.safe,
            finalized_block_hash: value.finalized,
        }
    }
}

/// The Engine API surface the L2 Block Proposer drives: one forkchoice
/// update to request a build, one `getPayload` to retrieve it, one
/// `newPayload` to validate it, and a final forkchoice update to commit it
/// as head (spec §4.E steps 2-5).
#[async_trait]
pub trait EngineApi: Send + Sync {
    /// Requests a payload build on top of `state`, using `attributes`.
    /// Returns `Ok(None)` only when `attributes` is `None` (a plain
    /// forkchoice commit with no accompanying build).
    async fn forkchoice_updated(
        &self,
        state: ForkchoiceState,
        attributes: Option<PayloadAttributes>,
    ) -> Result<Option<alloy_rpc_types_engine::PayloadId>, EngineError>;

    /// Retrieves the payload previously requested by `forkchoice_updated`.
    async fn get_payload(
        &self,
        payload_id: alloy_rpc_types_engine::PayloadId,
        use_v3: bool,
    ) -> Result<BuiltBlock, EngineError>;

    /// Validates `payload`, requiring a `VALID` status and a matching
    /// `latestValidHash`.
    async fn new_payload(
        &self,
        payload: &BuiltBlock,
        parent_beacon_block_root: Hash32,
    ) -> Result<(), EngineError>;
}

#[async_trait]
impl EngineApi for EngineClient {
    async fn forkchoice_updated(
        &self,
        state: ForkchoiceState,
        attributes: Option<PayloadAttributes>,
    ) -> Result<Option<alloy_rpc_types_engine::PayloadId>, EngineError> {
        EngineClient::forkchoice_updated(self, state.into(), attributes).await
    }

    async fn get_payload(
        &self,
        payload_id: alloy_rpc_types_engine::PayloadId,
        use_v3: bool,
    ) -> Result<BuiltBlock, EngineError> {
        EngineClient::get_payload(self, payload_id, use_v3).await
    }

    async fn new_payload(
        &self,
        payload: &BuiltBlock,
        parent_beacon_block_root: Hash32,
    ) -> Result<(), EngineError> {
        EngineClient::new_payload(self, payload, parent_beacon_block_root).await
    }
}
