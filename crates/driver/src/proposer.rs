//! The L2 Block Proposer (spec §4.E): drives one L2 block through the
//! engine's 5-step build/validate/commit handshake, internally invoking the
//! Filler Scheduler first (spec §4.I step 4).
//!
//! Grounded on the teacher's `Executor` abstraction
//! (`crates/driver/src/executor.rs`), which played the same "turn attributes
//! into a committed block" role for `kona-driver`'s block-building loop.

use alloy_eips::eip4895::Withdrawal;
use alloy_primitives::Address;
use ethscript_engine::PayloadAttributes;
use ethscript_primitives::{EthscriptionOp, L1Attributes, L2Block};

use crate::deposit::{build_deposit_list, encode_deposit_list};
use crate::engine_api::{EngineApi, ForkchoiceState};
use crate::errors::ImporterError;
use crate::filler::filler_timestamps;

/// Everything the Proposer needs about the L2 chain it is extending, beyond
/// what lives in the [`crate::config::DriverConfig`].
#[derive(Debug, Clone, Copy)]
pub struct ProposerContext<'a> {
    /// The current head L2 block (its timestamp anchors the Filler
    /// Scheduler's gap computation; its hash seeds the next block's parent).
    pub head: &'a L2Block,
    /// The current fork-choice state to pass through every step.
    pub forkchoice: ForkchoiceState,
    /// System depositor for the attributes transaction.
    pub attributes_depositor: Address,
    /// Predeployed L1-attributes contract recipient.
    pub attributes_recipient: Address,
}

/// Proposes the real L2 block carrying `ops`, first inserting any filler
/// blocks the Filler Scheduler determines are necessary to keep L2 block
/// time at `block_interval_secs` (spec §4.I step 4, §4.F). Returns every
/// proposed block -- fillers first, the real block last -- in the order the
/// Importer Loop must append them to the cache (spec §5 "Fillers for a step
/// precede the real L2 block for that step.").
pub async fn propose_block<E: EngineApi + ?Sized>(
    engine: &E,
    ctx: ProposerContext<'_>,
    new_attrs: &L1Attributes,
    origin_prev_randao: ethscript_primitives::Hash32,
    origin_parent_beacon_block_root: Option<ethscript_primitives::Hash32>,
    ops: &[EthscriptionOp],
    block_interval_secs: u64,
    max_filler_blocks: u64,
) -> Result<Vec<L2Block>, ImporterError> {
    let fillers = filler_timestamps(
        ctx.head.timestamp,
        new_attrs.timestamp,
        block_interval_secs,
        max_filler_blocks,
    )?;

    let had_fillers = !fillers.is_empty();
    let mut proposed = Vec::with_capacity(fillers.len() + 1);
    let mut parent = ctx.head.clone();
    let mut forkchoice = ctx.forkchoice;

    for filler_timestamp in fillers {
        let filler_attrs = L1Attributes { timestamp: filler_timestamp, ..*new_attrs };
        let block = propose_one(
            engine,
            &parent,
            forkchoice,
            &filler_attrs,
            origin_prev_randao,
            origin_parent_beacon_block_root,
            &[],
            ctx.attributes_depositor,
            ctx.attributes_recipient,
            // A filler never straddles L1 epochs (spec §4.F): it always
            // continues whatever epoch `parent` is already in, even though
            // its attributes template carries the upcoming L1 origin.
            true,
        )
        .await?;
        forkchoice = ForkchoiceState { head: block.block_hash, ..forkchoice };
        parent = block.clone();
        proposed.push(block);
    }

    let real_block = propose_one(
        engine,
        &parent,
        forkchoice,
        new_attrs,
        origin_prev_randao,
        origin_parent_beacon_block_root,
        ops,
        ctx.attributes_depositor,
        ctx.attributes_recipient,
        // Only a real block reached with no fillers in front of it marks a
        // clean epoch boundary (sequence_number 0). One preceded by fillers
        // is the tail of the epoch those fillers already opened, not a new
        // one (spec §8 scenario 5: 3 fillers then a real block at sequence
        // 4, not a reset to 0).
        had_fillers,
    )
    .await?;
    proposed.push(real_block);

    Ok(proposed)
}

async fn propose_one<E: EngineApi + ?Sized>(
    engine: &E,
    parent: &L2Block,
    forkchoice: ForkchoiceState,
    attrs: &L1Attributes,
    origin_prev_randao: ethscript_primitives::Hash32,
    origin_parent_beacon_block_root: Option<ethscript_primitives::Hash32>,
    ops: &[EthscriptionOp],
    attributes_depositor: Address,
    attributes_recipient: Address,
    continue_epoch: bool,
) -> Result<L2Block, ImporterError> {
    let sequence_number = if continue_epoch || attrs.number == parent.l1_attributes.number {
        parent.sequence_number + 1
    } else {
        0
    };
    // `attrs.sequence_number` seeds the attributes tx's domain-separated
    // `source_hash` (spec §3 "Supplemental: L2DepositTx"); it must match
    // this block's own position in the epoch, not whatever the caller
    // stamped onto the shared `L1Attributes` template, or every filler in
    // one step would mint the attributes deposit under the same source_hash.
    let attrs = &L1Attributes { sequence_number: u64::from(sequence_number), ..*attrs };
    let deposits = build_deposit_list(attrs, attributes_depositor, attributes_recipient, ops);

    // prev_randao and the beacon block root are properties of the L1 origin
    // block itself (spec §3), not of the packed attributes payload -- every
    // block in this step (fillers included) shares the same L1 origin, so
    // they stay constant across the whole `propose_block` call.
    let payload_attrs = PayloadAttributes {
        timestamp: attrs.timestamp,
        prev_randao: origin_prev_randao,
        suggested_fee_recipient: Address::ZERO,
        withdrawals: Vec::<Withdrawal>::new(),
        parent_beacon_block_root: origin_parent_beacon_block_root,
        transactions: encode_deposit_list(&deposits),
        no_tx_pool: true,
        gas_limit: None,
    };

    let l1_number = attrs.number;

    let payload_id = engine
        .forkchoice_updated(forkchoice, Some(payload_attrs))
        .await
        .map_err(|source| ImporterError::ProtocolFatal { l1_number, source })?
        .ok_or_else(|| ImporterError::ProtocolFatal {
            l1_number,
            source: ethscript_engine::EngineError::MissingPayloadId,
        })?;

    // Protocol version selection follows the L1 origin (spec §4.B: "if
    // parent_beacon_block_root is set use V3, else V2"), mirrored here via
    // `PayloadAttributes::is_v3` rather than re-deriving it.
    let use_v3 = origin_parent_beacon_block_root.is_some();
    let built = engine
        .get_payload(payload_id, use_v3)
        .await
        .map_err(|source| ImporterError::ProtocolFatal { l1_number, source })?;

    engine
        .new_payload(&built, origin_parent_beacon_block_root.unwrap_or_default())
        .await
        .map_err(|source| ImporterError::ProtocolFatal { l1_number, source })?;

    let committed = ForkchoiceState { head: built.block_hash, safe: forkchoice.safe, finalized: forkchoice.finalized };
    engine
        .forkchoice_updated(committed, None)
        .await
        .map_err(|source| ImporterError::ProtocolFatal { l1_number, source })?;

    Ok(L2Block {
        number: parent.number + 1,
        block_hash: built.block_hash,
        parent_hash: built.parent_hash,
        timestamp: built.timestamp,
        prev_randao: origin_prev_randao,
        parent_beacon_block_root: origin_parent_beacon_block_root,
        l1_attributes: *attrs,
        sequence_number,
        ethscription_txs: deposits,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ethscript_engine::{BuiltBlock, EngineError};
    use ethscript_primitives::{DepositSourceDomain, Hash32, L2DepositTx};
    use std::sync::Mutex;

    /// Records every `forkchoice_updated`/`get_payload` call it receives so
    /// tests can assert on protocol-version selection, and hands back
    /// deterministic, incrementing block hashes.
    #[derive(Default)]
    struct FakeEngine {
        next_number: Mutex<u64>,
        get_payload_use_v3: Mutex<Vec<bool>>,
        new_payload_beacon_roots: Mutex<Vec<Hash32>>,
    }

    #[async_trait]
    impl EngineApi for FakeEngine {
        async fn forkchoice_updated(
            &self,
            _state: ForkchoiceState,
            attributes: Option<PayloadAttributes>,
        ) -> Result<Option<alloy_rpc_types_engine::PayloadId>, EngineError> {
            Ok(attributes.map(|_| alloy_rpc_types_engine::PayloadId::new([1; 8])))
        }

        async fn get_payload(
            &self,
            _payload_id: alloy_rpc_types_engine::PayloadId,
            use_v3: bool,
        ) -> Result<BuiltBlock, EngineError> {
            self.get_payload_use_v3.lock().unwrap().push(use_v3);
            let mut number = self.next_number.lock().unwrap();
            *number += 1;
            Ok(BuiltBlock::for_test(
                Hash32::repeat_byte(*number as u8),
                Hash32::repeat_byte((*number - 1) as u8),
                *number,
                1000 + *number * 12,
            ))
        }

        async fn new_payload(&self, payload: &BuiltBlock, parent_beacon_block_root: Hash32) -> Result<(), EngineError> {
            self.new_payload_beacon_roots.lock().unwrap().push(parent_beacon_block_root);
            let _ = payload;
            Ok(())
        }
    }

    fn genesis() -> L2Block {
        let attrs = L1Attributes { number: 0, hash: Hash32::repeat_byte(0), timestamp: 1000, ..Default::default() };
        let attributes_tx = L2DepositTx {
            source_hash: DepositSourceDomain::attributes_source_hash(attrs.hash, 0),
            from: Default::default(),
            to: None,
            mint: Default::default(),
            value: Default::default(),
            gas_limit: 150_000,
            is_system_tx: true,
            data: ethscript_derive::encode_calldata(&attrs),
        };
        L2Block {
            number: 0,
            block_hash: Hash32::repeat_byte(0),
            parent_hash: Hash32::ZERO,
            timestamp: 1000,
            prev_randao: Hash32::ZERO,
            parent_beacon_block_root: None,
            l1_attributes: attrs,
            sequence_number: 0,
            ethscription_txs: vec![attributes_tx],
        }
    }

    fn ctx(head: &L2Block) -> ProposerContext<'_> {
        ProposerContext {
            head,
            forkchoice: ForkchoiceState { head: head.block_hash, safe: head.block_hash, finalized: head.block_hash },
            attributes_depositor: Address::ZERO,
            attributes_recipient: Address::repeat_byte(0xAB),
        }
    }

    #[tokio::test]
    async fn post_cancun_origin_uses_v3_and_forwards_its_beacon_root() {
        let engine = FakeEngine::default();
        let head = genesis();
        let new_attrs = L1Attributes { number: 1, hash: Hash32::repeat_byte(1), timestamp: 1012, ..Default::default() };
        let beacon_root = Hash32::repeat_byte(0x77);

        let proposed =
            propose_block(&engine, ctx(&head), &new_attrs, Hash32::repeat_byte(0x99), Some(beacon_root), &[], 12, 100)
                .await
                .unwrap();

        assert_eq!(proposed.len(), 1);
        assert_eq!(proposed[0].prev_randao, Hash32::repeat_byte(0x99));
        assert_eq!(proposed[0].parent_beacon_block_root, Some(beacon_root));
        assert_eq!(engine.get_payload_use_v3.lock().unwrap(), &[true]);
        assert_eq!(engine.new_payload_beacon_roots.lock().unwrap(), &[beacon_root]);
    }

    #[tokio::test]
    async fn pre_cancun_origin_uses_v2_and_sends_no_beacon_root() {
        let engine = FakeEngine::default();
        let head = genesis();
        let new_attrs = L1Attributes { number: 1, hash: Hash32::repeat_byte(1), timestamp: 1012, ..Default::default() };

        let proposed = propose_block(&engine, ctx(&head), &new_attrs, Hash32::repeat_byte(0x55), None, &[], 12, 100)
            .await
            .unwrap();

        assert_eq!(proposed[0].parent_beacon_block_root, None);
        assert_eq!(engine.get_payload_use_v3.lock().unwrap(), &[false]);
        assert_eq!(engine.new_payload_beacon_roots.lock().unwrap(), &[Hash32::ZERO]);
    }

    #[tokio::test]
    async fn fillers_and_real_block_share_the_origins_prev_randao_and_beacon_root() {
        let engine = FakeEngine::default();
        let head = genesis();
        let new_attrs = L1Attributes { number: 1, hash: Hash32::repeat_byte(1), timestamp: 1048, ..Default::default() };
        let beacon_root = Hash32::repeat_byte(0x33);
        let origin_randao = Hash32::repeat_byte(0x44);

        let proposed = propose_block(&engine, ctx(&head), &new_attrs, origin_randao, Some(beacon_root), &[], 12, 100)
            .await
            .unwrap();

        // Scenario 5: gap 48 needs 3 fillers plus the real block.
        assert_eq!(proposed.len(), 4);
        for block in &proposed {
            assert_eq!(block.prev_randao, origin_randao);
            assert_eq!(block.parent_beacon_block_root, Some(beacon_root));
        }
        // head is sequence 0; 3 fillers plus the real block continue the
        // same epoch rather than resetting, landing the real block at 4.
        let sequence_numbers: Vec<u64> = proposed.iter().map(|b| b.sequence_number).collect();
        assert_eq!(sequence_numbers, vec![1, 2, 3, 4]);
    }
}
