//! The Epoch/Head Tracker (spec §4.G): derives `head`/`safe`/`finalized` L2
//! block numbers from the L2 block cache, anchored by L1 epoch offsets.
//!
//! Grounded on the teacher's `L2ChainHeads` (`crates/driver/src/heads.rs`):
//! that type held four owned `L2BlockInfo` labels advanced in lock-step with
//! parent-hash checks. This core's pointers are plain L2 block numbers
//! recomputed from the cache after every step instead (spec §9 "The epoch
//! pointers head/safe/finalized are identifiers ... never owning
//! references, avoiding cycles"), since the cache is already the owner of
//! record.

use ethscript_primitives::L2Block;

use crate::cache::DerivationCache;
use crate::engine_api::ForkchoiceState;

/// The three L2 pointers surfaced to the execution client's fork-choice
/// state (spec §4.G).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainHeads {
    /// The most recent L2 block.
    pub head: u64,
    /// The most recent L2 block whose L1 origin is at least `safe_offset`
    /// epochs behind `head`'s.
    pub safe: u64,
    /// Same rule as `safe`, with `finalized_offset`.
    pub finalized: u64,
}

impl ChainHeads {
    /// Recomputes head/safe/finalized from `cache`. Returns `None` if the
    /// cache is empty (nothing has been imported yet).
    ///
    /// `safe`/`finalized` fall back to the oldest cached L2 block when no
    /// block satisfies the offset rule (spec §4.G: "If no block satisfies
    /// the offset rule, return the oldest cached L2 block.").
    pub fn recompute(cache: &DerivationCache, safe_offset: u64, finalized_offset: u64) -> Option<Self> {
        let head = cache.l2_head()?;
        let oldest = cache.l2_oldest()?.number;
        let safe = pointer_for_offset(cache, head, safe_offset).unwrap_or(oldest);
        let finalized = pointer_for_offset(cache, head, finalized_offset).unwrap_or(oldest);
        Some(Self { head: head.number, safe, finalized })
    }

    /// Builds the [`ForkchoiceState`] to send to the engine, resolving each
    /// pointer's L2 block hash out of `cache`. Panics if a pointer's block
    /// has been pruned out from under it, which would indicate a pruning bug
    /// (the retention window is always sized to exceed `finalized_offset`).
    pub fn to_forkchoice_state(&self, cache: &DerivationCache) -> ForkchoiceState {
        let hash_of = |number: u64| {
            cache
                .l2_block(number)
                .unwrap_or_else(|| panic!("chain head pointer {number} pruned from cache"))
                .block_hash
        };
        ForkchoiceState { head: hash_of(self.head), safe: hash_of(self.safe), finalized: hash_of(self.finalized) }
    }
}

/// The most recent L2 block whose L1 origin is at least `offset` epochs
/// behind `head`'s L1 origin, or `None` if no cached block qualifies.
fn pointer_for_offset(cache: &DerivationCache, head: &L2Block, offset: u64) -> Option<u64> {
    let floor = head.eth_block_number().checked_sub(offset)?;
    cache.l2_blocks().rev().find(|b| b.eth_block_number() <= floor).map(|b| b.number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethscript_primitives::{Hash32, L1Attributes};

    fn l2(number: u64, eth_block_number: u64) -> L2Block {
        L2Block {
            number,
            block_hash: Hash32::repeat_byte(number as u8),
            parent_hash: Hash32::repeat_byte(number.wrapping_sub(1) as u8),
            timestamp: eth_block_number * 12,
            prev_randao: Hash32::ZERO,
            parent_beacon_block_root: None,
            l1_attributes: L1Attributes { number: eth_block_number, ..Default::default() },
            sequence_number: 0,
            ethscription_txs: vec![],
        }
    }

    #[test]
    fn empty_cache_has_no_heads() {
        let cache = DerivationCache::new();
        assert!(ChainHeads::recompute(&cache, 32, 64).is_none());
    }

    #[test]
    fn safe_and_finalized_lag_head_by_epoch_offset() {
        let mut cache = DerivationCache::new();
        for eth_number in 0..100 {
            cache.insert_l2_block(l2(eth_number, eth_number));
        }
        let heads = ChainHeads::recompute(&cache, 31, 63).unwrap();
        assert_eq!(heads.head, 99);
        assert_eq!(heads.safe, 68);
        assert_eq!(heads.finalized, 36);
    }

    #[test]
    fn falls_back_to_oldest_cached_block_when_offset_not_satisfied() {
        let mut cache = DerivationCache::new();
        for eth_number in 90..100 {
            cache.insert_l2_block(l2(eth_number, eth_number));
        }
        let heads = ChainHeads::recompute(&cache, 31, 63).unwrap();
        assert_eq!(heads.head, 99);
        assert_eq!(heads.safe, 90);
        assert_eq!(heads.finalized, 90);
    }
}
