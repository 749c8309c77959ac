//! In-memory cache state owned exclusively by the Importer Loop (spec §3):
//! recent L1 blocks and recent L2 blocks, pruned to the retention window
//! needed to compute `finalized`.
//!
//! Grounded on the teacher's `L2ChainHeads`/`SyncCursor` pattern of plain
//! owned state behind narrow accessor methods (`crates/driver/src/heads.rs`,
//! `crates/driver/src/cursor.rs`) rather than a shared, lock-guarded
//! singleton (spec §9 "Avoid global singletons -- they hamper reorg tests").

use std::collections::BTreeMap;

use ethscript_primitives::{L1Block, L2Block};

/// Recent L1 blocks, keyed by L1 block number, and recent L2 blocks, keyed
/// by L2 block number. Both are pruned together after every successful
/// import step.
#[derive(Debug, Default)]
pub struct DerivationCache {
    eth_block_cache: BTreeMap<u64, L1Block>,
    ethscriptions_block_cache: BTreeMap<u64, L2Block>,
}

impl DerivationCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached L1 block at `number`, if present.
    pub fn l1_block(&self, number: u64) -> Option<&L1Block> {
        self.eth_block_cache.get(&number)
    }

    /// Inserts `block` into the L1 cache.
    pub fn insert_l1_block(&mut self, block: L1Block) {
        self.eth_block_cache.insert(block.number, block);
    }

    /// Returns the highest L1 block number in the cache, if any.
    pub fn highest_l1_number(&self) -> Option<u64> {
        self.eth_block_cache.keys().next_back().copied()
    }

    /// Returns every cached L2 block, in ascending L2 number order.
    pub fn l2_blocks(&self) -> impl DoubleEndedIterator<Item = &L2Block> {
        self.ethscriptions_block_cache.values()
    }

    /// Returns the cached L2 block at `number`, if present.
    pub fn l2_block(&self, number: u64) -> Option<&L2Block> {
        self.ethscriptions_block_cache.get(&number)
    }

    /// Returns the highest (most recent) cached L2 block, if any.
    pub fn l2_head(&self) -> Option<&L2Block> {
        self.ethscriptions_block_cache.values().next_back()
    }

    /// Returns the lowest (oldest) cached L2 block, if any.
    pub fn l2_oldest(&self) -> Option<&L2Block> {
        self.ethscriptions_block_cache.values().next()
    }

    /// Appends `block` to the L2 cache.
    pub fn insert_l2_block(&mut self, block: L2Block) {
        self.ethscriptions_block_cache.insert(block.number, block);
    }

    /// Discards every L1 block strictly above `boundary` (spec §4.I:
    /// "no partial writes -- the engine rejects the mismatched new-payload
    /// before any cache update", and §4.H's reorg cancellation policy
    /// applied to already-cached entries).
    pub fn truncate_l1_above(&mut self, boundary: u64) {
        self.eth_block_cache.retain(|&number, _| number <= boundary);
    }

    /// Discards every L2 block whose L1 origin is strictly above `boundary`.
    pub fn truncate_l2_above_eth_block(&mut self, boundary: u64) {
        self.ethscriptions_block_cache.retain(|_, block| block.eth_block_number() <= boundary);
    }

    /// Prunes both caches to the retention window (spec §3): `eth_block_cache`
    /// keeps the newest entry minus `retention_depth`; `ethscriptions_block_cache`
    /// keeps entries whose L1 origin is at least as new as the oldest
    /// retained L1 block.
    pub fn prune(&mut self, retention_depth: u64) {
        let Some(newest) = self.highest_l1_number() else { return };
        let floor = newest.saturating_sub(retention_depth);
        self.eth_block_cache.retain(|&number, _| number >= floor);
        self.ethscriptions_block_cache.retain(|_, block| block.eth_block_number() >= floor);
    }

    /// Number of cached L1 blocks. Exposed for tests and logging.
    pub fn l1_len(&self) -> usize {
        self.eth_block_cache.len()
    }

    /// Number of cached L2 blocks. Exposed for tests and logging.
    pub fn l2_len(&self) -> usize {
        self.ethscriptions_block_cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethscript_primitives::{Hash32, L1Attributes};

    fn l1(number: u64) -> L1Block {
        L1Block {
            number,
            hash: Hash32::repeat_byte(number as u8),
            parent_hash: Hash32::repeat_byte(number.wrapping_sub(1) as u8),
            timestamp: number * 12,
            base_fee_per_gas: Default::default(),
            mix_hash: Hash32::ZERO,
            parent_beacon_block_root: None,
            transactions: vec![],
        }
    }

    fn l2(number: u64, eth_block_number: u64) -> L2Block {
        L2Block {
            number,
            block_hash: Hash32::repeat_byte(number as u8),
            parent_hash: Hash32::repeat_byte(number.wrapping_sub(1) as u8),
            timestamp: number * 12,
            prev_randao: Hash32::ZERO,
            parent_beacon_block_root: None,
            l1_attributes: L1Attributes { number: eth_block_number, ..Default::default() },
            sequence_number: 0,
            ethscription_txs: vec![],
        }
    }

    #[test]
    fn prune_keeps_retention_window() {
        let mut cache = DerivationCache::new();
        for n in 0..100 {
            cache.insert_l1_block(l1(n));
            cache.insert_l2_block(l2(n, n));
        }
        cache.prune(65);
        assert_eq!(cache.l1_block(99).map(|b| b.number), Some(99));
        assert!(cache.l1_block(33).is_none());
        assert!(cache.l1_block(34).is_some());
        assert!(cache.l2_block(33).is_none());
    }

    #[test]
    fn truncate_above_discards_reorged_blocks() {
        let mut cache = DerivationCache::new();
        for n in 0..10 {
            cache.insert_l1_block(l1(n));
            cache.insert_l2_block(l2(n, n));
        }
        cache.truncate_l1_above(5);
        cache.truncate_l2_above_eth_block(5);
        assert_eq!(cache.l1_len(), 6);
        assert_eq!(cache.l2_len(), 6);
        assert!(cache.l1_block(6).is_none());
    }
}
