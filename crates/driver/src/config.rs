//! Driver configuration (spec §6), separate from the ESIP activation
//! parameters owned by [`ethscript_derive::EsipConfig`].

use alloy_primitives::{Address, U256};
use ethscript_primitives::Hash32;

/// Target L2 block time, in seconds. Fixed by spec §6 (`BLOCK_INTERVAL`).
pub const BLOCK_INTERVAL_SECS: u64 = 12;

/// Default `BLOCK_IMPORT_BATCH_SIZE`.
pub const DEFAULT_BATCH_SIZE: u64 = 2;

/// Default `SAFE_OFFSET`, in L1 epochs behind head.
pub const DEFAULT_SAFE_OFFSET: u64 = 32;

/// Default `FINALIZED_OFFSET`, in L1 epochs behind head.
pub const DEFAULT_FINALIZED_OFFSET: u64 = 64;

/// Hard cap on filler blocks inserted in one step (spec §4.F,
/// `MAX_FILLER_BLOCKS`).
pub const MAX_FILLER_BLOCKS: u64 = 100;

/// Startup Anchor search budget (spec §4.J).
pub const ANCHOR_SEARCH_LIMIT: u64 = 1000;

/// Number of epoch boundaries the Startup Anchor walks back to seed the
/// epoch cache (spec §4.J).
pub const ANCHOR_EPOCH_CACHE_DEPTH: u64 = 64;

/// Number of L1 blocks both caches retain behind the tip (spec §3), chosen
/// to comfortably exceed [`DEFAULT_FINALIZED_OFFSET`].
pub const CACHE_RETENTION_DEPTH: u64 = 65;

/// Driver-wide configuration, assembled from the environment by `bin/importer`
/// (spec §6's enumerated configuration table).
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// The first L1 block the rollup consumes; L2 block 0 anchors here.
    pub l1_genesis_block: u64,
    /// Max L1 blocks fetched and processed per driver step.
    pub batch_size: u64,
    /// L1 epochs behind head the `safe` pointer lags.
    pub safe_offset: u64,
    /// L1 epochs behind head the `finalized` pointer lags.
    pub finalized_offset: u64,
    /// Hard cap on filler blocks inserted in one step.
    pub max_filler_blocks: u64,
    /// Advisory post-step validation against a reference indexer.
    /// Out of scope for this core; recorded so the importer can log that it
    /// was requested.
    pub validate_import: bool,
    /// The system depositor address for the attributes transaction.
    pub attributes_depositor: Address,
    /// The predeployed L1-attributes contract address.
    pub attributes_recipient: Address,
    /// Fee-vault scalar applied to the L1 origin's base fee. This protocol
    /// has no L2 system-config governance (no batcher to update it), so it
    /// is fixed at genesis rather than read back from the chain.
    pub base_fee_scalar: u32,
    /// Fee-vault scalar applied to the blob base fee, same rationale as
    /// `base_fee_scalar`.
    pub blob_base_fee_scalar: u32,
    /// Left-padded identity recorded in every attributes payload. Carried
    /// for protocol-shape compatibility with the OP-Stack layout this
    /// core's calldata format is modeled on; this protocol has no batcher.
    pub batcher_hash: Hash32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            l1_genesis_block: 0,
            batch_size: DEFAULT_BATCH_SIZE,
            safe_offset: DEFAULT_SAFE_OFFSET,
            finalized_offset: DEFAULT_FINALIZED_OFFSET,
            max_filler_blocks: MAX_FILLER_BLOCKS,
            validate_import: false,
            attributes_depositor: Address::ZERO,
            attributes_recipient: Address::ZERO,
            base_fee_scalar: 0,
            blob_base_fee_scalar: 0,
            batcher_hash: Hash32::ZERO,
        }
    }
}

/// Builds the [`ethscript_primitives::L1Attributes`] payload for one L2
/// block from its L1 origin, this config's fixed scalars, and the origin's
/// position within its epoch (spec §4.D, §3 "L1Attributes"). No blobs are
/// ever observed on this protocol's L1 origins, so `blob_base_fee` is
/// always the EIP-4844 floor value of 1.
pub fn l1_attributes_for(
    config: &DriverConfig,
    origin: &ethscript_primitives::L1Block,
    sequence_number: u64,
) -> ethscript_primitives::L1Attributes {
    ethscript_primitives::L1Attributes {
        number: origin.number,
        hash: origin.hash,
        timestamp: origin.timestamp,
        base_fee: origin.base_fee_per_gas,
        blob_base_fee: alloy_primitives::U256::from(1u64),
        blob_base_fee_scalar: config.blob_base_fee_scalar,
        base_fee_scalar: config.base_fee_scalar,
        sequence_number,
        batcher_hash: config.batcher_hash,
    }
}
