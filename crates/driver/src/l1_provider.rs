//! The [`L1Provider`] trait: the Importer Loop's view of the L1 RPC Client
//! (spec §4.A), abstracted so the Prefetcher and Importer Loop can be tested
//! against an in-memory fake instead of a live Ethereum node.
//!
//! Grounded on the teacher's `ChainProvider` trait
//! (`crates/providers-alloy/src/chain_provider.rs`), which plays the same
//! role for `kona-derive`'s pipeline stages.

use std::collections::HashMap;

use async_trait::async_trait;
use ethscript_primitives::{Hash32, L1Block, Receipt};

/// Read access to canonical L1 chain data. Implementations must be
/// idempotent and safe to call concurrently for the same block number (spec
/// §5 "L1 fetches are idempotent and may overlap freely").
#[async_trait]
pub trait L1Provider: Send + Sync {
    /// The error type surfaced by the underlying transport.
    type Error: core::error::Error + Send + Sync + 'static;

    /// Fetches the L1 block at `number`, including its full transaction
    /// list. Returns `Ok(None)` if the block does not exist yet (the tip has
    /// not reached it) rather than an error.
    async fn get_block(&self, number: u64) -> Result<Option<L1Block>, Self::Error>;

    /// Fetches the receipts for every transaction in the L1 block at
    /// `number`, keyed by transaction hash. Returns `Ok(None)` under the same
    /// condition as [`Self::get_block`].
    async fn get_receipts(&self, number: u64) -> Result<Option<HashMap<Hash32, Receipt>>, Self::Error>;

    /// Returns the current L1 chain tip's block number. Implementations are
    /// expected to memoize this for roughly one L1 slot (spec §4.A, §9).
    async fn get_block_number(&self) -> Result<u64, Self::Error>;
}
