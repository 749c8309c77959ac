//! The Prefetcher (spec §4.H): bounded, parallel look-ahead fetch of L1
//! blocks and receipts, decoupled from the Importer Loop's consumption rate.
//!
//! Grounded on the teacher's separation of a pipeline's data-fetching
//! stages from its driver loop (`crates/driver/src/core.rs`'s
//! `pipeline.produce_payload` boundary): here the boundary is a bounded
//! in-flight map of spawned fetch tasks rather than a derivation-stage
//! stack, since this core has no intermediate stages between "fetch" and
//! "extract".

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use ethscript_primitives::{Hash32, L1Block, Receipt};
use tokio::task::JoinHandle;

use crate::errors::ImporterError;
use crate::l1_provider::L1Provider;

/// One L1 block's prefetched (block, receipts) pair.
pub type FetchResult = Result<(L1Block, HashMap<Hash32, Receipt>), ImporterError>;

/// Schedules and holds in-flight fetches for a window of L1 block numbers.
///
/// Each number owns one joined future combining its block and receipts
/// fetch (spec §4.H describes them as independent futures; they are joined
/// here since the Importer Loop always needs both together). Results are
/// removed from the in-flight map once claimed.
#[derive(Debug, Default)]
pub struct Prefetcher {
    inflight: BTreeMap<u64, JoinHandle<FetchResult>>,
}

impl Prefetcher {
    /// An empty prefetcher with nothing in flight.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensures every number in `window` has an in-flight (or already
    /// completed) fetch, spawning new tasks for numbers not already tracked.
    pub fn ensure_scheduled<P>(&mut self, provider: Arc<P>, window: impl IntoIterator<Item = u64>)
    where
        P: L1Provider + 'static,
    {
        for number in window {
            self.inflight.entry(number).or_insert_with(|| {
                let provider = Arc::clone(&provider);
                tokio::spawn(async move { fetch_one(provider.as_ref(), number).await })
            });
        }
    }

    /// Awaits and removes the fetch for `number`, scheduling it first if it
    /// was not already in flight. Returns [`ImporterError::NotReady`] if the
    /// L1 block does not exist yet.
    pub async fn claim<P>(&mut self, provider: &Arc<P>, number: u64) -> FetchResult
    where
        P: L1Provider + 'static,
    {
        if let Some(handle) = self.inflight.remove(&number) {
            return handle.await.unwrap_or_else(|e| {
                Err(ImporterError::Transient { number, source: Box::new(JoinErrorWrapper(e)) })
            });
        }
        fetch_one(provider.as_ref(), number).await
    }

    /// Discards every in-flight fetch for numbers `>= boundary`, aborting
    /// their tasks (spec §4.H "Cancellation: when a reorg is detected, all
    /// in-flight futures for numbers >= the reorg boundary are discarded.").
    pub fn cancel_from(&mut self, boundary: u64) {
        let stale: Vec<u64> = self.inflight.range(boundary..).map(|(&n, _)| n).collect();
        for number in stale {
            if let Some(handle) = self.inflight.remove(&number) {
                handle.abort();
            }
        }
    }

    /// Number of fetches currently in flight. Used to size the next
    /// look-ahead window against the bounded-queue policy (spec §5
    /// "Prefetcher queue is bounded (~2x batch)").
    pub fn len(&self) -> usize {
        self.inflight.len()
    }

    /// `true` if nothing is in flight.
    pub fn is_empty(&self) -> bool {
        self.inflight.is_empty()
    }
}

async fn fetch_one<P: L1Provider>(provider: &P, number: u64) -> FetchResult {
    let block = provider
        .get_block(number)
        .await
        .map_err(|source| ImporterError::Transient { number, source: Box::new(source) })?
        .ok_or(ImporterError::NotReady(number))?;
    let receipts = provider
        .get_receipts(number)
        .await
        .map_err(|source| ImporterError::Transient { number, source: Box::new(source) })?
        .ok_or(ImporterError::NotReady(number))?;
    Ok((block, receipts))
}

#[derive(Debug)]
struct JoinErrorWrapper(tokio::task::JoinError);

impl core::fmt::Display for JoinErrorWrapper {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "prefetch task join error: {}", self.0)
    }
}

impl core::error::Error for JoinErrorWrapper {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        Some(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap as StdHashMap;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct FakeProvider {
        blocks: Mutex<StdHashMap<u64, L1Block>>,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("fake provider error")]
    struct FakeError;

    #[async_trait]
    impl L1Provider for FakeProvider {
        type Error = FakeError;

        async fn get_block(&self, number: u64) -> Result<Option<L1Block>, Self::Error> {
            Ok(self.blocks.lock().unwrap().get(&number).cloned())
        }

        async fn get_receipts(
            &self,
            number: u64,
        ) -> Result<Option<HashMap<Hash32, Receipt>>, Self::Error> {
            Ok(self.blocks.lock().unwrap().get(&number).map(|_| HashMap::new()))
        }

        async fn get_block_number(&self) -> Result<u64, Self::Error> {
            Ok(self.blocks.lock().unwrap().keys().max().copied().unwrap_or_default())
        }
    }

    fn sample_block(number: u64) -> L1Block {
        L1Block {
            number,
            hash: Hash32::repeat_byte(number as u8),
            parent_hash: Hash32::ZERO,
            timestamp: number * 12,
            base_fee_per_gas: Default::default(),
            mix_hash: Hash32::ZERO,
            parent_beacon_block_root: None,
            transactions: vec![],
        }
    }

    #[tokio::test]
    async fn claims_a_prefetched_block() {
        let provider = Arc::new(FakeProvider::default());
        provider.blocks.lock().unwrap().insert(1, sample_block(1));

        let mut prefetcher = Prefetcher::new();
        prefetcher.ensure_scheduled(Arc::clone(&provider), [1]);
        let (block, _) = prefetcher.claim(&provider, 1).await.unwrap();
        assert_eq!(block.number, 1);
        assert!(prefetcher.is_empty());
    }

    #[tokio::test]
    async fn not_ready_block_surfaces_as_not_ready() {
        let provider = Arc::new(FakeProvider::default());
        let mut prefetcher = Prefetcher::new();
        let err = prefetcher.claim(&provider, 5).await.unwrap_err();
        assert!(matches!(err, ImporterError::NotReady(5)));
    }

    #[tokio::test]
    async fn cancel_from_aborts_scheduled_fetches() {
        let provider = Arc::new(FakeProvider::default());
        let mut prefetcher = Prefetcher::new();
        prefetcher.ensure_scheduled(Arc::clone(&provider), [10, 11, 12]);
        assert_eq!(prefetcher.len(), 3);
        prefetcher.cancel_from(11);
        assert_eq!(prefetcher.len(), 1);
    }
}
