//! The Startup Anchor (spec §4.J): on first run (or after a crash), finds
//! the highest `(l1_candidate, l2_candidate)` pair the L2 chain and the L1
//! chain still agree on, and seeds the epoch cache from there.
//!
//! This core keeps no persisted L2 history of its own (spec §1 Non-goals:
//! "does not persist application state beyond in-memory caches"), so the
//! anchor walk reads already-committed L2 blocks back from the execution
//! client's ordinary (unauthenticated) JSON-RPC surface rather than from a
//! private store -- the same division of responsibility the teacher draws
//! between the authenticated `EngineController` write path
//! (`crates/driver/src/engine.rs`) and the plain-RPC `ChainProvider` read
//! path (`crates/providers-alloy/src/chain_provider.rs`).

use async_trait::async_trait;
use ethscript_derive::decode_calldata;
use ethscript_primitives::{ByteString, Hash32, L1Attributes, L2Block, L2DepositTx};

use crate::cache::DerivationCache;
use crate::config::{ANCHOR_EPOCH_CACHE_DEPTH, ANCHOR_SEARCH_LIMIT};
use crate::errors::ImporterError;
use crate::l1_provider::L1Provider;

/// Read access to already-committed L2 blocks, used only during startup
/// re-anchoring. Distinct from [`crate::engine_api::EngineApi`], which is
/// the authenticated write path the Proposer drives.
#[async_trait]
pub trait L2Reader: Send + Sync {
    /// The error type surfaced by the underlying transport.
    type Error: core::error::Error + Send + Sync + 'static;

    /// Fetches the committed L2 block at `number`, if it exists.
    async fn block(&self, number: u64) -> Result<Option<L2Block>, Self::Error>;

    /// Returns the current L2 chain tip's block number.
    async fn tip_number(&self) -> Result<u64, Self::Error>;
}

/// Walks backward from the L2 tip's epoch boundary to find an epoch whose
/// attributes transaction still agrees with the canonical L1 chain, then
/// seeds a fresh cache with that epoch and up to [`ANCHOR_EPOCH_CACHE_DEPTH`]
/// epochs behind it. Returns the anchor L2 block number and the seeded
/// cache, ready for the Importer Loop to resume from.
pub async fn anchor<L1: L1Provider, L2: L2Reader>(
    l1: &L1,
    l2: &L2,
    min_depth_from_tip: u64,
) -> Result<(u64, DerivationCache), ImporterError> {
    let tip_number = l2
        .tip_number()
        .await
        .map_err(|e| ImporterError::ConfigurationFatal(format!("reading L2 tip: {e}")))?;

    let mut candidate = epoch_start_at_or_before(l2, tip_number)
        .await?
        .ok_or_else(|| ImporterError::ConfigurationFatal("L2 chain has no blocks to anchor on".into()))?;

    for _ in 0..ANCHOR_SEARCH_LIMIT {
        if tip_number.saturating_sub(candidate.number) < min_depth_from_tip {
            candidate = match epoch_start_at_or_before(l2, candidate.number.saturating_sub(1)).await? {
                Some(earlier) => earlier,
                None => {
                    return Err(ImporterError::ConfigurationFatal(
                        "no epoch old enough to anchor on safely".into(),
                    ))
                }
            };
            continue;
        }

        let attrs = decode_attributes(&candidate)?;
        let agrees = l1
            .get_block(attrs.number)
            .await
            .map_err(|e| ImporterError::ConfigurationFatal(format!("reading L1 block {}: {e}", attrs.number)))?
            .is_some_and(|l1_block| l1_block.hash == attrs.hash && l1_block.number == attrs.number);

        if agrees {
            let cache = seed_epoch_cache(l1, l2, &candidate).await?;
            return Ok((candidate.number, cache));
        }

        candidate = match epoch_start_at_or_before(l2, candidate.number.saturating_sub(1)).await? {
            Some(earlier) => earlier,
            None => break,
        };
    }

    Err(ImporterError::ConfigurationFatal(format!(
        "no anchor found within {ANCHOR_SEARCH_LIMIT} epoch boundaries"
    )))
}

/// Finds the first L2 block of the epoch containing `from_or_before`,
/// walking backward from it.
async fn epoch_start_at_or_before<L2: L2Reader>(
    l2: &L2,
    from_or_before: u64,
) -> Result<Option<L2Block>, ImporterError> {
    let mut number = from_or_before;
    loop {
        let Some(block) = l2
            .block(number)
            .await
            .map_err(|e| ImporterError::ConfigurationFatal(format!("reading L2 block {number}: {e}")))?
        else {
            return Ok(None);
        };
        if block.is_epoch_start() {
            return Ok(Some(block));
        }
        let Some(previous) = number.checked_sub(1) else { return Ok(Some(block)) };
        number = previous;
    }
}

fn decode_attributes(block: &L2Block) -> Result<L1Attributes, ImporterError> {
    let attributes_tx: &L2DepositTx = block
        .ethscription_txs
        .first()
        .ok_or_else(|| ImporterError::ConfigurationFatal(format!("L2 block {} has no attributes tx", block.number)))?;
    decode_attributes_calldata(&attributes_tx.data)
}

fn decode_attributes_calldata(data: &ByteString) -> Result<L1Attributes, ImporterError> {
    decode_calldata(data.as_slice())
        .map_err(|e| ImporterError::ConfigurationFatal(format!("malformed attributes calldata: {e}")))
}

/// Walks back from `anchor_block` until [`ANCHOR_EPOCH_CACHE_DEPTH`] epoch
/// boundaries have been collected or L2 block 0 is reached, inserting both
/// the L2 blocks and their matching L1 origins into `cache`.
async fn seed_epoch_cache<L1: L1Provider, L2: L2Reader>(
    l1: &L1,
    l2: &L2,
    anchor_block: &L2Block,
) -> Result<DerivationCache, ImporterError> {
    let mut cache = DerivationCache::new();
    let mut boundaries_seen = 0u64;
    let mut number = anchor_block.number;

    loop {
        let Some(block) = l2
            .block(number)
            .await
            .map_err(|e| ImporterError::ConfigurationFatal(format!("reading L2 block {number}: {e}")))?
        else {
            break;
        };

        if block.is_epoch_start() {
            boundaries_seen += 1;
            if let Ok(attrs) = decode_attributes(&block) {
                if let Ok(Some(l1_block)) = l1.get_block(attrs.number).await {
                    cache.insert_l1_block(l1_block);
                }
            }
        }
        cache.insert_l2_block(block);

        if boundaries_seen >= ANCHOR_EPOCH_CACHE_DEPTH || number == 0 {
            break;
        }
        number -= 1;
    }

    Ok(cache)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethscript_derive::encode_calldata;
    use ethscript_primitives::{DepositSourceDomain, L1Block};
    use std::collections::{BTreeMap, HashMap};
    use std::sync::Mutex;

    #[derive(Debug, thiserror::Error)]
    #[error("fake error")]
    struct FakeError;

    #[derive(Debug, Default)]
    struct FakeL1(Mutex<BTreeMap<u64, L1Block>>);

    #[async_trait]
    impl L1Provider for FakeL1 {
        type Error = FakeError;
        async fn get_block(&self, number: u64) -> Result<Option<L1Block>, Self::Error> {
            Ok(self.0.lock().unwrap().get(&number).cloned())
        }
        async fn get_receipts(
            &self,
            _number: u64,
        ) -> Result<Option<HashMap<Hash32, ethscript_primitives::Receipt>>, Self::Error> {
            Ok(Some(HashMap::new()))
        }
        async fn get_block_number(&self) -> Result<u64, Self::Error> {
            Ok(self.0.lock().unwrap().keys().next_back().copied().unwrap_or_default())
        }
    }

    #[derive(Debug, Default)]
    struct FakeL2(Mutex<BTreeMap<u64, L2Block>>);

    #[async_trait]
    impl L2Reader for FakeL2 {
        type Error = FakeError;
        async fn block(&self, number: u64) -> Result<Option<L2Block>, Self::Error> {
            Ok(self.0.lock().unwrap().get(&number).cloned())
        }
        async fn tip_number(&self) -> Result<u64, Self::Error> {
            Ok(self.0.lock().unwrap().keys().next_back().copied().unwrap_or_default())
        }
    }

    fn l1_block(number: u64) -> L1Block {
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

    fn l2_epoch_start(number: u64, l1_number: u64) -> L2Block {
        let attrs = L1Attributes {
            number: l1_number,
            hash: Hash32::repeat_byte(l1_number as u8),
            timestamp: l1_number * 12,
            ..Default::default()
        };
        let attributes_tx = L2DepositTx {
            source_hash: DepositSourceDomain::attributes_source_hash(attrs.hash, 0),
            from: Default::default(),
            to: None,
            mint: Default::default(),
            value: Default::default(),
            gas_limit: 150_000,
            is_system_tx: true,
            data: encode_calldata(&attrs),
        };
        L2Block {
            number,
            block_hash: Hash32::repeat_byte(number as u8),
            parent_hash: Hash32::repeat_byte(number.wrapping_sub(1) as u8),
            timestamp: attrs.timestamp,
            prev_randao: attrs.hash,
            parent_beacon_block_root: Some(attrs.hash),
            l1_attributes: attrs,
            sequence_number: 0,
            ethscription_txs: vec![attributes_tx],
        }
    }

    #[tokio::test]
    async fn anchors_on_an_epoch_the_l1_chain_still_recognizes() {
        let l1 = FakeL1::default();
        let l2 = FakeL2::default();
        for n in 0..50u64 {
            l1.0.lock().unwrap().insert(n, l1_block(n));
            l2.0.lock().unwrap().insert(n, l2_epoch_start(n, n));
        }

        let (anchored_at, cache) = anchor(&l1, &l2, 10).await.unwrap();
        assert!(anchored_at <= 40);
        assert!(cache.l2_block(anchored_at).is_some());
    }

    #[tokio::test]
    async fn gives_up_if_l1_never_agrees() {
        let l1 = FakeL1::default();
        let l2 = FakeL2::default();
        for n in 0..5u64 {
            l2.0.lock().unwrap().insert(n, l2_epoch_start(n, n + 1000));
        }
        let err = anchor(&l1, &l2, 0).await.unwrap_err();
        assert!(matches!(err, ImporterError::ConfigurationFatal(_)));
    }
}
