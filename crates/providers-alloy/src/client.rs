//! The L1 RPC Client (spec §4.A): retrying, LRU-cached access to canonical
//! Ethereum blocks and receipts over plain (non-`debug_*`) JSON-RPC.
//!
//! Grounded on the teacher's `AlloyChainProvider`
//! (`crates/providers-alloy/src/alloy_providers.rs`): one LRU cache per
//! accessor method backed by a single inner `alloy_provider::Provider`.
//! This client keeps that shape but swaps the teacher's
//! `debug_getRawHeader`/`debug_getRawReceipts` raw-RLP calls for plain
//! `eth_getBlockByNumber(.., true)` / `eth_getBlockReceipts`, since
//! ethscriptions derivation needs full transactions and receipt logs, not
//! raw headers for MPT proofs.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use alloy_primitives::U256;
use alloy_provider::{Provider, ReqwestProvider};
use alloy_rpc_types::BlockTransactions;
use async_trait::async_trait;
use ethscript_driver::L1Provider;
use ethscript_primitives::{ByteString, Hash32, L1Block, L1Tx, Log, Receipt};
use lru::LruCache;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Number of entries retained per LRU cache. The Importer Loop only ever
/// looks a handful of blocks behind the cursor (reorg checks, the
/// Prefetcher's look-ahead window), so this does not need to be large.
const CACHE_SIZE: usize = 256;

/// How long a fetched chain tip is trusted before `get_block_number` issues
/// a fresh `eth_blockNumber` call (spec §4.A, §9: "12s TTL cache on
/// `get_block_number`").
const TIP_TTL: Duration = Duration::from_secs(12);

/// Retry budget for a single logical RPC call (spec §4.A "capped
/// exponential backoff retry on transient errors").
const MAX_RETRIES: u32 = 5;

/// Base delay for the exponential backoff, doubled on each retry.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(200);

use crate::errors::ProviderError;

/// An [`L1Provider`] backed by a live Ethereum JSON-RPC endpoint.
#[derive(Debug)]
pub struct AlloyL1Provider {
    inner: ReqwestProvider,
    blocks: Mutex<LruCache<u64, L1Block>>,
    receipts: Mutex<LruCache<u64, Arc<HashMap<Hash32, Receipt>>>>,
    tip: Mutex<Option<(u64, Instant)>>,
}

impl AlloyL1Provider {
    /// Builds a client around an existing `inner` provider, with LRU caches
    /// sized to [`CACHE_SIZE`].
    pub fn new(inner: ReqwestProvider) -> Self {
        Self {
            inner,
            blocks: Mutex::new(LruCache::new(NonZeroUsize::new(CACHE_SIZE).expect("nonzero"))),
            receipts: Mutex::new(LruCache::new(NonZeroUsize::new(CACHE_SIZE).expect("nonzero"))),
            tip: Mutex::new(None),
        }
    }

    /// Builds a client against `url`.
    pub fn new_http(url: reqwest::Url) -> Self {
        Self::new(ReqwestProvider::new_http(url))
    }

    /// Forces the next [`Self::get_block_number`] call to bypass the TTL
    /// cache and fetch a fresh tip. Exposed for tests that need to observe
    /// an L1 reorg or a new block without waiting out [`TIP_TTL`].
    pub async fn invalidate_tip_cache(&self) {
        *self.tip.lock().await = None;
    }

    async fn fetch_block_with_retry(&self, number: u64) -> Result<Option<alloy_rpc_types::Block>, ProviderError> {
        retry("eth_getBlockByNumber", number, || async {
            self.inner
                .get_block(number.into(), true)
                .await
                .map_err(|source| ProviderError::Transport { method: "eth_getBlockByNumber", block: number, source })
        })
        .await
    }

    async fn fetch_receipts_with_retry(
        &self,
        number: u64,
    ) -> Result<Option<Vec<alloy_rpc_types::TransactionReceipt>>, ProviderError> {
        retry("eth_getBlockReceipts", number, || async {
            self.inner
                .get_block_receipts(number.into())
                .await
                .map_err(|source| ProviderError::Transport { method: "eth_getBlockReceipts", block: number, source })
        })
        .await
    }
}

/// Calls `f` up to [`MAX_RETRIES`] times with exponential backoff, returning
/// the first success or the last error once the budget is exhausted.
async fn retry<T, F, Fut>(method: &'static str, block: u64, mut f: F) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, ProviderError>>,
{
    let mut attempt = 0;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < MAX_RETRIES => {
                let delay = RETRY_BASE_DELAY * 2u32.pow(attempt);
                warn!(target: "l1_rpc", method, block, attempt, ?delay, %err, "retrying after transient error");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

fn l1_tx_from_rpc(tx: alloy_rpc_types::Transaction, index: u32) -> L1Tx {
    L1Tx {
        hash: tx.hash,
        index,
        from: tx.from,
        to: tx.to,
        input: ByteString::from(tx.input.to_vec()),
        value: tx.value,
    }
}

fn l1_block_from_rpc(block: alloy_rpc_types::Block, number: u64) -> Result<L1Block, ProviderError> {
    let BlockTransactions::Full(txs) = block.transactions else {
        return Err(ProviderError::NotHydrated(number));
    };
    let header = block.header;
    Ok(L1Block {
        number: header.number,
        hash: header.hash,
        parent_hash: header.parent_hash,
        timestamp: header.timestamp,
        base_fee_per_gas: U256::from(header.base_fee_per_gas.unwrap_or_default()),
        mix_hash: header.mix_hash.unwrap_or_default(),
        parent_beacon_block_root: header.parent_beacon_block_root,
        transactions: txs.into_iter().enumerate().map(|(i, tx)| l1_tx_from_rpc(tx, i as u32)).collect(),
    })
}

fn log_from_rpc(log: alloy_rpc_types::Log) -> Log {
    Log {
        address: log.address(),
        topics: log.topics().to_vec(),
        data: ByteString::from(log.data().clone()),
        log_index: log.log_index.unwrap_or_default() as u32,
        removed: log.removed,
    }
}

fn receipts_from_rpc(receipts: Vec<alloy_rpc_types::TransactionReceipt>) -> HashMap<Hash32, Receipt> {
    receipts
        .into_iter()
        .map(|r| {
            let hash = r.transaction_hash;
            let status = r.status();
            let logs = r.inner.logs().iter().cloned().map(log_from_rpc).collect();
            (hash, Receipt { status, logs })
        })
        .collect()
}

#[async_trait]
impl L1Provider for AlloyL1Provider {
    type Error = ProviderError;

    async fn get_block(&self, number: u64) -> Result<Option<L1Block>, Self::Error> {
        if let Some(block) = self.blocks.lock().await.get(&number).cloned() {
            return Ok(Some(block));
        }
        let Some(raw) = self.fetch_block_with_retry(number).await? else {
            return Ok(None);
        };
        let block = l1_block_from_rpc(raw, number)?;
        self.blocks.lock().await.put(number, block.clone());
        Ok(Some(block))
    }

    async fn get_receipts(&self, number: u64) -> Result<Option<HashMap<Hash32, Receipt>>, Self::Error> {
        if let Some(receipts) = self.receipts.lock().await.get(&number).cloned() {
            return Ok(Some((*receipts).clone()));
        }
        let Some(raw) = self.fetch_receipts_with_retry(number).await? else {
            return Ok(None);
        };
        let receipts = receipts_from_rpc(raw);
        self.receipts.lock().await.put(number, Arc::new(receipts.clone()));
        Ok(Some(receipts))
    }

    async fn get_block_number(&self) -> Result<u64, Self::Error> {
        {
            let cached = self.tip.lock().await;
            if let Some((number, fetched_at)) = *cached {
                if fetched_at.elapsed() < TIP_TTL {
                    return Ok(number);
                }
            }
        }
        let number = retry("eth_blockNumber", 0, || async {
            self.inner
                .get_block_number()
                .await
                .map_err(|source| ProviderError::Transport { method: "eth_blockNumber", block: 0, source })
        })
        .await?;
        debug!(target: "l1_rpc", number, "refreshed L1 tip");
        *self.tip.lock().await = Some((number, Instant::now()));
        Ok(number)
    }
}
