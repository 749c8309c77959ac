//! A read-only view of the L2 execution client's ordinary JSON-RPC surface
//! (spec §4.J "Startup Anchor"), distinct from [`crate::AlloyL1Provider`]
//! (L1 reads) and from the authenticated Engine API the Proposer drives.
//!
//! Grounded on the same `AlloyChainProvider` shape as [`crate::client`], but
//! reads back only what the Startup Anchor needs: a block's attributes
//! deposit transaction and its sequence number, decoded straight out of the
//! first transaction's calldata via [`ethscript_derive::decode_calldata`].

use alloy_provider::{Provider, ReqwestProvider};
use alloy_rpc_types::BlockTransactions;
use async_trait::async_trait;
use ethscript_derive::decode_calldata;
use ethscript_primitives::{ByteString, Hash32, L1Attributes, L2Block, L2DepositTx};
use ethscript_driver::L2Reader;

use crate::errors::ProviderError;

/// An [`L2Reader`] backed by a live L2 execution client's plain JSON-RPC.
#[derive(Debug)]
pub struct AlloyL2Reader {
    inner: ReqwestProvider,
}

impl AlloyL2Reader {
    /// Builds a reader around an existing `inner` provider.
    pub fn new(inner: ReqwestProvider) -> Self {
        Self { inner }
    }

    /// Builds a reader against `url`.
    pub fn new_http(url: reqwest::Url) -> Self {
        Self::new(ReqwestProvider::new_http(url))
    }
}

/// Reconstructs just enough of an [`L2Block`] for the Startup Anchor: its
/// number, hash, parent hash, timestamp, and attributes tx. Transfer/create
/// deposit transactions beyond the first are never read back, since the
/// anchor only ever inspects `ethscription_txs.first()` and
/// `is_epoch_start()` (spec §4.J).
fn l2_block_from_rpc(block: alloy_rpc_types::Block, number: u64) -> Result<L2Block, ProviderError> {
    let BlockTransactions::Full(txs) = block.transactions else {
        return Err(ProviderError::NotHydrated(number));
    };
    let attributes_data = txs
        .first()
        .map(|tx| ByteString::from(tx.input.to_vec()))
        .ok_or_else(|| ProviderError::NotHydrated(number))?;

    let attrs = decode_calldata(attributes_data.as_slice()).unwrap_or_default();

    let header = block.header;
    Ok(L2Block {
        number: header.number,
        block_hash: header.hash,
        parent_hash: header.parent_hash,
        timestamp: header.timestamp,
        prev_randao: header.mix_hash.unwrap_or_default(),
        parent_beacon_block_root: header.parent_beacon_block_root,
        sequence_number: attrs.sequence_number as u32,
        l1_attributes: attrs,
        ethscription_txs: vec![L2DepositTx {
            source_hash: Hash32::ZERO,
            from: Default::default(),
            to: None,
            mint: Default::default(),
            value: Default::default(),
            gas_limit: 0,
            is_system_tx: true,
            data: attributes_data,
        }],
    })
}

#[async_trait]
impl L2Reader for AlloyL2Reader {
    type Error = ProviderError;

    async fn block(&self, number: u64) -> Result<Option<L2Block>, Self::Error> {
        let Some(raw) = self
            .inner
            .get_block(number.into(), true)
            .await
            .map_err(|source| ProviderError::Transport { method: "eth_getBlockByNumber", block: number, source })?
        else {
            return Ok(None);
        };
        l2_block_from_rpc(raw, number).map(Some)
    }

    async fn tip_number(&self) -> Result<u64, Self::Error> {
        self.inner
            .get_block_number()
            .await
            .map_err(|source| ProviderError::Transport { method: "eth_blockNumber", block: 0, source })
    }
}
