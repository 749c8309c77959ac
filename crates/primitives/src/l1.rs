//! L1 block, transaction, receipt and log shapes consumed by the extractor.

use crate::hash::{Address20, ByteString, Hash32};
use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

/// A single L1 event log.
///
/// `removed` logs (from a chain reorg the RPC node has already observed and
/// rolled back) are surfaced so the extractor can assert invariant I5 rather
/// than silently filtering them in the RPC layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    /// The contract that emitted the log.
    pub address: Address20,
    /// Indexed topics, 1 to 4 entries. `topics[0]` is the event signature hash.
    pub topics: Vec<Hash32>,
    /// Non-indexed event data.
    pub data: ByteString,
    /// Position of this log within its block.
    pub log_index: u32,
    /// Set when the originating node has since rolled back the log.
    pub removed: bool,
}

/// The receipt paired with an [`L1Tx`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// `false` means the transaction reverted; failed transactions
    /// contribute no ethscription operations (spec P5).
    pub status: bool,
    /// Logs emitted by the transaction, in ascending `log_index` order.
    pub logs: Vec<Log>,
}

/// A single L1 transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct L1Tx {
    /// The transaction hash.
    pub hash: Hash32,
    /// Position of this transaction within its block.
    pub index: u32,
    /// The sender.
    pub from: Address20,
    /// The recipient, or `None` for a contract-creation transaction.
    pub to: Option<Address20>,
    /// Raw calldata.
    pub input: ByteString,
    /// Wei value transferred.
    pub value: U256,
}

/// A canonical L1 block, paired with its full transaction list.
///
/// Immutable after construction: every field is set once, by the L1 RPC
/// client, and never mutated in place. Reorg handling replaces cache entries
/// wholesale rather than patching them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct L1Block {
    /// The block number.
    pub number: u64,
    /// The block hash.
    pub hash: Hash32,
    /// The parent block's hash. Used for reorg detection (spec §4.I step 3).
    pub parent_hash: Hash32,
    /// Unix timestamp, in seconds.
    pub timestamp: u64,
    /// EIP-1559 base fee.
    pub base_fee_per_gas: U256,
    /// `prevRandao` / mix hash, used as the L2 block's `prev_randao`.
    pub mix_hash: Hash32,
    /// Present from the Cancun fork onward.
    pub parent_beacon_block_root: Option<Hash32>,
    /// Full transaction list, in ascending `index` order.
    pub transactions: Vec<L1Tx>,
}

impl L1Block {
    /// Returns the transaction at `index`, if present.
    pub fn transaction(&self, index: u32) -> Option<&L1Tx> {
        self.transactions.get(index as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    fn sample_block() -> L1Block {
        L1Block {
            number: 100,
            hash: Hash32::repeat_byte(0x11),
            parent_hash: Hash32::ZERO,
            timestamp: 1_700_000_000,
            base_fee_per_gas: U256::from(10u64),
            mix_hash: Hash32::ZERO,
            parent_beacon_block_root: None,
            transactions: vec![L1Tx {
                hash: Hash32::ZERO,
                index: 0,
                from: address!("0000000000000000000000000000000000000001"),
                to: None,
                input: ByteString::from(vec![]),
                value: U256::ZERO,
            }],
        }
    }

    #[test]
    fn transaction_lookup_by_index() {
        let block = sample_block();
        assert!(block.transaction(0).is_some());
        assert!(block.transaction(1).is_none());
    }
}
