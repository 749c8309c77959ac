//! L2 block, L1-attributes, and deposit-transaction types.

use crate::hash::{Address20, ByteString, Hash32};
use alloy_primitives::{keccak256, U256};
use serde::{Deserialize, Serialize};

/// The L1 metadata seeded into every L2 block via the attributes deposit
/// transaction (spec §4.D). One-to-one with the packed calldata layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct L1Attributes {
    /// The L1 origin block number.
    pub number: u64,
    /// The L1 origin block hash.
    pub hash: Hash32,
    /// The L1 origin block timestamp.
    pub timestamp: u64,
    /// The L1 origin block's base fee.
    pub base_fee: U256,
    /// The L1 origin block's blob base fee (1 pre-Cancun/no blobs observed).
    pub blob_base_fee: U256,
    /// Scalar applied to the blob base fee by the L2 fee vault.
    pub blob_base_fee_scalar: u32,
    /// Scalar applied to the base fee by the L2 fee vault.
    pub base_fee_scalar: u32,
    /// Position of this L2 block within its L1 epoch; `0` marks the first
    /// block of a new epoch.
    pub sequence_number: u64,
    /// The batcher/depositor identity, left-padded to 32 bytes.
    pub batcher_hash: Hash32,
}

/// Source domains for deposit transactions, mirroring the OP-Stack
/// convention of domain-separating the `source_hash` preimage so a deposit
/// can never collide across kinds (spec §3 "Supplemental: L2DepositTx").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DepositSourceDomain {
    /// The per-block L1-attributes deposit.
    L1Attributes = 0,
    /// A deposit translated from an [`crate::ops::EthscriptionOp`].
    EthscriptionOp = 1,
}

impl DepositSourceDomain {
    /// Computes the deterministic `source_hash` for an attributes deposit.
    pub fn attributes_source_hash(l1_block_hash: Hash32, sequence_number: u64) -> Hash32 {
        let mut deposit_id = [0u8; 64];
        deposit_id[..32].copy_from_slice(l1_block_hash.as_slice());
        deposit_id[56..].copy_from_slice(&sequence_number.to_be_bytes());
        let deposit_id_hash = keccak256(deposit_id);

        let mut domain_input = [0u8; 64];
        domain_input[31] = Self::L1Attributes as u8;
        domain_input[32..].copy_from_slice(deposit_id_hash.as_slice());
        keccak256(domain_input)
    }

    /// Computes the deterministic `source_hash` for a deposit translated
    /// from an ethscription operation, keyed by the L1 transaction hash and
    /// the operation's position within the block (spec invariant I4's
    /// ordering, reused as the uniqueness key).
    pub fn op_source_hash(l1_tx_hash: Hash32, op_index: u32) -> Hash32 {
        let mut deposit_id = [0u8; 64];
        deposit_id[..32].copy_from_slice(l1_tx_hash.as_slice());
        deposit_id[60..].copy_from_slice(&op_index.to_be_bytes());
        let deposit_id_hash = keccak256(deposit_id);

        let mut domain_input = [0u8; 64];
        domain_input[31] = Self::EthscriptionOp as u8;
        domain_input[32..].copy_from_slice(deposit_id_hash.as_slice());
        keccak256(domain_input)
    }
}

/// One L2 deposit transaction: either the attributes transaction or the
/// translation of a single [`crate::ops::EthscriptionOp`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct L2DepositTx {
    /// Deterministic, domain-separated identifier (see
    /// [`DepositSourceDomain`]).
    pub source_hash: Hash32,
    /// The depositor. A fixed system address for the attributes tx, the
    /// ethscription's `creator`/`from` otherwise.
    pub from: Address20,
    /// The recipient. The predeployed L1-attributes contract for the
    /// attributes tx, `None` for ethscription deposits (no on-chain call
    /// target is mandated by this core; the L2 contract layer decides).
    pub to: Option<Address20>,
    /// Minted L2 value. Always zero in this protocol (no bridged ETH).
    pub mint: U256,
    /// Wei value attached to the deposit call.
    pub value: U256,
    /// Gas limit for the deposit.
    pub gas_limit: u64,
    /// System transactions are exempt from the L2 block gas limit.
    pub is_system_tx: bool,
    /// Calldata: the packed attributes payload, or an ABI-style encoding of
    /// the ethscription operation for the L2 contract layer to interpret.
    pub data: ByteString,
}

/// An L2 block, either carrying real ethscription deposits or a filler with
/// only the attributes transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct L2Block {
    /// The L2 block number.
    pub number: u64,
    /// The L2 block hash, populated once the engine returns a payload.
    pub block_hash: Hash32,
    /// The parent L2 block's hash.
    pub parent_hash: Hash32,
    /// The L2 block's timestamp.
    pub timestamp: u64,
    /// Sourced from the L1 origin's `mix_hash`.
    pub prev_randao: Hash32,
    /// Present from Cancun onward, forwarded from the L1 origin.
    pub parent_beacon_block_root: Option<Hash32>,
    /// The L1 attributes this block was built on top of.
    pub l1_attributes: L1Attributes,
    /// Position within the L1 epoch; resets to 0 at the epoch's first block.
    pub sequence_number: u32,
    /// `[attributes_tx] ++ ops_in_extractor_order`, or just `[attributes_tx]`
    /// for a filler block.
    pub ethscription_txs: Vec<L2DepositTx>,
}

impl L2Block {
    /// The L1 block number this L2 block's epoch is anchored to.
    pub const fn eth_block_number(&self) -> u64 {
        self.l1_attributes.number
    }

    /// `true` if this is the first L2 block of its L1 epoch.
    pub const fn is_epoch_start(&self) -> bool {
        self.sequence_number == 0
    }

    /// `true` if this block carries only the attributes transaction.
    pub fn is_filler(&self) -> bool {
        self.ethscription_txs.len() <= 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_hash_domains_never_collide() {
        let l1_hash = Hash32::repeat_byte(0xAB);
        let attrs_hash = DepositSourceDomain::attributes_source_hash(l1_hash, 0);
        let op_hash = DepositSourceDomain::op_source_hash(l1_hash, 0);
        assert_ne!(attrs_hash, op_hash);
    }

    #[test]
    fn source_hash_is_deterministic() {
        let l1_hash = Hash32::repeat_byte(0x01);
        let a = DepositSourceDomain::op_source_hash(l1_hash, 3);
        let b = DepositSourceDomain::op_source_hash(l1_hash, 3);
        assert_eq!(a, b);
    }

    #[test]
    fn source_hash_varies_with_index() {
        let l1_hash = Hash32::repeat_byte(0x01);
        let a = DepositSourceDomain::op_source_hash(l1_hash, 3);
        let b = DepositSourceDomain::op_source_hash(l1_hash, 4);
        assert_ne!(a, b);
    }
}
