//! Translates the Attributes Transaction Builder's output and each
//! [`EthscriptionOp`] into the [`L2DepositTx`] list a candidate L2 block
//! carries (spec §4.D, §5 "Ordering guarantees": `[attributes_tx] ++
//! ops_in_extractor_order`).

use alloy_primitives::{Address, Bytes, U256};
use alloy_rlp::{Encodable, Header};
use ethscript_derive::attributes::encode_calldata;
use ethscript_primitives::{ByteString, DepositSourceDomain, EthscriptionOp, L1Attributes, L2DepositTx};

/// EIP-2718 transaction type byte for a deposit transaction, following the
/// OP-Stack convention this protocol's deposit list reuses (spec §3
/// "Supplemental: L2DepositTx").
const DEPOSIT_TX_TYPE: u8 = 0x7E;

/// Gas limit budgeted for the attributes deposit. Generous relative to the
/// fixed 164-byte calldata it carries; the predeploy's decode path is O(1).
const ATTRIBUTES_GAS_LIMIT: u64 = 150_000;

/// Gas limit budgeted for a single ethscription deposit. The L2 contract
/// layer (out of this core's scope) may revert cheaply on duplicate content
/// or invalid transfers; this only needs to cover the deposit's own
/// execution, not a worst-case on-chain handler.
const ETHSCRIPTION_OP_GAS_LIMIT: u64 = 1_000_000;

/// Builds the mandatory attributes transaction for an L2 block, always the
/// first transaction (spec §4.D: "This is always the first transaction of
/// every L2 block, including filler blocks.").
pub fn attributes_transaction(
    attrs: &L1Attributes,
    depositor: Address,
    recipient: Address,
) -> L2DepositTx {
    L2DepositTx {
        source_hash: DepositSourceDomain::attributes_source_hash(attrs.hash, attrs.sequence_number),
        from: depositor,
        to: Some(recipient),
        mint: U256::ZERO,
        value: U256::ZERO,
        gas_limit: ATTRIBUTES_GAS_LIMIT,
        is_system_tx: true,
        data: encode_calldata(attrs),
    }
}

/// Translates one [`EthscriptionOp`] into a deposit transaction. `op_index`
/// is the op's position within the L1 block's ordered operation list (spec
/// invariant I4), reused to domain-separate the `source_hash`.
pub fn op_to_deposit(op: &EthscriptionOp, op_index: u32) -> L2DepositTx {
    let l1_tx_hash = op.l1_tx_hash();
    L2DepositTx {
        source_hash: DepositSourceDomain::op_source_hash(l1_tx_hash, op_index),
        from: deposit_from(op),
        to: None,
        mint: U256::ZERO,
        value: U256::ZERO,
        gas_limit: ETHSCRIPTION_OP_GAS_LIMIT,
        is_system_tx: false,
        data: encode_op_calldata(op),
    }
}

/// Builds the full, ordered deposit list for one L2 block: the attributes
/// transaction followed by the translated ops, in extractor order.
pub fn build_deposit_list(
    attrs: &L1Attributes,
    depositor: Address,
    recipient: Address,
    ops: &[EthscriptionOp],
) -> Vec<L2DepositTx> {
    let mut txs = Vec::with_capacity(ops.len() + 1);
    txs.push(attributes_transaction(attrs, depositor, recipient));
    txs.extend(ops.iter().enumerate().map(|(index, op)| op_to_deposit(op, index as u32)));
    txs
}

/// RLP-encodes `tx` as a typed deposit transaction: the `0x7E` type byte
/// followed by an RLP list of its fields, in the order `source_hash`,
/// `from`, `to`, `mint`, `value`, `gas_limit`, `is_system_tx`, `data` (no
/// signature: deposits are not signed). The execution client decodes this
/// the same way it decodes any EIP-2718 typed transaction it receives via
/// `engine_forkchoiceUpdated`'s payload attributes.
pub fn encode_deposit_tx(tx: &L2DepositTx) -> Bytes {
    let to = tx.to.unwrap_or_default();
    let fields_len = tx.source_hash.length()
        + tx.from.length()
        + to.length()
        + tx.mint.length()
        + tx.value.length()
        + tx.gas_limit.length()
        + tx.is_system_tx.length()
        + tx.data.0.length();

    let mut out = Vec::with_capacity(1 + fields_len + 8);
    out.push(DEPOSIT_TX_TYPE);
    Header { list: true, payload_length: fields_len }.encode(&mut out);
    tx.source_hash.encode(&mut out);
    tx.from.encode(&mut out);
    to.encode(&mut out);
    tx.mint.encode(&mut out);
    tx.value.encode(&mut out);
    tx.gas_limit.encode(&mut out);
    tx.is_system_tx.encode(&mut out);
    tx.data.0.encode(&mut out);
    Bytes::from(out)
}

/// RLP-encodes every transaction in `txs`, in order, for the Engine API's
/// `transactions` payload attribute field.
pub fn encode_deposit_list(txs: &[L2DepositTx]) -> Vec<Bytes> {
    txs.iter().map(encode_deposit_tx).collect()
}

fn deposit_from(op: &EthscriptionOp) -> Address {
    match op {
        EthscriptionOp::Create { creator, .. } => *creator,
        EthscriptionOp::TransferSingle { from, .. } => *from,
        EthscriptionOp::TransferMulti { from, .. } => *from,
    }
}

/// A simple tag-prefixed encoding of the operation for the L2 contract
/// layer. This core does not mandate the contract-facing ABI (out of scope,
/// §1); it only needs a stable, lossless encoding of the values the
/// extractor produced.
fn encode_op_calldata(op: &EthscriptionOp) -> ByteString {
    let mut buf = Vec::new();
    match op {
        EthscriptionOp::Create { initial_owner, content_uri, esip6, .. } => {
            buf.push(0u8);
            buf.extend_from_slice(initial_owner.as_slice());
            buf.push(u8::from(*esip6));
            buf.extend_from_slice(content_uri.as_slice());
        }
        EthscriptionOp::TransferSingle { to, ethscription_id, required_previous_owner, .. } => {
            buf.push(1u8);
            buf.extend_from_slice(to.as_slice());
            buf.extend_from_slice(ethscription_id.as_slice());
            buf.push(u8::from(required_previous_owner.is_some()));
            if let Some(owner) = required_previous_owner {
                buf.extend_from_slice(owner.as_slice());
            }
        }
        EthscriptionOp::TransferMulti { to, ethscription_ids, .. } => {
            buf.push(2u8);
            buf.extend_from_slice(to.as_slice());
            buf.extend_from_slice(&(ethscription_ids.len() as u32).to_be_bytes());
            for id in ethscription_ids {
                buf.extend_from_slice(id.as_slice());
            }
        }
    }
    ByteString::from(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethscript_primitives::{Hash32, OpSource};

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    #[test]
    fn attributes_tx_is_a_system_tx_with_no_recipient_call_value() {
        let attrs = L1Attributes { number: 100, hash: Hash32::repeat_byte(1), ..Default::default() };
        let tx = attributes_transaction(&attrs, addr(0xAA), addr(0xBB));
        assert!(tx.is_system_tx);
        assert_eq!(tx.value, U256::ZERO);
        assert_eq!(tx.to, Some(addr(0xBB)));
    }

    #[test]
    fn deposit_list_puts_attributes_tx_first_and_preserves_op_order() {
        let attrs = L1Attributes { number: 100, hash: Hash32::repeat_byte(1), ..Default::default() };
        let create = EthscriptionOp::Create {
            l1_tx_hash: Hash32::repeat_byte(2),
            creator: addr(1),
            initial_owner: addr(2),
            content_uri: ByteString::from(b"data:,a".to_vec()),
            source: OpSource::Input,
            esip6: false,
        };
        let transfer = EthscriptionOp::TransferSingle {
            l1_tx_hash: Hash32::repeat_byte(3),
            from: addr(2),
            to: addr(3),
            ethscription_id: Hash32::repeat_byte(9),
            source: OpSource::Input,
            required_previous_owner: None,
        };
        let txs = build_deposit_list(&attrs, addr(0xAA), addr(0xBB), &[create, transfer]);
        assert_eq!(txs.len(), 3);
        assert!(txs[0].is_system_tx);
        assert_eq!(txs[1].from, addr(1));
        assert_eq!(txs[2].from, addr(2));
    }

    #[test]
    fn encoded_deposit_tx_starts_with_the_eip2718_deposit_type_byte() {
        let attrs = L1Attributes { number: 100, hash: Hash32::repeat_byte(1), ..Default::default() };
        let tx = attributes_transaction(&attrs, addr(0xAA), addr(0xBB));
        let encoded = encode_deposit_tx(&tx);
        assert_eq!(encoded[0], DEPOSIT_TX_TYPE);
        assert!(encoded.len() > 1);
    }

    #[test]
    fn op_source_hashes_never_collide_across_ops_in_the_same_tx() {
        let l1_tx_hash = Hash32::repeat_byte(7);
        let op_a = EthscriptionOp::TransferSingle {
            l1_tx_hash,
            from: addr(1),
            to: addr(2),
            ethscription_id: Hash32::repeat_byte(1),
            source: OpSource::Event,
            required_previous_owner: None,
        };
        let op_b = EthscriptionOp::TransferSingle {
            l1_tx_hash,
            from: addr(1),
            to: addr(2),
            ethscription_id: Hash32::repeat_byte(2),
            source: OpSource::Event,
            required_previous_owner: None,
        };
        let tx_a = op_to_deposit(&op_a, 0);
        let tx_b = op_to_deposit(&op_b, 1);
        assert_ne!(tx_a.source_hash, tx_b.source_hash);
    }
}
