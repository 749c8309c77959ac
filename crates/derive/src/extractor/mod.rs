//! The Ethscription Extractor (spec §4.C): a pure function from one L1
//! block plus its per-transaction receipts to the ordered list of
//! ethscription operations it contains.

pub mod config;
pub use config::EsipConfig;

mod data_uri;
mod gzip;
mod rules;
mod topics;

use std::collections::HashMap;

use ethscript_primitives::{EthscriptionOp, Hash32, L1Block, Receipt};

/// Extracts every ethscription operation from `block`, in `(l1_tx_index,
/// log_index)` order (I4). Pure: no I/O, no clock, no randomness (P1).
pub fn extract(
    block: &L1Block,
    receipts_by_tx: &HashMap<Hash32, Receipt>,
    esips: &EsipConfig,
) -> Vec<EthscriptionOp> {
    let mut ops = Vec::new();
    for tx in &block.transactions {
        let Some(receipt) = receipts_by_tx.get(&tx.hash) else {
            continue;
        };
        if !receipt.status {
            continue;
        }
        ops.extend(rules::extract_from_tx(tx, &receipt.logs, esips, block.number));
    }
    ops
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethscript_primitives::{Address20, ByteString, L1Tx, Log, OpSource};
    use std::collections::HashMap;

    fn addr(byte: u8) -> Address20 {
        Address20::repeat_byte(byte)
    }

    fn tx(hash: Hash32, index: u32, from: Address20, to: Option<Address20>, input: &[u8]) -> L1Tx {
        L1Tx { hash, index, from, to, input: ByteString::from(input.to_vec()), value: Default::default() }
    }

    fn block_with(txs: Vec<L1Tx>) -> L1Block {
        L1Block {
            number: 100,
            hash: Hash32::repeat_byte(0x01),
            parent_hash: Hash32::ZERO,
            timestamp: 0,
            base_fee_per_gas: Default::default(),
            mix_hash: Hash32::ZERO,
            parent_beacon_block_root: None,
            transactions: txs,
        }
    }

    fn receipt(status: bool, logs: Vec<Log>) -> Receipt {
        Receipt { status, logs }
    }

    #[test]
    fn scenario_1_plain_text_create() {
        let hash = Hash32::repeat_byte(0x01);
        let transaction = tx(hash, 0, addr(0xAA), Some(addr(0x11)), b"data:text/plain;charset=utf-8,Hello");
        let block = block_with(vec![transaction]);
        let mut receipts = HashMap::new();
        receipts.insert(hash, receipt(true, vec![]));

        let ops = extract(&block, &receipts, &EsipConfig::all_enabled_from_genesis());
        assert_eq!(ops.len(), 1);
        match &ops[0] {
            EthscriptionOp::Create { creator, initial_owner, content_uri, esip6, source, .. } => {
                assert_eq!(*creator, addr(0xAA));
                assert_eq!(*initial_owner, addr(0x11));
                assert_eq!(content_uri.to_string(), "0x646174613a746578742f706c61696e3b636861727365743d7574662d382c48656c6c6f");
                assert!(!esip6);
                assert_eq!(*source, OpSource::Input);
            }
            other => panic!("expected Create, got {other:?}"),
        }
    }

    #[test]
    fn scenario_2_gzip_create_content_uri_is_decompressed() {
        use flate2::{write::GzEncoder, Compression};
        use std::io::Write;

        let hash = Hash32::repeat_byte(0x0A);
        let uri = b"data:text/plain,Hello from gzip";
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(uri).unwrap();
        let compressed = encoder.finish().unwrap();

        let transaction = tx(hash, 0, addr(0xAA), Some(addr(0x11)), &compressed);
        let block = block_with(vec![transaction]);
        let mut receipts = HashMap::new();
        receipts.insert(hash, receipt(true, vec![]));

        let ops = extract(&block, &receipts, &EsipConfig::all_enabled_from_genesis());
        assert_eq!(ops.len(), 1);
        match &ops[0] {
            EthscriptionOp::Create { content_uri, .. } => {
                assert_eq!(content_uri.as_slice(), uri);
            }
            other => panic!("expected Create, got {other:?}"),
        }
    }

    #[test]
    fn scenario_3_multi_transfer_of_three_ids() {
        let hash = Hash32::repeat_byte(0x02);
        let ids = [Hash32::repeat_byte(0x01), Hash32::repeat_byte(0x02), Hash32::repeat_byte(0x03)];
        let mut input = Vec::new();
        for id in &ids {
            input.extend_from_slice(id.as_slice());
        }
        let transaction = tx(hash, 0, addr(0xAA), Some(addr(0x11)), &input);
        let block = block_with(vec![transaction]);
        let mut receipts = HashMap::new();
        receipts.insert(hash, receipt(true, vec![]));

        let ops = extract(&block, &receipts, &EsipConfig::all_enabled_from_genesis());
        assert_eq!(ops.len(), 1);
        match &ops[0] {
            EthscriptionOp::TransferMulti { ethscription_ids, .. } => {
                assert_eq!(ethscription_ids, &ids);
            }
            other => panic!("expected TransferMulti, got {other:?}"),
        }
    }

    #[test]
    fn scenario_4_event_transfer_after_input_create_is_suppressed() {
        let hash = Hash32::repeat_byte(0x03);
        let transaction = tx(hash, 0, addr(0xAA), Some(addr(0x11)), b"data:text/plain,Hi");
        let transfer_log = Log {
            address: addr(0x11),
            topics: vec![
                topics::esip1_transfer_topic(),
                Hash32::left_padding_from(addr(0x22).as_slice()),
                Hash32::repeat_byte(0x09),
            ],
            data: ByteString::from(vec![]),
            log_index: 0,
            removed: false,
        };
        let block = block_with(vec![transaction]);
        let mut receipts = HashMap::new();
        receipts.insert(hash, receipt(true, vec![transfer_log]));

        let ops = extract(&block, &receipts, &EsipConfig::all_enabled_from_genesis());
        assert_eq!(ops.len(), 1);
        assert!(ops[0].is_create());
    }

    #[test]
    fn p4_removed_logs_are_ignored() {
        let hash = Hash32::repeat_byte(0x04);
        let transaction = tx(hash, 0, addr(0xAA), Some(addr(0x11)), b"");
        let removed_log = Log {
            address: addr(0x11),
            topics: vec![
                topics::esip1_transfer_topic(),
                Hash32::left_padding_from(addr(0x22).as_slice()),
                Hash32::repeat_byte(0x09),
            ],
            data: ByteString::from(vec![]),
            log_index: 0,
            removed: true,
        };
        let block = block_with(vec![transaction]);
        let mut receipts = HashMap::new();
        receipts.insert(hash, receipt(true, vec![removed_log]));

        let ops = extract(&block, &receipts, &EsipConfig::all_enabled_from_genesis());
        assert!(ops.is_empty());
    }

    #[test]
    fn p5_failed_transaction_contributes_nothing() {
        let hash = Hash32::repeat_byte(0x05);
        let transaction = tx(hash, 0, addr(0xAA), Some(addr(0x11)), b"data:text/plain,Hi");
        let block = block_with(vec![transaction]);
        let mut receipts = HashMap::new();
        receipts.insert(hash, receipt(false, vec![]));

        let ops = extract(&block, &receipts, &EsipConfig::all_enabled_from_genesis());
        assert!(ops.is_empty());
    }

    #[test]
    fn p7_esip_gating_disables_multi_transfer() {
        let hash = Hash32::repeat_byte(0x06);
        let ids = [Hash32::repeat_byte(0x01), Hash32::repeat_byte(0x02)];
        let mut input = Vec::new();
        for id in &ids {
            input.extend_from_slice(id.as_slice());
        }
        let transaction = tx(hash, 0, addr(0xAA), Some(addr(0x11)), &input);
        let block = block_with(vec![transaction]);
        let mut receipts = HashMap::new();
        receipts.insert(hash, receipt(true, vec![]));

        let mut esips = EsipConfig::all_enabled_from_genesis();
        esips.esip5_enabled_at = u64::MAX;
        let ops = extract(&block, &receipts, &esips);
        // ESIP-5 disabled and input is not exactly 32 bytes, so nothing fires.
        assert!(ops.is_empty());
    }

    #[test]
    fn p1_determinism() {
        let hash = Hash32::repeat_byte(0x07);
        let transaction = tx(hash, 0, addr(0xAA), Some(addr(0x11)), b"data:text/plain,Hi");
        let block = block_with(vec![transaction]);
        let mut receipts = HashMap::new();
        receipts.insert(hash, receipt(true, vec![]));
        let esips = EsipConfig::all_enabled_from_genesis();

        let first = extract(&block, &receipts, &esips);
        let second = extract(&block, &receipts, &esips);
        assert_eq!(first, second);
    }
}
