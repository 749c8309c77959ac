//! Per-transaction ESIP rule table (spec §4.C, §9 "data-driven over a table
//! of (predicate, handler)").
//!
//! Evaluation is a two-stage chain rather than flat independent predicates,
//! because the rules have a genuine priority order the spec states
//! explicitly: at most one *primary* result comes from input calldata or a
//! `CreateEthscription` event (rules 1/3/4/5), and event-based transfers
//! (rules 6/7) layer on top only when no *input* op pre-empted them (I3).

use alloy_primitives::{Address, U256};
use ethscript_primitives::{Address20, ByteString, EthscriptionOp, Hash32, L1Tx, Log, OpSource};

use super::config::EsipConfig;
use super::data_uri;
use super::gzip;
use super::topics;

/// Extracts the ethscription operations for one L1 transaction, given its
/// logs in ascending `log_index` order. `removed` logs must already have
/// been filtered out by the caller (or are filtered here defensively).
pub fn extract_from_tx(tx: &L1Tx, logs: &[Log], esips: &EsipConfig, l1_block_number: u64) -> Vec<EthscriptionOp> {
    let logs: Vec<&Log> = logs.iter().filter(|l| !l.removed).collect();

    if let Some(create) = try_input_create(tx, esips, l1_block_number) {
        // I2 + I3: an input create discards every event-based operation in
        // this transaction, not only competing creates.
        return vec![create];
    }

    if esips.esip5_enabled(l1_block_number) {
        if let Some(op) = try_multi_transfer_input(tx) {
            return vec![op];
        }
    }

    if let Some(op) = try_single_transfer_input(tx) {
        return vec![op];
    }

    // No input-based op fired: event-create and event-transfers both apply.
    let mut ops: Vec<(u32, EthscriptionOp)> = Vec::new();

    if esips.esip3_enabled(l1_block_number) {
        if let Some((log_index, create)) = try_event_create(tx, &logs) {
            ops.push((log_index, create));
        }
    }

    if esips.esip1_enabled(l1_block_number) {
        ops.extend(collect_esip1_transfers(tx, &logs).into_iter());
    }

    if esips.esip2_enabled(l1_block_number) {
        ops.extend(collect_esip2_transfers(tx, &logs).into_iter());
    }

    ops.sort_by_key(|(log_index, _)| *log_index);
    ops.into_iter().map(|(_, op)| op).collect()
}

/// Rules 1 and 2: input interpreted as a `data:` URI, optionally after
/// ESIP-7 gzip decompression.
fn try_input_create(tx: &L1Tx, esips: &EsipConfig, l1_block_number: u64) -> Option<EthscriptionOp> {
    let to = tx.to?;
    let raw = tx.input.as_slice();

    let (content_uri, parsed) = if let Some(parsed) = data_uri::parse(raw) {
        (raw.to_vec(), parsed)
    } else if esips.esip7_enabled(l1_block_number) {
        let decompressed = gzip::decompress(raw)?;
        let parsed = data_uri::parse(&decompressed)?;
        (decompressed, parsed)
    } else {
        return None;
    };

    Some(EthscriptionOp::Create {
        l1_tx_hash: tx.hash,
        creator: tx.from,
        initial_owner: to,
        content_uri: ByteString::from(content_uri),
        source: OpSource::Input,
        esip6: parsed.esip6,
    })
}

/// Rule 3: ESIP-5 multi-transfer by input.
fn try_multi_transfer_input(tx: &L1Tx) -> Option<EthscriptionOp> {
    let to = tx.to?;
    let input = tx.input.as_slice();
    if input.len() < 64 || input.len() % 32 != 0 {
        return None;
    }
    let ids = input.chunks_exact(32).map(Hash32::from_slice).collect();
    Some(EthscriptionOp::TransferMulti { l1_tx_hash: tx.hash, from: tx.from, to, ethscription_ids: ids })
}

/// Rule 4: single-transfer by input.
fn try_single_transfer_input(tx: &L1Tx) -> Option<EthscriptionOp> {
    let to = tx.to?;
    let input = tx.input.as_slice();
    if input.len() != 32 {
        return None;
    }
    Some(EthscriptionOp::TransferSingle {
        l1_tx_hash: tx.hash,
        from: tx.from,
        to,
        ethscription_id: Hash32::from_slice(input),
        source: OpSource::Input,
        required_previous_owner: None,
    })
}

/// Rule 5: ESIP-3 event create. Only the first qualifying log (ascending
/// `log_index`) is taken; later `CreateEthscription` logs in the same
/// transaction are ignored (P3).
fn try_event_create(tx: &L1Tx, logs: &[&Log]) -> Option<(u32, EthscriptionOp)> {
    let topic = topics::create_ethscription_topic();
    for log in logs {
        if log.topics.len() != 2 || log.topics[0] != topic {
            continue;
        }
        let creator = log.address;
        if creator == Address20::ZERO {
            continue;
        }
        let initial_owner = decode_address(log.topics[1]);
        let Some(content_uri) = abi_decode_string(log.data.as_slice()) else {
            continue;
        };
        let Some(parsed) = data_uri::parse(&content_uri) else {
            continue;
        };
        return Some((
            log.log_index,
            EthscriptionOp::Create {
                l1_tx_hash: tx.hash,
                creator,
                initial_owner,
                content_uri: ByteString::from(content_uri),
                source: OpSource::Event,
                esip6: parsed.esip6,
            },
        ));
    }
    None
}

/// Rule 6: ESIP-1 event transfer. Every qualifying log produces a transfer
/// (DESIGN.md's resolution of spec.md §9's open question), not only the
/// first.
fn collect_esip1_transfers(tx: &L1Tx, logs: &[&Log]) -> Vec<(u32, EthscriptionOp)> {
    let topic = topics::esip1_transfer_topic();
    logs.iter()
        .filter(|log| log.topics.len() == 3 && log.topics[0] == topic)
        .map(|log| {
            (
                log.log_index,
                EthscriptionOp::TransferSingle {
                    l1_tx_hash: tx.hash,
                    from: log.address,
                    to: decode_address(log.topics[1]),
                    ethscription_id: log.topics[2],
                    source: OpSource::Event,
                    required_previous_owner: None,
                },
            )
        })
        .collect()
}

/// Rule 7: ESIP-2 event transfer conditioned on a previous owner.
fn collect_esip2_transfers(tx: &L1Tx, logs: &[&Log]) -> Vec<(u32, EthscriptionOp)> {
    let topic = topics::esip2_transfer_topic();
    logs.iter()
        .filter(|log| log.topics.len() == 4 && log.topics[0] == topic)
        .map(|log| {
            (
                log.log_index,
                EthscriptionOp::TransferSingle {
                    l1_tx_hash: tx.hash,
                    from: log.address,
                    to: decode_address(log.topics[2]),
                    ethscription_id: log.topics[3],
                    source: OpSource::Event,
                    required_previous_owner: Some(decode_address(log.topics[1])),
                },
            )
        })
        .collect()
}

fn decode_address(topic: Hash32) -> Address20 {
    Address::from_slice(&topic.as_slice()[12..32])
}

/// Minimal ABI decoding of a single dynamic `string` parameter: a 32-byte
/// offset, a 32-byte length, then the (right-padded) bytes.
fn abi_decode_string(data: &[u8]) -> Option<Vec<u8>> {
    if data.len() < 64 {
        return None;
    }
    let offset: usize = U256::from_be_slice(&data[0..32]).try_into().ok()?;
    let length_start = offset.checked_add(32)?;
    if length_start > data.len() {
        return None;
    }
    let length: usize = U256::from_be_slice(&data[offset..length_start]).try_into().ok()?;
    let payload_start = length_start;
    let payload_end = payload_start.checked_add(length)?;
    if payload_end > data.len() {
        return None;
    }
    Some(data[payload_start..payload_end].to_vec())
}
