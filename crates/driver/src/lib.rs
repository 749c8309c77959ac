//! The Importer Loop and its supporting machinery (spec §4.E-§4.J):
//! reorg detection, epoch/head tracking, prefetching, filler insertion, L2
//! block proposal, and startup re-anchoring.
//!
//! Everything here is orchestration around the pure derivation core in
//! `ethscript-derive`: this crate is where I/O, retries, caching, and the
//! engine handshake live (spec §4, "Driver" column of the component table).

mod errors;
pub use errors::{DriverResult, ImporterError};

mod config;
pub use config::{
    l1_attributes_for, DriverConfig, ANCHOR_EPOCH_CACHE_DEPTH, ANCHOR_SEARCH_LIMIT,
    BLOCK_INTERVAL_SECS, CACHE_RETENTION_DEPTH, DEFAULT_BATCH_SIZE, DEFAULT_FINALIZED_OFFSET,
    DEFAULT_SAFE_OFFSET, MAX_FILLER_BLOCKS,
};

mod cache;
pub use cache::DerivationCache;

mod l1_provider;
pub use l1_provider::L1Provider;

mod engine_api;
pub use engine_api::{EngineApi, ForkchoiceState};

mod heads;
pub use heads::ChainHeads;

mod deposit;
pub use deposit::{attributes_transaction, build_deposit_list, encode_deposit_list, encode_deposit_tx, op_to_deposit};

mod filler;
pub use filler::filler_timestamps;

mod prefetcher;
pub use prefetcher::{FetchResult, Prefetcher};

mod proposer;
pub use proposer::{propose_block, ProposerContext};

mod anchor;
pub use anchor::{anchor, L2Reader};

mod importer;
pub use importer::{Importer, StepOutcome};
