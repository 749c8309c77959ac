//! The error taxonomy driving the Importer Loop's control flow (spec §7).
//!
//! Each variant maps to exactly one recovery policy: [`ImporterError::NotReady`]
//! and [`ImporterError::Transient`] are recovered at the loop boundary (the
//! caller sleeps and retries), [`ImporterError::Reorg`] is recovered by
//! re-running the Startup Anchor, and [`ImporterError::ProtocolFatal`] /
//! [`ImporterError::ConfigurationFatal`] bubble to the top-level caller.

use alloy_primitives::B256;
use ethscript_engine::EngineError;

/// A [`Result`] alias for fallible importer operations.
pub type DriverResult<T> = Result<T, ImporterError>;

/// Errors raised while advancing the Importer Loop.
#[derive(Debug, thiserror::Error)]
pub enum ImporterError {
    /// The next L1 block the cursor wants does not yet exist at the tip.
    /// Not logged as an error; the loop yields and the caller retries later.
    #[error("block {0} is not ready yet")]
    NotReady(u64),

    /// A transport error, rate limit, or timeout survived the responsible
    /// client's own retry budget.
    #[error("transient error fetching L1 block {number}: {source}")]
    Transient {
        /// The L1 block number the failing call concerned.
        number: u64,
        /// The underlying transport error.
        #[source]
        source: Box<dyn core::error::Error + Send + Sync>,
    },

    /// The parent hash of a newly observed L1 block does not match the
    /// cached hash of its predecessor (spec §4.I step 3).
    #[error(
        "reorg detected at L1 block {number}: expected parent {expected}, observed {observed}"
    )]
    Reorg {
        /// The L1 block number at which the mismatch was observed.
        number: u64,
        /// The parent hash the cache expected.
        expected: B256,
        /// The parent hash the newly fetched block actually carries.
        observed: B256,
    },

    /// The engine rejected a proposed block, returned no `payload_id`, an
    /// empty payload, or a `latestValidHash` that did not match the
    /// submitted block hash.
    #[error("protocol-fatal error proposing L2 block on top of L1 block {l1_number}: {source}")]
    ProtocolFatal {
        /// The L1 block number being processed when the engine rejected the
        /// step.
        l1_number: u64,
        /// The underlying engine error.
        #[source]
        source: EngineError,
    },

    /// The filler gap computed for an L1 block exceeded
    /// [`crate::config::DriverConfig::max_filler_blocks`] (spec §4.F).
    #[error("filler block budget exhausted: {needed} fillers needed, cap is {cap}")]
    TooManyFillers {
        /// The number of filler blocks the gap actually required.
        needed: u64,
        /// The configured cap.
        cap: u64,
    },

    /// A required configuration value was missing or the Startup Anchor
    /// exhausted its search budget without finding an anchor (spec §4.J,
    /// §7).
    #[error("configuration error: {0}")]
    ConfigurationFatal(String),
}

impl ImporterError {
    /// `true` for [`Self::NotReady`] and [`Self::Transient`], the two
    /// variants recovered at the loop boundary rather than by reorg
    /// handling or a fatal abort.
    pub const fn is_recoverable_at_loop_boundary(&self) -> bool {
        matches!(self, Self::NotReady(_) | Self::Transient { .. })
    }

    /// `true` for [`Self::Reorg`].
    pub const fn is_reorg(&self) -> bool {
        matches!(self, Self::Reorg { .. })
    }
}
