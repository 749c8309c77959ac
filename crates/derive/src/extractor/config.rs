//! ESIP activation configuration.
//!
//! Exact activation numbers are chain-deployment data (spec.md §9's open
//! question), so they are configuration, not constants. ESIP-6 is a
//! per-content marker read out of the data URI itself and never gates
//! extraction, so it has no activation point here.

/// The L1 block number at which each gated ESIP activates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EsipConfig {
    /// ESIP-1: event-based single transfers.
    pub esip1_enabled_at: u64,
    /// ESIP-2: event-based transfers conditioned on a previous owner.
    pub esip2_enabled_at: u64,
    /// ESIP-3: event-based creates.
    pub esip3_enabled_at: u64,
    /// ESIP-5: multi-transfer by input.
    pub esip5_enabled_at: u64,
    /// ESIP-7: gzip-compressed input creates.
    pub esip7_enabled_at: u64,
}

impl EsipConfig {
    /// All ESIPs enabled from L1 genesis. Convenient for tests.
    pub const fn all_enabled_from_genesis() -> Self {
        Self {
            esip1_enabled_at: 0,
            esip2_enabled_at: 0,
            esip3_enabled_at: 0,
            esip5_enabled_at: 0,
            esip7_enabled_at: 0,
        }
    }

    /// `true` if ESIP-1 is active at `l1_block_number`.
    pub const fn esip1_enabled(&self, l1_block_number: u64) -> bool {
        l1_block_number >= self.esip1_enabled_at
    }

    /// `true` if ESIP-2 is active at `l1_block_number`.
    pub const fn esip2_enabled(&self, l1_block_number: u64) -> bool {
        l1_block_number >= self.esip2_enabled_at
    }

    /// `true` if ESIP-3 is active at `l1_block_number`.
    pub const fn esip3_enabled(&self, l1_block_number: u64) -> bool {
        l1_block_number >= self.esip3_enabled_at
    }

    /// `true` if ESIP-5 is active at `l1_block_number`.
    pub const fn esip5_enabled(&self, l1_block_number: u64) -> bool {
        l1_block_number >= self.esip5_enabled_at
    }

    /// `true` if ESIP-7 is active at `l1_block_number`.
    pub const fn esip7_enabled(&self, l1_block_number: u64) -> bool {
        l1_block_number >= self.esip7_enabled_at
    }
}
