//! The importer's configuration surface (spec §6): a typed [`Config`] read
//! from the environment, with a [`Cli`] wrapper that overlays `clap` flags
//! on the same fields (grounded on `bin/host`'s `HostCli`
//! (`bin/host/src/cli/mod.rs`), the teacher's only `clap`-driven binary).

use std::net::SocketAddr;

use alloy_primitives::Address;
use clap::Parser;
use ethscript_driver::{DriverConfig, DEFAULT_FINALIZED_OFFSET, DEFAULT_SAFE_OFFSET, MAX_FILLER_BLOCKS};
use ethscript_primitives::Hash32;

/// Command-line overlay for [`Config`]. Every flag is optional; unset flags
/// fall back to the matching environment variable, then to the field's
/// default (teacher pattern: `bin/deriver` reads env directly, this binary
/// additionally exposes a CLI surface the way `bin/host` does).
#[derive(Debug, Parser)]
#[command(author, version, about = "Derives L2 blocks from ethscription operations observed on L1")]
pub struct Cli {
    /// L1 JSON-RPC endpoint (env `L1_RPC_URL`).
    #[arg(long, env = "L1_RPC_URL")]
    pub l1_rpc_url: String,

    /// L2 execution client's authenticated Engine API endpoint (env
    /// `GETH_RPC_URL`).
    #[arg(long, env = "GETH_RPC_URL")]
    pub geth_rpc_url: String,

    /// L2 execution client's plain JSON-RPC endpoint, used only by the
    /// Startup Anchor (env `L2_RPC_URL`).
    #[arg(long, env = "L2_RPC_URL")]
    pub l2_rpc_url: String,

    /// Hex-encoded Engine API JWT secret (env `JWT_SECRET`).
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: String,

    /// The first L1 block the rollup consumes (env `L1_GENESIS_BLOCK`).
    #[arg(long, env = "L1_GENESIS_BLOCK")]
    pub l1_genesis_block: u64,

    /// Max L1 blocks fetched per driver step (env `BLOCK_IMPORT_BATCH_SIZE`).
    #[arg(long, env = "BLOCK_IMPORT_BATCH_SIZE", default_value_t = ethscript_driver::DEFAULT_BATCH_SIZE)]
    pub block_import_batch_size: u64,

    /// Hard cap on filler blocks inserted in one step (env
    /// `MAX_FILLER_BLOCKS`).
    #[arg(long, env = "MAX_FILLER_BLOCKS", default_value_t = MAX_FILLER_BLOCKS)]
    pub max_filler_blocks: u64,

    /// L1 epochs behind head the `safe` pointer lags (env `SAFE_OFFSET`).
    #[arg(long, env = "SAFE_OFFSET", default_value_t = DEFAULT_SAFE_OFFSET)]
    pub safe_offset: u64,

    /// L1 epochs behind head the `finalized` pointer lags (env
    /// `FINALIZED_OFFSET`).
    #[arg(long, env = "FINALIZED_OFFSET", default_value_t = DEFAULT_FINALIZED_OFFSET)]
    pub finalized_offset: u64,

    /// ESIP-1 activation L1 block number (env `ESIP1_ENABLED_AT`).
    #[arg(long, env = "ESIP1_ENABLED_AT", default_value_t = 0)]
    pub esip1_enabled_at: u64,

    /// ESIP-2 activation L1 block number (env `ESIP2_ENABLED_AT`).
    #[arg(long, env = "ESIP2_ENABLED_AT", default_value_t = 0)]
    pub esip2_enabled_at: u64,

    /// ESIP-3 activation L1 block number (env `ESIP3_ENABLED_AT`).
    #[arg(long, env = "ESIP3_ENABLED_AT", default_value_t = 0)]
    pub esip3_enabled_at: u64,

    /// ESIP-5 activation L1 block number (env `ESIP5_ENABLED_AT`).
    #[arg(long, env = "ESIP5_ENABLED_AT", default_value_t = 0)]
    pub esip5_enabled_at: u64,

    /// ESIP-7 activation L1 block number (env `ESIP7_ENABLED_AT`).
    #[arg(long, env = "ESIP7_ENABLED_AT", default_value_t = 0)]
    pub esip7_enabled_at: u64,

    /// Advisory post-step validation against a reference indexer; this core
    /// only logs that it was requested (env `VALIDATE_IMPORT`).
    #[arg(long, env = "VALIDATE_IMPORT")]
    pub validate_import: bool,

    /// The system depositor address for the attributes transaction (env
    /// `ATTRIBUTES_DEPOSITOR`).
    #[arg(long, env = "ATTRIBUTES_DEPOSITOR", default_value = "0x0000000000000000000000000000000000000000")]
    pub attributes_depositor: Address,

    /// The predeployed L1-attributes contract address (env
    /// `ATTRIBUTES_RECIPIENT`).
    #[arg(long, env = "ATTRIBUTES_RECIPIENT", default_value = "0x0000000000000000000000000000000000000000")]
    pub attributes_recipient: Address,

    /// Address the importer's `/healthz` liveness endpoint binds, if any
    /// (env `HEALTH_ADDR`). Out of scope for the derivation core itself;
    /// kept for operational parity with the teacher's `bin/host --server`
    /// mode.
    #[arg(long, env = "HEALTH_ADDR")]
    pub health_addr: Option<SocketAddr>,

    /// Verbosity level (0-4), same convention as `bin/host`'s `-v`.
    #[arg(short, long, help = "Verbosity level (0-4)", action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

/// The importer's fully resolved configuration, independent of how it was
/// gathered (CLI flags or bare environment variables).
#[derive(Debug, Clone)]
pub struct Config {
    /// L1 JSON-RPC endpoint.
    pub l1_rpc_url: reqwest::Url,
    /// L2 execution client's authenticated Engine API endpoint.
    pub geth_rpc_url: reqwest::Url,
    /// L2 execution client's plain JSON-RPC endpoint.
    pub l2_rpc_url: reqwest::Url,
    /// Hex-encoded Engine API JWT secret.
    pub jwt_secret: String,
    /// Driver-wide configuration (batch size, offsets, fee scalars, ...).
    pub driver: DriverConfig,
    /// ESIP activation configuration.
    pub esips: ethscript_derive::EsipConfig,
    /// Advisory post-step validation flag.
    pub validate_import: bool,
    /// Liveness endpoint bind address, if configured.
    pub health_addr: Option<SocketAddr>,
    /// Verbosity level (0-4).
    pub verbosity: u8,
}

/// Errors raised while resolving [`Config`] from the environment or CLI.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required variable was absent from both the CLI and the
    /// environment.
    #[error("{0} must be set (as a flag or an environment variable)")]
    Missing(&'static str),
    /// A variable was present but could not be parsed as a URL.
    #[error("{0} is not a valid URL: {1}")]
    InvalidUrl(&'static str, String),
}

impl Config {
    /// Reads configuration from the process environment only, bypassing
    /// `clap` entirely (teacher pattern: `bin/deriver`'s `new_req_url`).
    /// Used by tests and any embedder that wants the env-only surface
    /// without linking `clap`.
    pub fn from_env() -> Result<Self, ConfigError> {
        fn required(name: &'static str) -> Result<String, ConfigError> {
            std::env::var(name).map_err(|_| ConfigError::Missing(name))
        }
        fn parsed<T: std::str::FromStr>(name: &'static str, default: T) -> T {
            std::env::var(name).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
        }
        fn url(name: &'static str) -> Result<reqwest::Url, ConfigError> {
            required(name)?.parse().map_err(|e: url::ParseError| ConfigError::InvalidUrl(name, e.to_string()))
        }

        let driver = DriverConfig {
            l1_genesis_block: parsed("L1_GENESIS_BLOCK", 0),
            batch_size: parsed("BLOCK_IMPORT_BATCH_SIZE", ethscript_driver::DEFAULT_BATCH_SIZE),
            safe_offset: parsed("SAFE_OFFSET", DEFAULT_SAFE_OFFSET),
            finalized_offset: parsed("FINALIZED_OFFSET", DEFAULT_FINALIZED_OFFSET),
            max_filler_blocks: parsed("MAX_FILLER_BLOCKS", MAX_FILLER_BLOCKS),
            validate_import: parsed("VALIDATE_IMPORT", false),
            attributes_depositor: parsed("ATTRIBUTES_DEPOSITOR", Address::ZERO),
            attributes_recipient: parsed("ATTRIBUTES_RECIPIENT", Address::ZERO),
            base_fee_scalar: parsed("BASE_FEE_SCALAR", 0),
            blob_base_fee_scalar: parsed("BLOB_BASE_FEE_SCALAR", 0),
            batcher_hash: Hash32::ZERO,
        };

        let esips = ethscript_derive::EsipConfig {
            esip1_enabled_at: parsed("ESIP1_ENABLED_AT", 0),
            esip2_enabled_at: parsed("ESIP2_ENABLED_AT", 0),
            esip3_enabled_at: parsed("ESIP3_ENABLED_AT", 0),
            esip5_enabled_at: parsed("ESIP5_ENABLED_AT", 0),
            esip7_enabled_at: parsed("ESIP7_ENABLED_AT", 0),
        };

        Ok(Self {
            l1_rpc_url: url("L1_RPC_URL")?,
            geth_rpc_url: url("GETH_RPC_URL")?,
            l2_rpc_url: url("L2_RPC_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            validate_import: driver.validate_import,
            driver,
            esips,
            health_addr: std::env::var("HEALTH_ADDR").ok().and_then(|v| v.parse().ok()),
            verbosity: parsed("VERBOSITY_LEVEL", 2),
        })
    }

    /// Builds a [`Config`] from parsed `clap` flags, which have already
    /// overlaid the environment per-field via `#[arg(env = ...)]`.
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let driver = DriverConfig {
            l1_genesis_block: cli.l1_genesis_block,
            batch_size: cli.block_import_batch_size,
            safe_offset: cli.safe_offset,
            finalized_offset: cli.finalized_offset,
            max_filler_blocks: cli.max_filler_blocks,
            validate_import: cli.validate_import,
            attributes_depositor: cli.attributes_depositor,
            attributes_recipient: cli.attributes_recipient,
            base_fee_scalar: 0,
            blob_base_fee_scalar: 0,
            batcher_hash: Hash32::ZERO,
        };
        let esips = ethscript_derive::EsipConfig {
            esip1_enabled_at: cli.esip1_enabled_at,
            esip2_enabled_at: cli.esip2_enabled_at,
            esip3_enabled_at: cli.esip3_enabled_at,
            esip5_enabled_at: cli.esip5_enabled_at,
            esip7_enabled_at: cli.esip7_enabled_at,
        };
        Ok(Self {
            l1_rpc_url: cli.l1_rpc_url.parse().map_err(|e: url::ParseError| ConfigError::InvalidUrl("L1_RPC_URL", e.to_string()))?,
            geth_rpc_url: cli.geth_rpc_url.parse().map_err(|e: url::ParseError| ConfigError::InvalidUrl("GETH_RPC_URL", e.to_string()))?,
            l2_rpc_url: cli.l2_rpc_url.parse().map_err(|e: url::ParseError| ConfigError::InvalidUrl("L2_RPC_URL", e.to_string()))?,
            jwt_secret: cli.jwt_secret,
            validate_import: driver.validate_import,
            driver,
            esips,
            health_addr: cli.health_addr,
            verbosity: cli.verbosity,
        })
    }
}
