//! The importer binary: wires the L1 RPC Client, the Engine API client, and
//! the Startup Anchor into the Importer Loop and drives it to completion
//! (spec §4.I).
//!
//! Grounded on `bin/deriver/src/main.rs`'s `#[tokio::main]` loop shape
//! (build providers, loop on `pipeline.step()`, log via `tracing`), with
//! `bin/host`'s `clap::Parser` CLI surface (`bin/host/src/cli/mod.rs`)
//! layered on top per spec §6.

mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use config::{Cli, Config};
use ethscript_driver::{anchor, EngineApi, Importer, ImporterError, StepOutcome};
use ethscript_engine::EngineClient;
use ethscript_providers_alloy::{AlloyL1Provider, AlloyL2Reader};
use tracing::{debug, error, info, warn, Level};

/// How long the loop sleeps after [`ImporterError::NotReady`] before
/// checking the L1 tip again.
const NOT_READY_BACKOFF: Duration = Duration::from_secs(2);

/// How long the loop sleeps after a [`ImporterError::Transient`] before
/// retrying, on top of whatever retry budget the L1/engine clients already
/// spent internally.
const TRANSIENT_BACKOFF: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing_subscriber(cli.verbosity);

    let config = Config::from_cli(cli).context("resolving configuration")?;
    run(config).await
}

async fn run(config: Config) -> Result<()> {
    let l1_provider = Arc::new(AlloyL1Provider::new_http(config.l1_rpc_url.clone()));
    let l2_reader = AlloyL2Reader::new_http(config.l2_rpc_url.clone());
    let engine = EngineClient::new_with_hex_secret(config.geth_rpc_url.clone(), &config.jwt_secret)
        .map_err(|e| anyhow!("invalid JWT secret: {e}"))?;

    if config.validate_import {
        info!(target: "importer", "VALIDATE_IMPORT requested; this core only logs the request, no reference-indexer check is performed");
    }

    info!(target: "importer", "finding startup anchor");
    let (anchor_number, cache) = anchor(l1_provider.as_ref(), &l2_reader, config.driver.finalized_offset)
        .await
        .context("running the startup anchor")?;
    info!(target: "importer", anchor_number, l1_blocks = cache.l1_len(), l2_blocks = cache.l2_len(), "anchored");

    let mut importer = Importer::new(config.driver.clone(), config.esips, Arc::clone(&l1_provider), engine, cache);

    loop {
        match importer.step().await {
            Ok(StepOutcome::UpToDate) => {
                debug!(target: "importer", "up to date with L1 tip, waiting");
                tokio::time::sleep(NOT_READY_BACKOFF).await;
            }
            Ok(StepOutcome::Advanced { l1_number, l2_blocks, heads }) => {
                info!(
                    target: "importer",
                    l1_number,
                    l2_blocks = l2_blocks.len(),
                    head = heads.head,
                    safe = heads.safe,
                    finalized = heads.finalized,
                    "advanced"
                );
            }
            Err(err) => handle_error(err, &mut importer, &l1_provider, &l2_reader, &config).await?,
        }
    }
}

/// Applies spec §7's recovery policy for one failed [`Importer::step`]:
/// `NotReady`/`Transient` back off and retry in place, `Reorg` re-runs the
/// Startup Anchor and replaces `importer` in place, and `ProtocolFatal`/
/// `ConfigurationFatal` bubble out of `main` and end the process.
async fn handle_error<E: EngineApi>(
    err: ImporterError,
    importer: &mut Importer<AlloyL1Provider, E>,
    l1_provider: &Arc<AlloyL1Provider>,
    l2_reader: &AlloyL2Reader,
    config: &Config,
) -> Result<()> {
    match err {
        ImporterError::NotReady(number) => {
            debug!(target: "importer", number, "not ready yet");
            tokio::time::sleep(NOT_READY_BACKOFF).await;
            Ok(())
        }
        ImporterError::Transient { number, source } => {
            warn!(target: "importer", number, %source, "transient error, retrying");
            tokio::time::sleep(TRANSIENT_BACKOFF).await;
            Ok(())
        }
        ImporterError::Reorg { number, expected, observed } => {
            warn!(target: "importer", number, %expected, %observed, "reorg detected, re-anchoring");
            let (anchor_number, cache) = anchor(l1_provider.as_ref(), l2_reader, config.driver.finalized_offset)
                .await
                .context("re-running the startup anchor after a reorg")?;
            info!(target: "importer", anchor_number, "re-anchored after reorg");
            importer.replace_cache(cache);
            Ok(())
        }
        ImporterError::ProtocolFatal { l1_number, source } => {
            error!(target: "importer", l1_number, %source, "protocol-fatal error, exiting");
            Err(anyhow!(source).context(format!("protocol-fatal error at L1 block {l1_number}")))
        }
        ImporterError::TooManyFillers { needed, cap } => {
            error!(target: "importer", needed, cap, "filler block budget exhausted, exiting");
            Err(anyhow!("filler block budget exhausted: {needed} needed, cap is {cap}"))
        }
        ImporterError::ConfigurationFatal(msg) => {
            error!(target: "importer", %msg, "configuration error, exiting");
            Err(anyhow!(msg).context("configuration error"))
        }
    }
}

/// Initializes a `tracing` subscriber at a verbosity derived from `-v`
/// count, the same 0-4 convention as `bin/host`'s `HostCli::v`.
fn init_tracing_subscriber(verbosity: u8) {
    let level = match verbosity {
        0 => Level::ERROR,
        1 => Level::WARN,
        2 => Level::INFO,
        3 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
