//! Decision bridge binary for Skirmish.
//!
//! Replays a recorded duel through the cycle pipeline, asks the external
//! decision service for an action on each eligible cycle, and logs the
//! validated actions that would be dispatched.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `skirmish-config.yaml` (or `--config`)
//! 2. Initialize structured logging (tracing)
//! 3. Load the item catalog
//! 4. Build the cycle pipeline
//! 5. Spawn the decision worker
//! 6. Open the replay recording
//! 7. Drive cycles until the replay ends, the cycle limit, or Ctrl-C
//! 8. Log the run summary

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use skirmish_core::catalog::ItemCatalog;
use skirmish_core::clock::CycleClock;
use skirmish_core::config::{LoggingConfig, SkirmishConfig};
use skirmish_core::pipeline::{CyclePipeline, PipelineSettings};
use skirmish_core::safety::RequestGate;
use skirmish_engine::agent::DuelAgent;
use skirmish_engine::client::{ClientSettings, DecisionClient};
use skirmish_engine::driver;
use skirmish_engine::error::EngineError;
use skirmish_engine::replay::{LoggingDispatcher, ReplayWorld};
use skirmish_engine::worker;
use skirmish_types::{HEAD_COUNT, OBSERVATION_SIZE, fingerprint_hex};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_PATH: &str = "skirmish-config.yaml";

const USAGE: &str = "usage: skirmish-engine [--config <path>] [--replay <path>]";

struct Args {
    config: PathBuf,
    replay: Option<PathBuf>,
}

impl Args {
    /// Parse command-line arguments. `None` means `--help` was requested.
    fn parse(mut args: impl Iterator<Item = String>) -> anyhow::Result<Option<Self>> {
        let mut out = Self {
            config: PathBuf::from(DEFAULT_CONFIG_PATH),
            replay: None,
        };
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--help" | "-h" => return Ok(None),
                "--config" => {
                    let value = args.next().context("missing value for --config")?;
                    out.config = PathBuf::from(value);
                }
                "--replay" => {
                    let value = args.next().context("missing value for --replay")?;
                    out.replay = Some(PathBuf::from(value));
                }
                other => anyhow::bail!("unknown argument {other:?}\n{USAGE}"),
            }
        }
        Ok(Some(out))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Some(args) = Args::parse(std::env::args().skip(1))? else {
        println!("{USAGE}");
        return Ok(());
    };

    // 1. Load configuration.
    let (config, loaded_from_file) = load_config(&args.config)?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!("skirmish-engine starting");
    if !loaded_from_file {
        info!(path = %args.config.display(), "Config file not found, using defaults");
    }
    info!(
        period_ms = config.cycle.period_ms,
        max_cycles = config.cycle.max_cycles,
        decision_address = %config.decision.address(),
        model = %config.decision.model,
        request_timeout_ms = config.decision.request_timeout_ms,
        frame_stack = config.decision.frame_stack,
        "Configuration loaded"
    );
    info!(
        observation_size = OBSERVATION_SIZE,
        heads = HEAD_COUNT,
        contract_fingerprint = %fingerprint_hex(),
        "Decision contract"
    );

    let replay_path = args
        .replay
        .or_else(|| config.replay.path.as_ref().map(PathBuf::from))
        .context("no replay recording: pass --replay <path> or set replay.path")?;

    run(&config, &replay_path).await?;
    Ok(())
}

async fn run(config: &SkirmishConfig, replay_path: &Path) -> Result<(), EngineError> {
    // 3. Load item catalog.
    let catalog = load_catalog(config)?;
    info!(items = catalog.len(), "Item catalog loaded");

    // 4. Build the cycle pipeline.
    let settings = PipelineSettings::from_config(config, &catalog);
    let pipeline = CyclePipeline::new(Arc::new(catalog), settings);

    // 5. Spawn the decision worker. It connects on first request.
    let client = DecisionClient::new(ClientSettings::from_config(&config.decision));
    let (decisions, worker_task) = worker::spawn(client, config.decision.queue_capacity);

    // 6. Open the replay recording.
    let world = ReplayWorld::from_file(replay_path)?;

    // 7. Drive cycles.
    let gate = RequestGate::new(Duration::from_millis(
        config.decision.min_request_interval_ms,
    ));
    let mut agent = DuelAgent::new(pipeline, world, LoggingDispatcher::default(), decisions, gate);
    let mut clock = CycleClock::new(config.cycle.period_ms)?;
    let summary = driver::drive(
        &mut clock,
        &mut agent,
        config.cycle.max_cycles,
        shutdown_signal(),
    )
    .await?;

    // 8. Log the run summary.
    summary.log();
    let (_world, dispatcher, stats) = agent.into_parts();
    stats.log_summary();
    info!(dispatched = dispatcher.dispatched(), "Dispatcher closed");

    worker_task.await.map_err(|e| EngineError::Worker {
        message: e.to_string(),
    })?;
    Ok(())
}

/// Load configuration from `path`, falling back to defaults (with
/// environment overrides) if the file does not exist.
fn load_config(path: &Path) -> Result<(SkirmishConfig, bool), EngineError> {
    if path.exists() {
        Ok((SkirmishConfig::from_file(path)?, true))
    } else {
        Ok((SkirmishConfig::parse("")?, false))
    }
}

/// Load the item catalog from `loadout.catalog_path`, or the embedded one.
fn load_catalog(config: &SkirmishConfig) -> Result<ItemCatalog, EngineError> {
    let catalog = match &config.loadout.catalog_path {
        Some(path) => ItemCatalog::from_file(Path::new(path))?,
        None => ItemCatalog::embedded()?,
    };
    Ok(catalog)
}

fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if config.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Ctrl-C received, shutting down"),
        Err(e) => {
            warn!(error = %e, "Cannot listen for Ctrl-C, running until the replay ends");
            std::future::pending::<()>().await;
        }
    }
}
