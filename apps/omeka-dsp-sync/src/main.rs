//! omeka2dsp - Omeka S to DSP synchroniser
//!
//! Reads every item of an Omeka S item set and creates or updates the
//! matching resources, including media, in a DSP project.

mod config;
mod selection;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use omeka_dsp_core::{CancellationToken, SourceStore, SyncOrchestrator};
use omeka_dsp_http::{DspClient, OmekaClient};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use config::AppConfig;
use selection::{Mode, DEFAULT_TEST_IDENTIFIERS};

#[derive(Debug, Parser)]
#[command(name = "omeka2dsp", version, about)]
struct Cli {
    /// TOML configuration file; environment variables override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Which records to synchronise
    #[arg(short, long, value_enum, default_value_t = Mode::All)]
    mode: Mode,

    /// Number of random records in sample mode
    #[arg(long, default_value_t = 2)]
    sample_size: usize,

    /// Identifiers synchronised in test mode (repeatable)
    #[arg(short, long = "identifier")]
    identifiers: Vec<String>,

    /// Log file, truncated on every run
    #[arg(long, default_value = "omeka2dsp.log")]
    log_file: PathBuf,

    /// Records processed concurrently (overrides the configuration)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Log planned changes without writing to DSP
    #[arg(long)]
    dry_run: bool,
}

fn init_logging(log_file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::create(log_file)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(Arc::new(file)))
        .try_init()?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.log_file)?;

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(workers) = cli.workers {
        config.sync.run.workers = workers;
    }
    config.sync.run.dry_run |= cli.dry_run;
    config.sync.validate()?;

    let source = Arc::new(OmekaClient::new(config.omeka.clone())?);
    let target = Arc::new(DspClient::new(
        config.dsp.clone(),
        config.sync.ontology.clone(),
    )?);

    let records = source.list_records().await?;
    let identifiers = if cli.identifiers.is_empty() {
        DEFAULT_TEST_IDENTIFIERS.iter().map(|s| s.to_string()).collect()
    } else {
        cli.identifiers.clone()
    };
    let records = selection::select(
        records,
        cli.mode,
        cli.sample_size,
        &identifiers,
        &mut rand::rng(),
    );
    tracing::info!("Mode {}: {} records selected", cli.mode, records.len());
    if config.sync.run.dry_run {
        tracing::info!("Dry run, nothing will be written");
    }

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, finishing records in progress");
                cancel.cancel();
            }
        });
    }

    let orchestrator = SyncOrchestrator::new(target, source, config.sync);
    let report = orchestrator.run(records, &cancel).await?;
    tracing::info!("{}", report);

    Ok(())
}
