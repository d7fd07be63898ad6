// Purpose: Provides the command-line interface for running a crossing simulation.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use crossing_core::{
    parse_records, CrossingConfig, CrossingSimulation, FanoutSink, LoadedTrains, RunReport,
    SharedSink, TracingSink, WriterSink,
};

/// Single-track crossing simulator
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Cli {
    /// Train description file: one `marker loading crossing` record per train
    #[clap(required = true)]
    pub input: PathBuf,

    /// Event log destination (overrides the config file)
    #[clap(long, short = 'o', env = "CROSSING_OUTPUT")]
    pub output: Option<PathBuf>,

    /// TOML configuration file
    #[clap(long, short = 'c', env = "CROSSING_CONFIG")]
    pub config: Option<PathBuf>,

    /// Maximum number of trains accepted from the input
    #[clap(long)]
    pub max_trains: Option<usize>,

    /// Real length of one input time unit in milliseconds
    #[clap(long)]
    pub time_unit_ms: Option<u64>,

    /// Write a JSON run report to this path
    #[clap(long)]
    pub report: Option<PathBuf>,

    /// Also emit every crossing event through the tracing subscriber
    #[clap(long)]
    pub trace_events: bool,
}

impl Cli {
    /// Resolve the effective configuration: defaults, then the config file,
    /// then command-line overrides.
    pub fn resolve_config(&self) -> Result<CrossingConfig> {
        let mut config = match &self.config {
            Some(path) => CrossingConfig::load(path)
                .with_context(|| format!("Failed to load config: {:?}", path))?,
            None => CrossingConfig::default(),
        };
        if let Some(output) = &self.output {
            config.output_path = output.clone();
        }
        if let Some(max_trains) = self.max_trains {
            config.max_trains = max_trains;
        }
        if let Some(time_unit_ms) = self.time_unit_ms {
            config.time_unit_ms = time_unit_ms;
        }
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    /// Read the input file and parse its train records.
    pub fn load_trains(&self, config: &CrossingConfig) -> Result<LoadedTrains> {
        let input = fs::read_to_string(&self.input)
            .with_context(|| format!("Failed to read input file: {:?}", self.input))?;
        Ok(parse_records(&input, config.time_unit(), config.max_trains))
    }
}

/// Run the CLI
pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let report = execute(cli).await?;
    println!("{} train(s) crossed", report.admissions.len());
    Ok(())
}

/// Execute one simulation as described by `cli`.
pub async fn execute(cli: Cli) -> Result<RunReport> {
    let config = cli.resolve_config()?;

    let loaded = cli.load_trains(&config)?;
    // Not fatal: the accepted trains still run.
    for warning in loaded.warnings() {
        eprintln!("Warning: {}", warning);
    }

    let output = File::create(&config.output_path)
        .with_context(|| format!("Failed to create output file: {:?}", config.output_path))?;
    let mut sink = FanoutSink::new().with_sink(Arc::new(WriterSink::new(BufWriter::new(output))));
    if cli.trace_events {
        sink = sink.with_sink(Arc::new(TracingSink));
    }
    let sink: SharedSink = Arc::new(sink);

    let simulation = CrossingSimulation::new(config.clone(), loaded.trains, sink)
        .context("Failed to prepare simulation")?;
    info!(
        trains = simulation.trains().len(),
        output = %config.output_path.display(),
        "running crossing simulation"
    );

    let cancel = simulation.cancel_handle();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling simulation");
            cancel.cancel();
        }
    });
    let result = simulation.run().await;
    interrupt.abort();
    let report = result.context("Simulation failed")?;

    if let Some(path) = &cli.report {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        fs::write(path, json).with_context(|| format!("Failed to write report: {:?}", path))?;
        info!(report = %path.display(), "run report written");
    }

    Ok(report)
}
