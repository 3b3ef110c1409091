use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{error, info};
use station_forecast::sink::{CsvSink, JsonLinesSink, PredictionSink};
use station_forecast::source::CsvSource;
use station_forecast::{ForecastConfig, ForecastError, Pipeline, RunMode};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "forecast_stations")]
#[command(about = "Forecast groundwater levels per station with ARIMA")]
#[command(version)]
struct Cli {
    /// CSV file with station_id,timestamp,water_level rows
    #[arg(short, long)]
    input: PathBuf,

    /// Prediction file; `.csv` writes CSV, anything else JSON lines
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write predictions instead of a dry run
    #[arg(long, requires = "output")]
    live: bool,

    /// Future steps per station
    #[arg(long)]
    horizon: Option<usize>,

    /// Forecast stations in parallel
    #[arg(long)]
    parallel: bool,

    /// Log ACF/PACF of every training segment at debug level
    #[arg(long)]
    diagnostics: bool,
}

impl Cli {
    fn load_config(&self) -> Result<ForecastConfig> {
        let mut config = match &self.config {
            Some(path) => ForecastConfig::from_json_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => ForecastConfig::default(),
        };

        if let Some(horizon) = self.horizon {
            config.horizon = horizon;
        }
        if self.live {
            config.mode = RunMode::Live;
        }
        config.parallel |= self.parallel;
        config.diagnostics |= self.diagnostics;

        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

fn open_sink(path: &Path) -> Box<dyn PredictionSink> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => Box::new(CsvSink::new(path)),
        _ => Box::new(JsonLinesSink::new(path)),
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = cli.load_config()?;
    if config.mode == RunMode::Live && cli.output.is_none() {
        bail!("live mode needs --output");
    }

    let pipeline = Pipeline::new(&config).context("failed to build pipeline")?;
    let mut source = CsvSource::new(&cli.input);
    let mut sink = cli.output.as_deref().map(open_sink);

    let result = match sink.as_mut() {
        Some(sink) => pipeline.run(&mut source, Some(&mut **sink)),
        None => pipeline.run(&mut source, None),
    };

    let summary = match result {
        Ok(summary) => summary,
        Err(ForecastError::Sink { source, records }) => {
            error!("{} predictions were computed but not persisted", records.len());
            return Err(source).context("failed to write predictions");
        }
        Err(e) => {
            return Err(e)
                .with_context(|| format!("forecast run over {} failed", cli.input.display()))
        }
    };

    info!(
        "{} stations, {} failed, {} predictions, {} written",
        summary.station_count(),
        summary.failed_station_count(),
        summary.records.len(),
        summary.inserted
    );
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Cli::parse()) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
