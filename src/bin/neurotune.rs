//! NeuroTune CLI - score one recording and print a single JSON line
//!
//! Usage: `neurotune EEG1 EEG2 ECG BIOMARKERS`
//!
//! stdout carries only the metric record. Diagnostics go to stderr through
//! the logger; set `RUST_LOG` to change verbosity.

use clap::{Parser, ValueEnum};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use neurotune_metrics::{
    AnalysisConfig, AnalysisError, InputFiles, MetricsProcessor, Strategy, METRICS_VERSION,
};

/// Score EEG band-power exports into engagement, arousal and preference indices
#[derive(Parser)]
#[command(name = "neurotune")]
#[command(version = METRICS_VERSION)]
#[command(about = "Score biosignal exports into psychophysiological indices", long_about = None)]
struct Cli {
    /// First EEG trace (read by the raw strategy only)
    eeg1: PathBuf,

    /// Second EEG trace (read by the raw strategy only)
    eeg2: PathBuf,

    /// ECG trace (read by the raw strategy only)
    ecg: PathBuf,

    /// Combined biomarker table; the GSR trace under the raw strategy
    biomarkers: PathBuf,

    /// Ingestion strategy
    #[arg(long, value_enum, default_value = "table")]
    strategy: StrategyArg,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    /// Score the fourth file as a biomarker table
    Table,
    /// Score four raw traces
    Raw,
    /// Table when usable, otherwise raw traces
    Auto,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Table => Strategy::Table,
            StrategyArg::Raw => Strategy::Raw,
            StrategyArg::Auto => Strategy::Auto,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), MetricsCliError> {
    let config = match &cli.config {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::default(),
    };

    let inputs = InputFiles {
        eeg1: cli.eeg1,
        eeg2: cli.eeg2,
        ecg: cli.ecg,
        biomarkers: cli.biomarkers,
    };

    let processor = MetricsProcessor::new(config);
    let outcome = processor.process(&inputs, cli.strategy.into());
    let json = outcome.to_json()?;

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{json}")?;
    stdout.flush()?;

    Ok(())
}

// Error types

#[derive(Debug)]
enum MetricsCliError {
    Io(io::Error),
    Analysis(AnalysisError),
}

impl From<io::Error> for MetricsCliError {
    fn from(e: io::Error) -> Self {
        MetricsCliError::Io(e)
    }
}

impl From<AnalysisError> for MetricsCliError {
    fn from(e: AnalysisError) -> Self {
        MetricsCliError::Analysis(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<MetricsCliError> for CliError {
    fn from(e: MetricsCliError) -> Self {
        match e {
            MetricsCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check that stdout is writable".to_string()),
            },
            MetricsCliError::Analysis(e @ AnalysisError::Io { .. }) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            MetricsCliError::Analysis(
                e @ (AnalysisError::InvalidConfig(_)
                | AnalysisError::UnknownEncoding(_)
                | AnalysisError::JsonError(_)),
            ) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check the --config file".to_string()),
            },
            MetricsCliError::Analysis(e) => CliError {
                code: "ANALYSIS_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
        }
    }
}
