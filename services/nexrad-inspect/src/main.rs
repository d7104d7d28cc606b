//! NEXRAD file inspector.
//!
//! Decodes Archive II volumes, Level III products and AWIPS text product
//! files and prints a JSON summary per file. Files are decoded in parallel.

mod config;
mod summary;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use nexrad_decode::awips::TextProductFile;
use nexrad_decode::level2::{Archive2File, Level2MessageFactory};
use nexrad_decode::level3::Level3File;
use rayon::prelude::*;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use config::InspectConfig;
use summary::{Level2Summary, Level3Summary, TextFileSummary};

#[derive(Parser, Debug)]
#[command(name = "nexrad-inspect")]
#[command(about = "Decode NEXRAD radar files and AWIPS text products")]
struct Args {
    /// Configuration file path (defaults to NEXRAD_* environment variables)
    #[arg(short, long, env = "NEXRAD_INSPECT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level, overriding the configuration
    #[arg(long)]
    log_level: Option<String>,

    /// Log format (json or pretty), overriding the configuration
    #[arg(long)]
    log_format: Option<String>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode Archive II volume files
    Level2 {
        files: Vec<PathBuf>,

        /// Minimum segments of growth when a reassembly buffer fills up
        #[arg(long)]
        min_growth_segments: Option<u16>,
    },
    /// Decode Level III product files
    Level3 { files: Vec<PathBuf> },
    /// Decode AWIPS text product files
    Text {
        files: Vec<PathBuf>,

        /// End of the capture window (RFC 3339), used to resolve issuance
        /// times when file names carry no date
        #[arg(long)]
        end_time: Option<String>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => InspectConfig::load(path)?,
        None => InspectConfig::from_env()?,
    };
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if let Some(format) = &args.log_format {
        config.logging.format = format.clone();
    }
    if let Command::Level2 {
        min_growth_segments: Some(segments),
        ..
    } = &args.command
    {
        config.reassembly.min_growth_segments = *segments;
    }
    config.output.pretty |= args.pretty;
    config.validate()?;

    init_tracing(&config)?;

    match &args.command {
        Command::Level2 { files, .. } => {
            let factory = Level2MessageFactory::with_config(config.reassembly);
            info!(
                files = files.len(),
                min_growth_segments = config.reassembly.min_growth_segments,
                "Decoding Archive II volumes"
            );
            run(files, &config, |path| {
                let file = Archive2File::load_file(path, &factory)
                    .with_context(|| format!("Failed to decode Archive II file {:?}", path))?;
                Ok(Level2Summary::new(&path.to_string_lossy(), &file))
            })
        }
        Command::Level3 { files } => {
            info!(files = files.len(), "Decoding Level III products");
            run(files, &config, |path| {
                let file = Level3File::load_file(path)
                    .with_context(|| format!("Failed to decode Level III file {:?}", path))?;
                Ok(Level3Summary::new(&path.to_string_lossy(), &file))
            })
        }
        Command::Text { files, end_time } => {
            let end_time = end_time
                .as_deref()
                .map(|s| {
                    DateTime::parse_from_rfc3339(s)
                        .map(|t| t.with_timezone(&Utc))
                        .with_context(|| format!("Invalid end time: {}", s))
                })
                .transpose()?;

            info!(files = files.len(), "Decoding text product files");
            run(files, &config, |path| {
                let mut file = TextProductFile::new();
                let found = file
                    .load_file(path)
                    .with_context(|| format!("Failed to read text product file {:?}", path))?;
                if !found {
                    warn!(path = %path.display(), "No text products found");
                }
                Ok(TextFileSummary::new(&path.to_string_lossy(), &file, end_time))
            })
        }
    }
}

fn init_tracing(config: &InspectConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    let result = if config.logging.format == "json" {
        builder.json().try_init()
    } else {
        builder.pretty().try_init()
    };

    result.map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))
}

/// Decodes every file in parallel, then prints the summaries in argument
/// order. Fails if any file could not be decoded.
fn run<T, F>(files: &[PathBuf], config: &InspectConfig, decode: F) -> Result<()>
where
    T: Serialize + Send,
    F: Fn(&PathBuf) -> Result<T> + Sync,
{
    anyhow::ensure!(!files.is_empty(), "No input files given");

    let results: Vec<Result<T>> = files.par_iter().map(&decode).collect();

    let mut failures = 0;
    for (path, result) in files.iter().zip(results) {
        match result {
            Ok(summary) => {
                let json = if config.output.pretty {
                    serde_json::to_string_pretty(&summary)
                } else {
                    serde_json::to_string(&summary)
                }
                .context("Failed to serialize summary")?;
                println!("{}", json);
            }
            Err(e) => {
                error!(path = %path.display(), error = %format!("{:#}", e), "Failed to decode file");
                failures += 1;
            }
        }
    }

    info!(files = files.len(), failures, "Finished");
    anyhow::ensure!(failures == 0, "{} of {} files failed to decode", failures, files.len());
    Ok(())
}
