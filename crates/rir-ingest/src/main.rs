//! RIR Ingest - build the merged registry statistics dump

use anyhow::Result;
use clap::Parser;
use rir_common::logging::{init_logging, LogConfig, LogLevel};
use rir_ingest::clock::SystemClock;
use rir_ingest::config::IngestConfig;
use rir_ingest::pipeline;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "rir-ingest")]
#[command(author, version, about = "Merge RIR delegated-extended statistics into an SQL dump")]
struct Cli {
    /// Statistics file URL; repeat for each registry (replaces the defaults)
    #[arg(long = "source", value_name = "URL")]
    sources: Vec<String>,

    /// Artifact base path; `.sql` and `.db` are appended
    #[arg(short, long, value_name = "PATH")]
    dest: Option<PathBuf>,

    /// Attempts per URL before falling back
    #[arg(long, value_name = "N")]
    max_attempts: Option<u32>,

    /// Fail when two registries list the same resource
    #[arg(long)]
    strict_conflicts: bool,

    /// Delete the intermediate SQLite database after dumping
    #[arg(long)]
    remove_database: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Layer CLI flags over the environment configuration
    fn apply(self, mut config: IngestConfig) -> IngestConfig {
        if !self.sources.is_empty() {
            config.sources = self.sources;
        }
        if let Some(dest) = self.dest {
            config.dest = dest;
        }
        if let Some(attempts) = self.max_attempts {
            config.retry.max_attempts = attempts;
        }
        config.strict_conflicts |= self.strict_conflicts;
        config.remove_database |= self.remove_database;
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    // Environment variables take precedence over the flag
    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("rir-ingest")
        .build()
        .merge_env()?;

    let _guard = init_logging(&log_config)?;

    let config = cli.apply(IngestConfig::from_env()?);

    match pipeline::run(&config, Arc::new(SystemClock)).await {
        Ok(stats) => {
            info!(
                "Ingestion complete: {} registries, {} records, {} conflicts -> {}",
                stats.registries,
                stats.records,
                stats.conflicts,
                stats.output.display()
            );
            Ok(())
        },
        Err(e) => {
            error!("Ingestion failed: {}", e);
            Err(e.into())
        },
    }
}
