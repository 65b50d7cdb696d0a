//! End-to-end ingestion run: fetch, parse, merge, load, dump

use crate::clock::Clock;
use crate::config::IngestConfig;
use crate::dump::write_dump;
use crate::error::{IngestError, Result};
use crate::fetcher::{FetchedDocument, Fetcher};
use crate::merger::{merge, SourcedStatistics};
use crate::statistics::RegistryStatistics;
use crate::storage::SqliteStore;
use futures::future::join_all;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// Summary of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineStats {
    pub registries: usize,
    pub summaries: usize,
    /// Records after replace-on-conflict
    pub records: usize,
    pub conflicts: usize,
    pub output: PathBuf,
}

/// Run the whole pipeline once
pub async fn run(config: &IngestConfig, clock: Arc<dyn Clock>) -> Result<PipelineStats> {
    config.validate()?;
    prepare_destination(config)?;

    let fetcher = Fetcher::new(config, clock)?;
    let documents = fetch_all(&fetcher, &config.sources).await?;

    let sources = documents
        .into_iter()
        .map(read_document)
        .collect::<Result<Vec<_>>>()?;

    let merged = merge(sources);
    if config.strict_conflicts {
        if let Some(first) = merged.conflicts.first() {
            return Err(IngestError::DuplicateResources {
                count: merged.conflicts.len(),
                first: first.to_string(),
            });
        }
    }

    let registries = merged.versions.len();
    let summaries = merged.summaries.len();
    let conflicts = merged.conflicts.len();
    let database_path = config.database_path();
    let dump_path = config.dump_path();
    let remove_database = config.remove_database;

    info!("Dropping {} summary lines before load", summaries);

    let output = dump_path.clone();
    let load = tokio::task::spawn_blocking(move || -> Result<_> {
        let mut store = SqliteStore::create(&database_path)?;
        let load = store.load(&merged.versions, &merged.records)?;
        write_dump(&store, &dump_path)?;
        drop(store);

        if remove_database {
            std::fs::remove_file(&database_path)?;
        }
        Ok(load)
    })
    .await??;

    Ok(PipelineStats {
        registries,
        summaries,
        records: load.records,
        conflicts,
        output,
    })
}

fn prepare_destination(config: &IngestConfig) -> Result<()> {
    if let Some(parent) = config.dest.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Fetch every source concurrently and wait for all of them.
///
/// Any source that stays unavailable fails the run with its error.
async fn fetch_all(fetcher: &Fetcher, sources: &[String]) -> Result<Vec<FetchedDocument>> {
    let results = join_all(sources.iter().map(|url| fetcher.fetch(url))).await;

    let mut documents = Vec::with_capacity(results.len());
    let mut first_error = None;

    for result in results {
        match result {
            Ok(document) => documents.push(document),
            Err(e) => {
                error!("{}", e);
                first_error.get_or_insert(e);
            },
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(documents),
    }
}

fn read_document(document: FetchedDocument) -> Result<SourcedStatistics> {
    let statistics =
        RegistryStatistics::read(&document.body).map_err(|source| IngestError::Document {
            url: document.url.clone(),
            source,
        })?;

    info!(
        "Parsed {} from {}: {} summary lines, {} records",
        statistics.registry(),
        document.url,
        statistics.summaries.len(),
        statistics.records.len()
    );

    Ok(SourcedStatistics {
        url: document.url,
        last_modified: document.last_modified,
        statistics,
    })
}
