//! RIR Ingest Library
//!
//! Builds one relational dataset from the delegated-extended statistics
//! files of the five Regional Internet Registries.
//!
//! # Stages
//!
//! - **fetcher**: download with retry and dated fallbacks
//! - **parser** / **normalizer** / **statistics**: split, clean and type the rows
//! - **merger**: freshness ordering and the global record sort
//! - **storage**: transactional SQLite load
//! - **dump**: portable SQL text artifact
//!
//! # Example
//!
//! ```no_run
//! use rir_ingest::{clock::SystemClock, config::IngestConfig, pipeline};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = IngestConfig::from_env()?;
//!     let stats = pipeline::run(&config, Arc::new(SystemClock)).await?;
//!     println!("{} records in {}", stats.records, stats.output.display());
//!     Ok(())
//! }
//! ```

pub mod clock;
pub mod config;
pub mod dump;
pub mod error;
pub mod fetcher;
pub mod merger;
pub mod normalizer;
pub mod parser;
pub mod pipeline;
pub mod statistics;
pub mod storage;

pub use error::{IngestError, Result};
