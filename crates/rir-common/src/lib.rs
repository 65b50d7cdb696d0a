//! RIR Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, date handling, error handling and logging for the RIR
//! statistics workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`RirError`] and the [`Result`] alias
//! - **Dates**: the compact `YYYYMMDD` date rule used by every registry file
//! - **Types**: version, summary and allocation records of the
//!   delegated-extended exchange format
//! - **Logging**: `tracing` subscriber setup shared by all binaries
//!
//! # Example
//!
//! ```
//! use rir_common::date::normalize_compact_date;
//!
//! assert_eq!(normalize_compact_date(Some("20240131")).unwrap(), "2024-01-31");
//! assert_eq!(normalize_compact_date(None).unwrap(), "1970-01-01");
//! ```

pub mod date;
pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{Result, RirError};
