//! Typed view of one registry's statistics file

use crate::normalizer::normalize_document;
use crate::parser::{parse_document, ParsedDocument};
use rir_common::types::{AllocationRecord, SummaryRecord, VersionRecord};
use rir_common::Result;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Version line, summary lines and allocation records of one registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryStatistics {
    pub version: VersionRecord,
    pub summaries: Vec<SummaryRecord>,
    pub records: Vec<AllocationRecord>,
}

impl RegistryStatistics {
    /// Parse, normalize and convert a statistics file
    pub fn read(text: &str) -> Result<Self> {
        let mut document = parse_document(text)?;
        normalize_document(&mut document)?;
        Self::from_normalized(document)
    }

    /// Convert an already normalized document; any ill-shaped row fails
    pub fn from_normalized(document: ParsedDocument) -> Result<Self> {
        let version = VersionRecord::from_row(&document.version)?;

        let summaries = document
            .summary
            .iter()
            .map(|row| SummaryRecord::from_row(row))
            .collect::<Result<Vec<_>>>()?;

        let records = document
            .records
            .iter()
            .map(|row| AllocationRecord::from_row(row))
            .collect::<Result<Vec<_>>>()?;

        let statistics = Self {
            version,
            summaries,
            records,
        };
        statistics.check_summary_totals();

        debug!(
            "{}: serial {}, {} summary lines, {} records",
            statistics.version.registry,
            statistics.version.serial,
            statistics.summaries.len(),
            statistics.records.len()
        );

        Ok(statistics)
    }

    pub fn registry(&self) -> &str {
        &self.version.registry
    }

    /// Record counts per resource type
    pub fn record_counts(&self) -> BTreeMap<&'static str, i64> {
        let mut counts = BTreeMap::new();
        for record in &self.records {
            *counts.entry(record.resource_type.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Summary lines are informational only; disagreement is logged
    fn check_summary_totals(&self) {
        let counts = self.record_counts();

        for summary in &self.summaries {
            let actual = counts
                .get(summary.resource_type.as_str())
                .copied()
                .unwrap_or(0);
            if actual != summary.count {
                warn!(
                    "{} summary declares {} {} records but {} were listed",
                    summary.registry, summary.count, summary.resource_type, actual
                );
            }
        }
    }
}
