//! Merge of the per-registry statistics into one dataset
//!
//! Registries are ordered oldest `Last-Modified` first and their rows are
//! concatenated. Records are then stably sorted by resource type and a
//! natural ordering of the start token. Because both steps are stable, when
//! several registries list the same `(type, start)` the one from the most
//! recently modified file ends up last, and the loader's replace-on-conflict
//! insert keeps it.

use crate::statistics::RegistryStatistics;
use chrono::{DateTime, Utc};
use rir_common::types::{AllocationRecord, ResourceType, SummaryRecord, VersionRecord};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{info, warn};

/// One registry's statistics tagged with the freshness of its source file
#[derive(Debug, Clone)]
pub struct SourcedStatistics {
    pub url: String,
    pub last_modified: DateTime<Utc>,
    pub statistics: RegistryStatistics,
}

/// A resource listed by more than one registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub resource_type: ResourceType,
    pub start: String,
    /// Registry whose row is replaced
    pub superseded: String,
    /// Registry whose row is kept
    pub winner: String,
}

impl std::fmt::Display for Conflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} ({} superseded by {})",
            self.resource_type, self.start, self.superseded, self.winner
        )
    }
}

/// All registries' rows in load order
#[derive(Debug, Clone, Default)]
pub struct MergedDataset {
    pub versions: Vec<VersionRecord>,
    pub summaries: Vec<SummaryRecord>,
    pub records: Vec<AllocationRecord>,
    pub conflicts: Vec<Conflict>,
}

/// Comparison key of a start token: its alphanumeric segments read as
/// base-36 integers.
///
/// Base 36 keeps both decimal and hexadecimal segments in numeric order, so
/// `192.0.2.0` sorts before `192.0.10.0` and `2001:db8::` before `2001:dc0::`.
/// Ordering is segment by segment; a key that is a prefix of another sorts
/// first. Segments too long for `u128` saturate.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NaturalKey(Vec<u128>);

impl NaturalKey {
    pub fn new(token: &str) -> Self {
        Self(
            token
                .split(|c: char| !c.is_ascii_alphanumeric())
                .filter(|segment| !segment.is_empty())
                .map(|segment| u128::from_str_radix(segment, 36).unwrap_or(u128::MAX))
                .collect(),
        )
    }

    pub fn segments(&self) -> &[u128] {
        &self.0
    }
}

/// Sort key of a record: type as text, then natural start order
pub fn record_sort_key(record: &AllocationRecord) -> (&'static str, NaturalKey) {
    (record.resource_type.as_str(), NaturalKey::new(&record.start))
}

/// Comparator equivalent to [`record_sort_key`]
pub fn compare_records(a: &AllocationRecord, b: &AllocationRecord) -> Ordering {
    record_sort_key(a).cmp(&record_sort_key(b))
}

/// Merge registries into one dataset
pub fn merge(mut sources: Vec<SourcedStatistics>) -> MergedDataset {
    // stable: equal timestamps keep their input order
    sources.sort_by_key(|source| source.last_modified);

    let mut merged = MergedDataset::default();
    for source in sources {
        info!(
            "Merging {} ({} records, last modified {})",
            source.statistics.registry(),
            source.statistics.records.len(),
            source.last_modified
        );
        merged.versions.push(source.statistics.version);
        merged.summaries.extend(source.statistics.summaries);
        merged.records.extend(source.statistics.records);
    }

    // sort_by_cached_key is stable as well
    merged.records.sort_by_cached_key(record_sort_key);
    merged.conflicts = find_conflicts(&merged.records);

    for conflict in &merged.conflicts {
        warn!("Resource listed by more than one registry: {}", conflict);
    }

    merged
}

/// Walk records in load order and report every `(type, start)` that a later
/// row will replace
fn find_conflicts(records: &[AllocationRecord]) -> Vec<Conflict> {
    let mut owners: HashMap<(ResourceType, &str), &str> = HashMap::with_capacity(records.len());
    let mut conflicts = Vec::new();

    for record in records {
        let key = (record.resource_type, record.start.as_str());
        if let Some(previous) = owners.insert(key, record.registry.as_str()) {
            conflicts.push(Conflict {
                resource_type: record.resource_type,
                start: record.start.clone(),
                superseded: previous.to_string(),
                winner: record.registry.clone(),
            });
        }
    }

    conflicts
}
