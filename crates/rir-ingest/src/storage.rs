//! SQLite store for the merged dataset
//!
//! Two tables, `version` (one row per registry) and `record` (one row per
//! `(type, start)`), with `record.registry` referencing `version.registry`.
//! Everything is loaded inside a single transaction.

use crate::error::Result;
use rir_common::types::{AllocationRecord, VersionRecord};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Declared widths of the variable-length version columns, taken from the
/// data. Informational only: SQLite does not truncate to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColumnWidths {
    pub version: usize,
    pub registry: usize,
}

impl ColumnWidths {
    pub fn observe(versions: &[VersionRecord]) -> Self {
        versions.iter().fold(Self::default(), |widths, v| Self {
            version: widths.version.max(v.version.chars().count()),
            registry: widths.registry.max(v.registry.chars().count()),
        })
    }
}

/// `CREATE TABLE` statement of the version table
pub fn version_table_sql(widths: ColumnWidths) -> String {
    format!(
        "CREATE TABLE version (
  version     character varying ({}),
  registry    character varying ({}),
  serial      bigint,
  records     bigint,
  startdate   date,
  enddate     date,
  utcoffset   character (5),
  PRIMARY KEY (registry)
)",
        widths.version, widths.registry
    )
}

/// `CREATE TABLE` statement of the record table
pub fn record_table_sql(widths: ColumnWidths) -> String {
    format!(
        "CREATE TABLE record (
  registry    character varying ({}),
  cc          character (2),
  type        character varying (4),
  start       character varying (39),
  value       integer,
  date        date,
  status      character varying (9),
  opaque_id   character varying (36),
  PRIMARY KEY (type, start),
  FOREIGN KEY (registry) REFERENCES version(registry)
)",
        widths.registry
    )
}

const INSERT_VERSION: &str = "INSERT INTO version VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";

const UPSERT_RECORD: &str = "INSERT OR REPLACE INTO record VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";

/// Row counts of one load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadStats {
    pub versions: usize,
    /// Records remaining after replace-on-conflict
    pub records: usize,
    /// Records replaced by a later row with the same `(type, start)`
    pub superseded: usize,
}

/// SQLite database holding one run's dataset
pub struct SqliteStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Create a fresh database file, removing any previous one
    pub fn create(path: &Path) -> Result<Self> {
        match std::fs::remove_file(path) {
            Ok(()) => debug!("Removed previous database {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
            Err(e) => return Err(e.into()),
        }

        let conn = Connection::open(path)?;
        Self::with_connection(conn, Some(path.to_path_buf()))
    }

    /// Create an in-memory store (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, None)
    }

    fn with_connection(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self { conn, path })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Create the schema and insert all rows in one transaction.
    ///
    /// A duplicate registry or a record whose registry has no version row
    /// aborts the load; the transaction rolls back when dropped uncommitted.
    pub fn load(
        &mut self,
        versions: &[VersionRecord],
        records: &[AllocationRecord],
    ) -> Result<LoadStats> {
        let widths = ColumnWidths::observe(versions);
        let tx = self.conn.transaction()?;

        tx.execute_batch(&version_table_sql(widths))?;
        tx.execute_batch(&record_table_sql(widths))?;

        {
            let mut insert = tx.prepare(INSERT_VERSION)?;
            for v in versions {
                insert.execute(params![
                    v.version,
                    v.registry,
                    v.serial,
                    v.records,
                    v.start_date,
                    v.end_date,
                    v.utc_offset,
                ])?;
            }
        }

        {
            let mut upsert = tx.prepare(UPSERT_RECORD)?;
            for r in records {
                upsert.execute(params![
                    r.registry,
                    r.cc,
                    r.resource_type.as_str(),
                    r.start,
                    r.value,
                    r.date,
                    r.status,
                    r.opaque_id,
                ])?;
            }
        }

        let stored: i64 = tx.query_row("SELECT COUNT(*) FROM record", [], |row| row.get(0))?;
        tx.commit()?;

        let stored = usize::try_from(stored).unwrap_or_default();
        let stats = LoadStats {
            versions: versions.len(),
            records: stored,
            superseded: records.len().saturating_sub(stored),
        };

        info!(
            "Loaded {} registries and {} records ({} superseded)",
            stats.versions, stats.records, stats.superseded
        );

        Ok(stats)
    }

    /// Number of rows in `table`
    pub fn count_rows(&self, table: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM \"{}\"", table.replace('"', "\"\"")),
            [],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}
