//! SQL text dump of the loaded store
//!
//! The dump mirrors what the `sqlite3` shell's `.dump` prints, then comments
//! out `PRAGMA` directives so other engines can replay it.

use crate::error::{IngestError, Result};
use crate::storage::SqliteStore;
use rusqlite::types::ValueRef;
use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

/// Keyword of configuration directives that are commented out
pub const DIRECTIVE_KEYWORD: &str = "PRAGMA ";

/// Prefix that turns a line into an SQL comment
pub const COMMENT_PREFIX: &str = "-- ";

/// Something that can write its contents as SQL statements
pub trait SqlExport {
    fn export_sql(&self, out: &mut dyn Write) -> Result<()>;
}

impl SqlExport for SqliteStore {
    fn export_sql(&self, out: &mut dyn Write) -> Result<()> {
        let conn = self.connection();

        writeln!(out, "PRAGMA foreign_keys=OFF;")?;
        writeln!(out, "BEGIN TRANSACTION;")?;

        let tables: Vec<(String, String)> = conn
            .prepare(
                "SELECT name, sql FROM sqlite_master \
                 WHERE type = 'table' AND sql IS NOT NULL AND name NOT LIKE 'sqlite_%' \
                 ORDER BY rowid",
            )?
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<_>>()?;

        for (name, sql) in &tables {
            writeln!(out, "{};", sql)?;

            let table = quote_identifier(name);
            let mut select = conn.prepare(&format!("SELECT * FROM {} ORDER BY rowid", table))?;
            let columns = select.column_count();
            let mut rows = select.query([])?;

            while let Some(row) = rows.next()? {
                let mut line = format!("INSERT INTO {} VALUES(", table);
                for index in 0..columns {
                    if index > 0 {
                        line.push(',');
                    }
                    push_literal(&mut line, row.get_ref(index)?);
                }
                line.push_str(");");
                writeln!(out, "{}", line)?;
            }
        }

        let others: Vec<String> = conn
            .prepare(
                "SELECT sql FROM sqlite_master \
                 WHERE type IN ('index', 'trigger', 'view') AND sql IS NOT NULL \
                 ORDER BY rowid",
            )?
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<_>>()?;

        for sql in &others {
            writeln!(out, "{};", sql)?;
        }

        writeln!(out, "COMMIT;")?;
        Ok(())
    }
}

/// Append an SQL literal for `value` to `line`
fn push_literal(line: &mut String, value: ValueRef<'_>) {
    match value {
        ValueRef::Null => line.push_str("NULL"),
        ValueRef::Integer(i) => {
            let _ = write!(line, "{}", i);
        },
        ValueRef::Real(f) => {
            let _ = write!(line, "{:?}", f);
        },
        ValueRef::Text(bytes) => {
            line.push('\'');
            line.push_str(&String::from_utf8_lossy(bytes).replace('\'', "''"));
            line.push('\'');
        },
        ValueRef::Blob(bytes) => {
            line.push_str("X'");
            for byte in bytes {
                let _ = write!(line, "{:02x}", byte);
            }
            line.push('\'');
        },
    }
}

fn quote_identifier(name: &str) -> String {
    if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

/// Prefix every line that starts with a `PRAGMA` directive with `-- `
pub fn comment_directives(text: &str) -> String {
    text.split('\n')
        .map(|line| {
            if line.starts_with(DIRECTIVE_KEYWORD) {
                format!("{}{}", COMMENT_PREFIX, line)
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Size of a written dump
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DumpStats {
    pub lines: usize,
    pub bytes: usize,
}

/// Export `store`, comment out directives and atomically replace `dest`.
///
/// The text is written to a temporary file next to `dest` and renamed over
/// it, so a failure leaves any previous dump untouched.
pub fn write_dump(store: &impl SqlExport, dest: &Path) -> Result<DumpStats> {
    let mut raw = Vec::new();
    store.export_sql(&mut raw)?;

    let text = String::from_utf8(raw)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    let text = comment_directives(&text);

    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(text.as_bytes())?;
    file.as_file().sync_all()?;
    file.persist(dest).map_err(|e| IngestError::Persist {
        path: dest.to_path_buf(),
        source: e.error,
    })?;

    let stats = DumpStats {
        lines: text.lines().count(),
        bytes: text.len(),
    };
    info!("Wrote {} ({} lines, {} bytes)", dest.display(), stats.lines, stats.bytes);

    Ok(stats)
}
