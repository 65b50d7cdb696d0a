//! Field normalization for parsed statistics files

use crate::parser::ParsedDocument;
use rir_common::date::normalize_compact_date;
use rir_common::types::{RawRow, RECORD_DATE_INDEX, RECORD_FIELDS, VERSION_DATE_INDICES};
use rir_common::Result;

/// Normalize a parsed document in place.
///
/// Version start/end dates always go through the date rule (so a missing
/// date becomes `1970-01-01`). Records are padded to eight fields and their
/// date is normalized when present. Summary rows are left as parsed.
pub fn normalize_document(document: &mut ParsedDocument) -> Result<()> {
    for index in VERSION_DATE_INDICES {
        if let Some(field) = document.version.get_mut(index) {
            *field = Some(normalize_compact_date(field.as_deref())?);
        }
    }

    for record in &mut document.records {
        normalize_record(record)?;
    }

    Ok(())
}

/// Pad a record to eight fields and normalize its date
pub fn normalize_record(record: &mut RawRow) -> Result<()> {
    pad_record(record);

    if let Some(field) = record.get_mut(RECORD_DATE_INDEX) {
        if field.is_some() {
            *field = Some(normalize_compact_date(field.as_deref())?);
        }
    }

    Ok(())
}

/// Right-pad with nulls up to eight fields; longer rows are left alone
pub fn pad_record(record: &mut RawRow) {
    if record.len() < RECORD_FIELDS {
        record.resize(RECORD_FIELDS, None);
    }
}
