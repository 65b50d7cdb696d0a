//! Date handling for registry statistics files
//!
//! Registry files carry calendar dates in the compact `YYYYMMDD` form. Missing
//! dates and the `00000000` sentinel both map to the Unix epoch date so that
//! every date column ends up either null or an ISO calendar date.

use crate::error::{Result, RirError};
use chrono::NaiveDate;

/// Replacement for a missing or zeroed date
pub const EPOCH_DATE: &str = "1970-01-01";

/// Sentinel registries use for "no date"
pub const ZERO_DATE: &str = "00000000";

/// Normalize a compact date to `YYYY-MM-DD`.
///
/// `None` and `00000000` map to [`EPOCH_DATE`]. A value that is already in
/// extended form is validated and returned unchanged, so the rule can be
/// applied twice without harm.
pub fn normalize_compact_date(value: Option<&str>) -> Result<String> {
    let value = match value {
        None => return Ok(EPOCH_DATE.to_string()),
        Some(ZERO_DATE) => return Ok(EPOCH_DATE.to_string()),
        Some(v) => v,
    };

    let bytes = value.as_bytes();
    let (year, month, day) = if bytes.len() == 8 && bytes.iter().all(u8::is_ascii_digit) {
        (&value[0..4], &value[4..6], &value[6..8])
    } else if bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit())
    {
        (&value[0..4], &value[5..7], &value[8..10])
    } else {
        return Err(invalid(value));
    };

    validate_calendar(value, year, month, day)?;
    Ok(format!("{}-{}-{}", year, month, day))
}

/// Parse a normalized `YYYY-MM-DD` date
pub fn parse_iso_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| invalid(value))
}

fn validate_calendar(original: &str, year: &str, month: &str, day: &str) -> Result<()> {
    let year: i32 = year.parse().map_err(|_| invalid(original))?;
    let month: u32 = month.parse().map_err(|_| invalid(original))?;
    let day: u32 = day.parse().map_err(|_| invalid(original))?;

    NaiveDate::from_ymd_opt(year, month, day)
        .map(|_| ())
        .ok_or_else(|| invalid(original))
}

fn invalid(value: &str) -> RirError {
    RirError::InvalidDate {
        value: value.to_string(),
    }
}
