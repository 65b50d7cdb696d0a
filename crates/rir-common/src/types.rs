//! Record types of the delegated-extended statistics format
//!
//! A statistics file is a header ("version") line, a run of summary lines and
//! a run of allocation records, each a `|`-separated row. Parsing produces
//! [`RawRow`]s; after normalization they are converted into the typed records
//! defined here. Conversion is strict: a row that does not fit its shape is
//! an error, never skipped.

use crate::date::parse_iso_date;
use crate::error::{Result, RirError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One `|`-separated line; an empty field is `None`
pub type RawRow = Vec<Option<String>>;

/// Number of fields in a version line
pub const VERSION_FIELDS: usize = 7;

/// Number of fields in a summary line
pub const SUMMARY_FIELDS: usize = 6;

/// Number of fields in a normalized allocation record
pub const RECORD_FIELDS: usize = 8;

/// Index of the date field in an allocation record
pub const RECORD_DATE_INDEX: usize = 5;

/// Indices of the start and end date fields in a version line
pub const VERSION_DATE_INDICES: [usize; 2] = [4, 5];

/// Kind of number resource an allocation covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Asn,
    Ipv4,
    Ipv6,
}

impl ResourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Asn => "asn",
            ResourceType::Ipv4 => "ipv4",
            ResourceType::Ipv6 => "ipv6",
        }
    }
}

impl std::str::FromStr for ResourceType {
    type Err = RirError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "asn" => Ok(ResourceType::Asn),
            "ipv4" => Ok(ResourceType::Ipv4),
            "ipv6" => Ok(ResourceType::Ipv6),
            _ => Err(RirError::UnknownResourceType(s.to_string())),
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Header line of one registry's file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub version: String,
    pub registry: String,
    pub serial: i64,
    pub records: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub utc_offset: Option<String>,
}

impl VersionRecord {
    /// Convert a normalized version line
    pub fn from_row(row: &[Option<String>]) -> Result<Self> {
        let ctx = RowContext::new(row, 1);
        ctx.expect_len(VERSION_FIELDS)?;

        Ok(Self {
            version: ctx.required(0, "version")?.to_string(),
            registry: ctx.required(1, "registry")?.to_string(),
            serial: ctx.integer(2, "serial")?,
            records: ctx.integer(3, "records")?,
            start_date: ctx.date(4, "startdate")?,
            end_date: ctx.date(5, "enddate")?,
            utc_offset: ctx.optional(6),
        })
    }
}

/// Aggregate count line (`registry|*|type|*|count|summary`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub registry: String,
    pub resource_type: ResourceType,
    pub count: i64,
}

impl SummaryRecord {
    pub fn from_row(row: &[Option<String>]) -> Result<Self> {
        let ctx = RowContext::new(row, 0);
        ctx.expect_len(SUMMARY_FIELDS)?;

        Ok(Self {
            registry: ctx.required(0, "registry")?.to_string(),
            resource_type: ctx.resource_type(2)?,
            count: ctx.integer(4, "count")?,
        })
    }
}

/// One allocated block of addresses or AS numbers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRecord {
    pub registry: String,
    pub cc: Option<String>,
    pub resource_type: ResourceType,
    pub start: String,
    pub value: i64,
    pub date: Option<NaiveDate>,
    pub status: Option<String>,
    pub opaque_id: Option<String>,
}

impl AllocationRecord {
    /// Convert a normalized (padded to eight fields) allocation row
    pub fn from_row(row: &[Option<String>]) -> Result<Self> {
        let ctx = RowContext::new(row, 0);
        ctx.expect_len(RECORD_FIELDS)?;

        let date = match ctx.optional(RECORD_DATE_INDEX) {
            Some(value) => Some(parse_iso_date(&value)?),
            None => None,
        };

        Ok(Self {
            registry: ctx.required(0, "registry")?.to_string(),
            cc: ctx.optional(1),
            resource_type: ctx.resource_type(2)?,
            start: ctx.required(3, "start")?.to_string(),
            value: ctx.integer(4, "value")?,
            date,
            status: ctx.optional(6),
            opaque_id: ctx.optional(7),
        })
    }
}

/// Render a row back to its `|`-separated form for error messages
pub fn describe_row(row: &[Option<String>]) -> String {
    row.iter()
        .map(|field| field.as_deref().unwrap_or(""))
        .collect::<Vec<_>>()
        .join("|")
}

struct RowContext<'a> {
    row: &'a [Option<String>],
    registry: String,
}

impl<'a> RowContext<'a> {
    fn new(row: &'a [Option<String>], registry_index: usize) -> Self {
        let registry = row
            .get(registry_index)
            .and_then(|f| f.as_deref())
            .unwrap_or("unknown registry")
            .to_string();
        Self { row, registry }
    }

    fn line(&self) -> String {
        format!("line '{}'", describe_row(self.row))
    }

    fn expect_len(&self, expected: usize) -> Result<()> {
        if self.row.len() != expected {
            return Err(RirError::FieldCount {
                registry: self.registry.clone(),
                line: self.line(),
                expected: expected.to_string(),
                actual: self.row.len(),
            });
        }
        Ok(())
    }

    fn optional(&self, index: usize) -> Option<String> {
        self.row.get(index).cloned().flatten()
    }

    fn required(&self, index: usize, field: &'static str) -> Result<&'a str> {
        self.row
            .get(index)
            .and_then(|f| f.as_deref())
            .ok_or_else(|| RirError::MissingField {
                registry: self.registry.clone(),
                line: self.line(),
                field,
            })
    }

    fn integer(&self, index: usize, field: &'static str) -> Result<i64> {
        let value = self.required(index, field)?;
        value.parse().map_err(|_| RirError::InvalidField {
            registry: self.registry.clone(),
            line: self.line(),
            field,
            value: value.to_string(),
        })
    }

    fn date(&self, index: usize, field: &'static str) -> Result<NaiveDate> {
        parse_iso_date(self.required(index, field)?)
    }

    fn resource_type(&self, index: usize) -> Result<ResourceType> {
        let value = self.required(index, "type")?;
        value.parse().map_err(|_| RirError::InvalidField {
            registry: self.registry.clone(),
            line: self.line(),
            field: "type",
            value: value.to_string(),
        })
    }
}
