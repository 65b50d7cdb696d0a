//! Delegated-extended statistics parser
//!
//! A statistics file is line oriented: `#` comments, one version line, a run
//! of summary lines whose last field is `summary`, then allocation records.
//! There is no explicit marker between the summary and record sections; see
//! [`partition_at_first_non_summary`].

use rir_common::types::RawRow;
use rir_common::{Result, RirError};

/// Last field of every summary line
pub const SUMMARY_MARKER: &str = "summary";

/// A statistics file split into its three row groups, not yet normalized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDocument {
    pub version: RawRow,
    pub summary: Vec<RawRow>,
    pub records: Vec<RawRow>,
}

/// Parse the raw text of one statistics file
pub fn parse_document(text: &str) -> Result<ParsedDocument> {
    let mut rows = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
        .map(split_fields);

    let version = rows
        .next()
        .ok_or_else(|| RirError::parse("document has no version line"))?;

    let (summary, records) = partition_at_first_non_summary(rows.collect());

    Ok(ParsedDocument {
        version,
        summary,
        records,
    })
}

/// Split a line on `|`; empty fields become `None`
pub fn split_fields(line: &str) -> RawRow {
    line.split('|')
        .map(|field| {
            if field.is_empty() {
                None
            } else {
                Some(field.to_string())
            }
        })
        .collect()
}

/// Split content rows into `(summary, records)` at the first row whose last
/// field is not `summary`.
///
/// Every row before that point is a summary row and every row from it onward
/// is a record, even one that happens to end in `summary`. When no row
/// qualifies (including empty content) everything is summary.
pub fn partition_at_first_non_summary(mut content: Vec<RawRow>) -> (Vec<RawRow>, Vec<RawRow>) {
    let boundary = content
        .iter()
        .position(|row| !is_summary_row(row))
        .unwrap_or(content.len());

    let records = content.split_off(boundary);
    (content, records)
}

fn is_summary_row(row: &[Option<String>]) -> bool {
    matches!(row.last(), Some(Some(last)) if last == SUMMARY_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const APNIC_SAMPLE: &str = "\
# comment line
2.3|apnic|20240101|3|19830613|20231231|+1000
apnic|*|asn|*|1|summary
apnic|*|ipv4|*|2|summary

apnic|AU|ipv4|1.0.0.0|256|20110811|assigned|A91872ED
apnic|CN|ipv4|1.0.1.0|256|20110414|allocated
apnic|JP|asn|173|1|20020801|allocated|A92E1062
";

    #[test]
    fn test_parse_document_sections() {
        let doc = parse_document(APNIC_SAMPLE).unwrap();

        assert_eq!(doc.version[1].as_deref(), Some("apnic"));
        assert_eq!(doc.summary.len(), 2);
        assert_eq!(doc.records.len(), 3);
        assert_eq!(doc.records[1].len(), 7);
        assert_eq!(doc.records[2][3].as_deref(), Some("173"));
    }

    #[test]
    fn test_parse_document_handles_crlf() {
        let doc = parse_document(&APNIC_SAMPLE.replace('\n', "\r\n")).unwrap();
        assert_eq!(doc.version[6].as_deref(), Some("+1000"));
        assert_eq!(doc.records[0][7].as_deref(), Some("A91872ED"));
    }

    #[test]
    fn test_parse_document_without_version_line() {
        assert!(parse_document("# only comments\n\n").is_err());
    }

    #[test]
    fn test_split_fields_nulls_empty_fields() {
        assert_eq!(
            split_fields("lacnic||ipv4|200.0.0.0|256||reserved"),
            vec![
                Some("lacnic".to_string()),
                None,
                Some("ipv4".to_string()),
                Some("200.0.0.0".to_string()),
                Some("256".to_string()),
                None,
                Some("reserved".to_string()),
            ]
        );
    }

    #[test]
    fn test_partition_all_summary() {
        let content = vec![split_fields("arin|*|asn|*|1|summary")];
        let (summary, records) = partition_at_first_non_summary(content);
        assert_eq!(summary.len(), 1);
        assert!(records.is_empty());

        let (summary, records) = partition_at_first_non_summary(Vec::new());
        assert!(summary.is_empty() && records.is_empty());
    }

    #[test]
    fn test_partition_is_positional() {
        let content = vec![
            split_fields("arin|*|asn|*|1|summary"),
            split_fields("arin|US|asn|1|1|19840101|assigned|x"),
            split_fields("arin|US|asn|2|1|19840101|summary"),
        ];
        let (summary, records) = partition_at_first_non_summary(content);
        assert_eq!(summary.len(), 1);
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_partition_null_last_field_is_a_record() {
        let content = vec![split_fields("ripencc|*|ipv6|*|9|")];
        let (summary, records) = partition_at_first_non_summary(content);
        assert!(summary.is_empty());
        assert_eq!(records.len(), 1);
    }

    proptest! {
        #[test]
        fn prop_partition_splits_after_summary_run(k in 0usize..20, n in 0usize..20) {
            let mut content = Vec::new();
            for i in 0..k {
                content.push(split_fields(&format!("ripencc|*|ipv4|*|{i}|summary")));
            }
            for i in 0..n {
                content.push(split_fields(&format!("ripencc|NL|ipv4|10.0.{i}.0|256|20000101|allocated")));
            }

            let (summary, records) = partition_at_first_non_summary(content.clone());

            prop_assert_eq!(summary.len(), k);
            prop_assert_eq!(records.len(), n);
            prop_assert_eq!([summary, records].concat(), content);
        }
    }
}
