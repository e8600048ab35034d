// src/dataset/build.rs

use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

use super::types::{Cell, Column, Dataset};
use crate::clean::clean_numeric_column;
use crate::error::{PipelineError, Result};
use crate::normalize::NameMatcher;
use crate::table::RawTable;

/// How to turn one source's raw table into a [`Dataset`].
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSpec {
    /// Label used in logs and errors.
    pub source: String,
    /// Position of the column naming the IPO.
    pub identity_column: usize,
    /// Columns coerced to numbers when present.
    pub numeric_columns: Vec<String>,
    /// Name given to the derived join-key column.
    pub key_column: String,
}

/// Make the header list exactly `width` long: pad with `Unnamed_<i>`
/// placeholders or truncate.
pub fn reconcile_headers(mut headers: Vec<String>, width: usize) -> Vec<String> {
    if headers.len() < width {
        let start = headers.len();
        headers.extend((start..width).map(|i| format!("Unnamed_{}", i)));
    } else {
        headers.truncate(width);
    }
    headers
}

/// Repeated header names get a `.1`, `.2`, ... suffix so every column can
/// be addressed by name.
fn dedupe_names(headers: Vec<String>) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(headers.len());
    for name in headers {
        let mut candidate = name.clone();
        let mut n = 0;
        while taken.contains(&candidate) {
            n += 1;
            candidate = format!("{}.{}", name, n);
        }
        if candidate != name {
            warn!(header = %name, renamed = %candidate, "duplicate header renamed");
        }
        taken.insert(candidate.clone());
        out.push(candidate);
    }
    out
}

/// Build a column-oriented dataset from an extracted table.
///
/// Fails with [`PipelineError::IdentityColumnMissing`] when the identity
/// column does not survive width reconciliation.
#[instrument(level = "info", skip(raw, spec, matcher), fields(source = %spec.source))]
pub fn build_dataset(raw: RawTable, spec: &DatasetSpec, matcher: &dyn NameMatcher) -> Result<Dataset> {
    let width = raw.max_row_width();
    let declared_identity = raw
        .headers
        .get(spec.identity_column)
        .cloned()
        .unwrap_or_else(|| format!("Unnamed_{}", spec.identity_column));

    if raw.headers.len() != width {
        debug!(
            headers = raw.headers.len(),
            width, "reconciling header count with row width"
        );
    }
    let headers = dedupe_names(reconcile_headers(raw.headers, width));
    let row_count = raw.rows.len();

    let mut columns: Vec<Column> = headers
        .into_iter()
        .enumerate()
        .map(|(j, name)| {
            let cells = raw
                .rows
                .iter()
                .map(|row| match row.get(j) {
                    Some(s) => Cell::Text(s.clone()),
                    None => Cell::Missing,
                })
                .collect();
            Column::new(name, cells)
        })
        .collect();

    // Dedupe may rename the identity header, so select it by position.
    let identity = columns.get(spec.identity_column).ok_or_else(|| {
        warn!(column = %declared_identity, "identity column not found, cannot normalize names");
        PipelineError::IdentityColumnMissing {
            source_name: spec.source.clone(),
            column: declared_identity.clone(),
        }
    })?;

    let keys: Vec<Cell> = identity
        .cells
        .iter()
        .map(|cell| match cell {
            Cell::Text(s) => Cell::Text(matcher.normalize(s)),
            other => other.clone(),
        })
        .collect();

    // Assigning over an existing column of the same name mirrors column assignment.
    match columns.iter_mut().find(|c| c.name == spec.key_column) {
        Some(existing) => existing.cells = keys,
        None => columns.push(Column::new(spec.key_column.clone(), keys)),
    }

    for name in &spec.numeric_columns {
        match columns.iter_mut().find(|c| &c.name == name) {
            Some(col) => col.cells = clean_numeric_column(&col.cells),
            None => debug!(column = %name, "numeric column absent, skipping"),
        }
    }

    info!(rows = row_count, columns = columns.len(), "dataset built");
    Ok(Dataset {
        source: spec.source.clone(),
        columns,
        key_column: spec.key_column.clone(),
        row_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::StatusTagMatcher;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn spec(numeric: &[&str]) -> DatasetSpec {
        DatasetSpec {
            source: "test".into(),
            identity_column: 0,
            numeric_columns: strings(numeric),
            key_column: "Normalized_IPO_Name".into(),
        }
    }

    #[test]
    fn short_headers_are_padded() {
        let headers = reconcile_headers(strings(&["IPO", "QIB"]), 4);
        assert_eq!(headers, strings(&["IPO", "QIB", "Unnamed_2", "Unnamed_3"]));
    }

    #[test]
    fn long_headers_are_truncated() {
        let headers = reconcile_headers(strings(&["A", "B", "C", "D", "E"]), 3);
        assert_eq!(headers, strings(&["A", "B", "C"]));
    }

    #[test]
    fn width_follows_widest_row() -> anyhow::Result<()> {
        let raw = RawTable {
            headers: strings(&["IPO", "Total"]),
            rows: vec![
                strings(&["Acme", "1", "x", "y"]),
                strings(&["Beta", "2"]),
            ],
        };
        let ds = build_dataset(raw, &spec(&[]), &StatusTagMatcher)?;

        assert_eq!(
            ds.column_names(),
            vec!["IPO", "Total", "Unnamed_2", "Unnamed_3", "Normalized_IPO_Name"]
        );
        assert_eq!(ds.get(1, "Unnamed_2"), Some(&Cell::Missing));
        assert_eq!(ds.get(0, "Unnamed_3"), Some(&Cell::from("y")));
        Ok(())
    }

    #[test]
    fn extra_headers_dropped_to_row_width() -> anyhow::Result<()> {
        let raw = RawTable {
            headers: strings(&["IPO", "QIB", "NII", "RII", "Total"]),
            rows: vec![strings(&["Acme", "1", "2"])],
        };
        let ds = build_dataset(raw, &spec(&["QIB", "Total"]), &StatusTagMatcher)?;

        assert_eq!(ds.column_names(), vec!["IPO", "QIB", "NII", "Normalized_IPO_Name"]);
        assert_eq!(ds.get(0, "QIB"), Some(&Cell::Number(1.0)));
        assert!(ds.column("Total").is_none());
        Ok(())
    }

    #[test]
    fn keys_and_numbers_are_derived() -> anyhow::Result<()> {
        let raw = RawTable {
            headers: strings(&["IPO", "QIB", "Total"]),
            rows: vec![
                strings(&["Acme Closed", "1.5", "3.2"]),
                strings(&["Beta Ltd (SME)", "-", "₹1,200"]),
            ],
        };
        let ds = build_dataset(raw, &spec(&["QIB", "Total", "Applications"]), &StatusTagMatcher)?;

        assert_eq!(ds.row_count, 2);
        assert_eq!(ds.keys(), &[Cell::from("Acme"), Cell::from("Beta Ltd")]);
        assert_eq!(ds.get(0, "IPO"), Some(&Cell::from("Acme Closed")));
        assert_eq!(ds.get(1, "QIB"), Some(&Cell::Missing));
        assert_eq!(ds.get(1, "Total"), Some(&Cell::Number(1200.0)));
        Ok(())
    }

    #[test]
    fn identity_column_lost_to_truncation_aborts() {
        let raw = RawTable {
            headers: strings(&["Rank", "IPO"]),
            rows: vec![strings(&["1"])],
        };
        let mut s = spec(&[]);
        s.identity_column = 1;

        let err = build_dataset(raw, &s, &StatusTagMatcher).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::IdentityColumnMissing { ref column, .. } if column == "IPO"
        ));
    }

    #[test]
    fn identity_column_found_by_position_after_rename() -> anyhow::Result<()> {
        let raw = RawTable {
            headers: strings(&["IPO", "IPO"]),
            rows: vec![strings(&["Rank 1", "Acme Open"])],
        };
        let mut s = spec(&[]);
        s.identity_column = 1;

        let ds = build_dataset(raw, &s, &StatusTagMatcher)?;
        assert_eq!(ds.column_names(), vec!["IPO", "IPO.1", "Normalized_IPO_Name"]);
        assert_eq!(ds.keys(), &[Cell::from("Acme")]);
        Ok(())
    }

    #[test]
    fn duplicate_headers_get_suffixes() -> anyhow::Result<()> {
        let raw = RawTable {
            headers: strings(&["IPO", "Price", "Price"]),
            rows: vec![strings(&["Acme", "10", "12"])],
        };
        let ds = build_dataset(raw, &spec(&["Price"]), &StatusTagMatcher)?;

        assert_eq!(ds.column_names(), vec!["IPO", "Price", "Price.1", "Normalized_IPO_Name"]);
        assert_eq!(ds.get(0, "Price"), Some(&Cell::Number(10.0)));
        assert_eq!(ds.get(0, "Price.1"), Some(&Cell::from("12")));
        Ok(())
    }
}
