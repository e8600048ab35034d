// src/merge/mod.rs

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, info, instrument, warn};

use crate::dataset::{Cell, Dataset};

/// Result of joining two datasets: named columns and one row per join key.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

/// A single joined row, viewed through its table's column names.
#[derive(Debug, Clone, Copy)]
pub struct MergedRecord<'a> {
    columns: &'a [String],
    cells: &'a [Cell],
}

impl<'a> MergedRecord<'a> {
    pub fn get(&self, name: &str) -> Option<&'a Cell> {
        let cells = self.cells;
        self.columns
            .iter()
            .position(|c| c == name)
            .and_then(|i| cells.get(i))
    }

    pub fn fields(&self) -> impl Iterator<Item = (&'a str, &'a Cell)> + 'a {
        let (columns, cells) = (self.columns, self.cells);
        columns.iter().map(String::as_str).zip(cells.iter())
    }
}

impl Serialize for MergedRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (name, cell) in self.fields() {
            map.serialize_entry(name, cell)?;
        }
        map.end()
    }
}

impl MergedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn records(&self) -> impl Iterator<Item = MergedRecord<'_>> {
        self.rows.iter().map(move |cells| MergedRecord {
            columns: &self.columns,
            cells,
        })
    }

    /// Drop every row whose `column` is missing. Returns `None` without
    /// touching the table when the column does not exist.
    pub fn drop_missing(&mut self, column: &str) -> Option<usize> {
        let idx = self.columns.iter().position(|c| c == column)?;
        let before = self.rows.len();
        self.rows.retain(|row| !row[idx].is_missing());
        Some(before - self.rows.len())
    }
}

/// Serializes as a JSON array of objects, one per row.
impl Serialize for MergedTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for record in self.records() {
            seq.serialize_element(&record)?;
        }
        seq.end()
    }
}

/// Row index of the first occurrence of each key. Later duplicates are
/// dropped with a warning so every key maps to one output row.
fn index_by_key(ds: &Dataset) -> BTreeMap<Option<String>, usize> {
    let mut index = BTreeMap::new();
    let mut duplicates = 0usize;
    for (row, key) in ds.keys().iter().enumerate() {
        let key = key.key_string();
        if index.contains_key(&key) {
            debug!(source = %ds.source, key = ?key, row, "duplicate join key");
            duplicates += 1;
            continue;
        }
        index.insert(key, row);
    }
    if duplicates > 0 {
        warn!(
            source = %ds.source,
            duplicates, "duplicate join keys; keeping first occurrence"
        );
    }
    index
}

/// Full outer join of `left` and `right` on their normalized key columns.
///
/// Output columns are the left columns in order followed by the right
/// columns other than its key. A name present on both sides (the key
/// aside) gets `suffixes.0` on the left and `suffixes.1` on the right.
/// Rows come out sorted by key, missing keys first.
#[instrument(level = "info", skip_all, fields(left = %left.source, right = %right.source))]
pub fn outer_join(left: &Dataset, right: &Dataset, suffixes: (&str, &str)) -> MergedTable {
    let key_column = left.key_column.clone();

    let right_names: HashSet<&str> = right
        .columns
        .iter()
        .filter(|c| c.name != right.key_column)
        .map(|c| c.name.as_str())
        .collect();
    let left_names: HashSet<&str> = left
        .columns
        .iter()
        .filter(|c| c.name != left.key_column)
        .map(|c| c.name.as_str())
        .collect();

    let mut columns = Vec::new();
    // (column index in the source dataset, is_key)
    let mut left_plan = Vec::new();
    for (i, col) in left.columns.iter().enumerate() {
        if col.name == left.key_column {
            columns.push(key_column.clone());
            left_plan.push((i, true));
        } else if right_names.contains(col.name.as_str()) {
            columns.push(format!("{}{}", col.name, suffixes.0));
            left_plan.push((i, false));
        } else {
            columns.push(col.name.clone());
            left_plan.push((i, false));
        }
    }
    if !left.columns.iter().any(|c| c.name == left.key_column) {
        columns.push(key_column.clone());
        left_plan.push((usize::MAX, true));
    }

    let mut right_plan = Vec::new();
    for (i, col) in right.columns.iter().enumerate() {
        if col.name == right.key_column {
            continue;
        }
        if left_names.contains(col.name.as_str()) {
            columns.push(format!("{}{}", col.name, suffixes.1));
        } else {
            columns.push(col.name.clone());
        }
        right_plan.push(i);
    }

    let left_index = index_by_key(left);
    let right_index = index_by_key(right);
    let all_keys: BTreeSet<&Option<String>> =
        left_index.keys().chain(right_index.keys()).collect();

    let mut rows = Vec::with_capacity(all_keys.len());
    let mut matched = 0usize;
    for key in all_keys {
        let l = left_index.get(key).copied();
        let r = right_index.get(key).copied();
        if l.is_some() && r.is_some() {
            matched += 1;
        }

        let mut row = Vec::with_capacity(columns.len());
        for &(i, is_key) in &left_plan {
            if is_key {
                row.push(match key {
                    Some(k) => Cell::Text(k.clone()),
                    None => Cell::Missing,
                });
                continue;
            }
            row.push(match l {
                Some(at) => left.columns[i].cells[at].clone(),
                None => Cell::Missing,
            });
        }
        for &i in &right_plan {
            row.push(match r {
                Some(at) => right.columns[i].cells[at].clone(),
                None => Cell::Missing,
            });
        }
        rows.push(row);
    }

    info!(
        rows = rows.len(),
        matched,
        left_only = left_index.len() - matched,
        right_only = right_index.len() - matched,
        "outer join done"
    );

    MergedTable { columns, rows }
}

/// Drop rows missing any of `required`, in order. A column the merged
/// schema lacks is skipped with a warning rather than failing the run.
pub fn apply_required_filters(table: &mut MergedTable, required: &[String]) {
    for column in required {
        match table.drop_missing(column) {
            Some(dropped) => {
                info!(column = %column, dropped, remaining = table.len(), "filtered rows missing required column")
            }
            None => warn!(
                column = %column,
                "column not found after merge, skipping its filter"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Column;

    const KEY: &str = "Normalized_IPO_Name";

    fn dataset(source: &str, columns: Vec<(&str, Vec<Cell>)>) -> Dataset {
        let row_count = columns.first().map(|(_, c)| c.len()).unwrap_or(0);
        Dataset {
            source: source.into(),
            columns: columns
                .into_iter()
                .map(|(n, cells)| Column::new(n, cells))
                .collect(),
            key_column: KEY.into(),
            row_count,
        }
    }

    fn subscription() -> Dataset {
        dataset(
            "subscription",
            vec![
                ("IPO", vec!["Acme Closed".into(), "Beta (SME)".into()]),
                ("Total", vec![3.2.into(), Cell::Missing]),
                (KEY, vec!["Acme".into(), "Beta".into()]),
            ],
        )
    }

    fn gmp() -> Dataset {
        dataset(
            "gmp",
            vec![
                ("IPO", vec!["Acme".into(), "Gamma Open".into()]),
                ("IPO GMP", vec![45.0.into(), 12.0.into()]),
                (KEY, vec!["Acme".into(), "Gamma".into()]),
            ],
        )
    }

    #[test]
    fn every_key_appears_exactly_once() {
        let merged = outer_join(&subscription(), &gmp(), ("_sub", "_gmp"));

        let keys: Vec<&Cell> = merged.records().map(|r| r.get(KEY).unwrap()).collect();
        assert_eq!(
            keys,
            vec![&Cell::from("Acme"), &Cell::from("Beta"), &Cell::from("Gamma")]
        );
    }

    #[test]
    fn colliding_names_get_suffixes() {
        let merged = outer_join(&subscription(), &gmp(), ("_sub", "_gmp"));
        assert_eq!(
            merged.columns,
            vec!["IPO_sub", "Total", KEY, "IPO_gmp", "IPO GMP"]
        );
    }

    #[test]
    fn unmatched_side_is_missing() {
        let merged = outer_join(&subscription(), &gmp(), ("_sub", "_gmp"));
        let gamma = merged.records().nth(2).unwrap();
        assert_eq!(gamma.get("IPO_sub"), Some(&Cell::Missing));
        assert_eq!(gamma.get("IPO GMP"), Some(&Cell::Number(12.0)));

        let beta = merged.records().nth(1).unwrap();
        assert_eq!(beta.get("IPO_gmp"), Some(&Cell::Missing));
    }

    #[test]
    fn duplicate_keys_keep_first_row() {
        let left = dataset(
            "subscription",
            vec![
                ("Total", vec![1.0.into(), 2.0.into()]),
                (KEY, vec!["Acme".into(), "Acme".into()]),
            ],
        );
        let right = dataset("gmp", vec![(KEY, vec!["Acme".into()])]);

        let merged = outer_join(&left, &right, ("_sub", "_gmp"));
        assert_eq!(merged.len(), 1);
        assert_eq!(merged.rows[0][0], Cell::Number(1.0));
    }

    #[test]
    fn missing_keys_collapse_into_one_leading_row() {
        let left = dataset(
            "subscription",
            vec![
                ("Total", vec![1.0.into(), 2.0.into(), 3.0.into()]),
                (KEY, vec![Cell::Missing, "Acme".into(), Cell::Missing]),
            ],
        );
        let right = dataset(
            "gmp",
            vec![
                ("IPO GMP", vec![7.0.into()]),
                (KEY, vec![Cell::Missing]),
            ],
        );

        let merged = outer_join(&left, &right, ("_sub", "_gmp"));
        assert_eq!(merged.len(), 2);

        let first = merged.records().next().unwrap();
        assert_eq!(first.get(KEY), Some(&Cell::Missing));
        assert_eq!(first.get("Total"), Some(&Cell::Number(1.0)));
        assert_eq!(first.get("IPO GMP"), Some(&Cell::Number(7.0)));

        let second = merged.records().nth(1).unwrap();
        assert_eq!(second.get(KEY), Some(&Cell::from("Acme")));
        assert_eq!(second.get("IPO GMP"), Some(&Cell::Missing));
    }

    #[test]
    fn filters_drop_incomplete_rows() {
        let mut merged = outer_join(&subscription(), &gmp(), ("_sub", "_gmp"));
        apply_required_filters(&mut merged, &["Total".to_string(), "IPO GMP".to_string()]);

        assert_eq!(merged.len(), 1);
        let acme = merged.records().next().unwrap();
        assert_eq!(acme.get(KEY), Some(&Cell::from("Acme")));
        assert_eq!(acme.get("Total"), Some(&Cell::Number(3.2)));
        assert_eq!(acme.get("IPO GMP"), Some(&Cell::Number(45.0)));
    }

    #[test]
    fn filter_on_absent_column_drops_nothing() {
        let mut merged = outer_join(&subscription(), &gmp(), ("_sub", "_gmp"));
        assert_eq!(merged.drop_missing("Subscription Total"), None);

        apply_required_filters(&mut merged, &["Subscription Total".to_string()]);
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn records_serialize_in_column_order() -> anyhow::Result<()> {
        let mut merged = outer_join(&subscription(), &gmp(), ("_sub", "_gmp"));
        apply_required_filters(&mut merged, &["Total".to_string(), "IPO GMP".to_string()]);

        let json = serde_json::to_string(&merged)?;
        assert_eq!(
            json,
            r#"[{"IPO_sub":"Acme Closed","Total":3.2,"Normalized_IPO_Name":"Acme","IPO_gmp":"Acme","IPO GMP":45.0}]"#
        );
        Ok(())
    }
}
