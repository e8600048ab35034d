// src/dataset/types.rs

use serde::{Serialize, Serializer};
use std::fmt;

/// One table cell. Scraped cells start as `Text`; cleaned numeric columns
/// hold `Number` or `Missing`; padding and unmatched join sides are `Missing`.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Missing,
}

impl Cell {
    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// Join-key form of the cell; `None` for missing cells, which all
    /// land on the same key.
    pub fn key_string(&self) -> Option<String> {
        match self {
            Cell::Text(s) => Some(s.clone()),
            Cell::Number(n) => Some(n.to_string()),
            Cell::Missing => None,
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Missing => f.write_str("NaN"),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Text(s) => serializer.serialize_str(s),
            Cell::Number(n) => serializer.serialize_f64(*n),
            Cell::Missing => serializer.serialize_none(),
        }
    }
}

/// A named column of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, cells: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            cells,
        }
    }
}

/// A scraped table as named columns of equal length, plus the derived
/// join-key column.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// Label used in logs, e.g. "subscription".
    pub source: String,
    pub columns: Vec<Column>,
    /// Name of the column holding the normalized join key.
    pub key_column: String,
    pub row_count: usize,
}

impl Dataset {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// The join-key cells, one per row. Empty if the key column was never set.
    pub fn keys(&self) -> &[Cell] {
        self.column(&self.key_column)
            .map(|c| c.cells.as_slice())
            .unwrap_or(&[])
    }

    /// Cell at `row` in column `name`.
    pub fn get(&self, row: usize, name: &str) -> Option<&Cell> {
        self.column(name).and_then(|c| c.cells.get(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_serialize_as_plain_json() {
        let cells = vec![Cell::from("Acme"), Cell::from(45.0), Cell::Missing];
        let json = serde_json::to_string(&cells).unwrap();
        assert_eq!(json, r#"["Acme",45.0,null]"#);
    }

    #[test]
    fn key_string_groups_missing() {
        assert_eq!(Cell::from("Acme").key_string(), Some("Acme".to_string()));
        assert_eq!(Cell::Missing.key_string(), None);
    }
}
