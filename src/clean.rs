// src/clean.rs

use tracing::trace;

use crate::dataset::Cell;

/// Tokens that stand for "no figure yet" on the source pages.
const MISSING_SENTINELS: &[&str] = &["-"];

/// Coerce one scraped cell to a number.
///
/// Currency symbols, thousands separators, percent signs and the like are
/// dropped; only ASCII digits, `.` and `-` are kept. Anything that still
/// does not parse becomes `Missing`.
pub fn clean_numeric_cell(cell: &Cell) -> Cell {
    let raw = match cell {
        Cell::Number(n) => return Cell::Number(*n),
        Cell::Missing => return Cell::Missing,
        Cell::Text(s) => s.as_str(),
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() || MISSING_SENTINELS.contains(&trimmed) {
        return Cell::Missing;
    }

    let digits: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if digits.is_empty() {
        return Cell::Missing;
    }

    match digits.parse::<f64>() {
        Ok(n) if n.is_finite() => Cell::Number(n),
        _ => {
            trace!(raw, stripped = %digits, "unparseable numeric cell");
            Cell::Missing
        }
    }
}

/// Clean a whole column; output has the same length as the input.
pub fn clean_numeric_column(cells: &[Cell]) -> Vec<Cell> {
    cells.iter().map(clean_numeric_cell).collect()
}
