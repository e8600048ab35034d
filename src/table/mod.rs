// src/table/mod.rs

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use tracing::{debug, instrument, trace, warn};

use crate::error::PipelineError;

static TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table").expect("table selector"));
static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("row selector"));
static HEADER_CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("th").expect("th selector"));
static DATA_CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("td").expect("td selector"));
static EMPHASIS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("strong, b").expect("emphasis selector"));

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawTable {
    /// Column names as the page presents them, before any width reconciliation.
    pub headers: Vec<String>,
    /// Every non-empty row after the header row, one string per `td`.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Widest row observed, or 0 for a table without data rows.
    pub fn max_row_width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// Why a page produced no usable table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractFailure {
    NoTable,
    NoHeaders,
}

impl ExtractFailure {
    pub fn into_error(self, url: &str) -> PipelineError {
        let url = url.to_string();
        match self {
            ExtractFailure::NoTable => PipelineError::NoTableFound { url },
            ExtractFailure::NoHeaders => PipelineError::NoHeadersFound { url },
        }
    }
}

/// Collapse an element's text nodes into one line: each fragment trimmed,
/// empty fragments dropped, the rest joined by a single space.
fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Headers come from `th` cells of the first row when there are any.
/// Otherwise each `td` contributes the text of its first `strong`/`b`
/// descendant, falling back to the cell's own text.
fn header_cells(first_row: ElementRef<'_>) -> Vec<String> {
    let ths: Vec<String> = first_row.select(&HEADER_CELL).map(element_text).collect();
    if !ths.is_empty() {
        trace!(count = ths.len(), "headers from th cells");
        return ths;
    }

    first_row
        .select(&DATA_CELL)
        .map(|td| match td.select(&EMPHASIS).next() {
            Some(strong) => element_text(strong),
            None => element_text(td),
        })
        .collect()
}

/// Locate the first `<table>` in `html` and split it into headers and data rows.
///
/// Row widths are left as found; reconciling them against the header count
/// is the dataset builder's job.
#[instrument(level = "debug", skip(html), fields(html_len = html.len()))]
pub fn extract_first_table(html: &str) -> Result<RawTable, ExtractFailure> {
    let document = Html::parse_document(html);

    let Some(table) = document.select(&TABLE).next() else {
        warn!("no table element in document");
        return Err(ExtractFailure::NoTable);
    };

    let mut rows_iter = table.select(&ROW);
    let headers = rows_iter.next().map(header_cells).unwrap_or_default();
    if headers.is_empty() {
        warn!("first table row yielded no headers");
        return Err(ExtractFailure::NoHeaders);
    }

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for row in rows_iter {
        let cells: Vec<String> = row.select(&DATA_CELL).map(element_text).collect();
        if cells.is_empty() {
            skipped += 1;
            continue;
        }
        rows.push(cells);
    }

    debug!(
        headers = headers.len(),
        rows = rows.len(),
        skipped,
        "extracted first table"
    );
    Ok(RawTable { headers, rows })
}
