// src/output/mod.rs

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::{
    fs,
    io::{BufWriter, Write},
    path::Path,
};
use tempfile::NamedTempFile;
use tracing::info;

use crate::error::Result;
use crate::merge::MergedTable;

/// Write `table` as a pretty-printed JSON array of records.
///
/// The records go to a temp file in the target directory that is persisted
/// over `path` only once fully written. On any error the temp file is removed.
pub fn write_records<P: AsRef<Path>>(table: &MergedTable, path: P) -> Result<()> {
    let path = path.as_ref();
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            dir
        }
        None => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(&mut tmp);
        let mut ser = Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(b"    "));
        table.serialize(&mut ser)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    }
    tmp.persist(path).map_err(|e| e.error)?;

    info!(path = %path.display(), records = table.len(), "wrote merged records");
    Ok(())
}

fn pad_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, w)| format!("{:<width$}", cell, width = *w))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

/// Fixed-width text rendering of the whole table, one line per row.
/// Missing cells show as `NaN`.
pub fn render_table(table: &MergedTable) -> String {
    let rendered: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.iter().map(|c| c.to_string()).collect())
        .collect();

    let mut widths: Vec<usize> = table.columns.iter().map(|c| c.chars().count()).collect();
    for row in &rendered {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    out.push_str(&pad_line(table.columns.iter().map(String::as_str), &widths));
    out.push('\n');
    for row in &rendered {
        out.push_str(&pad_line(row.iter().map(String::as_str), &widths));
        out.push('\n');
    }
    if table.is_empty() {
        out.push_str("(no rows)\n");
    }
    out
}
