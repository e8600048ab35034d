//! inspect_table.rs
//!
//! Prints the first table of a page as the scraper sees it, before any
//! width reconciliation or cleaning. Handy when a source page changes layout.
//!
//! Usage: `inspect_table <URL | HTML_FILE>`

use anyhow::{Context, Result};
use ipogmp::{
    config::HttpConfig,
    fetch::{HttpSource, PageSource},
    table::extract_first_table,
};
use std::{env, fs, path::Path, process::exit};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <URL | HTML_FILE>", args[0]);
        exit(1);
    }
    if let Err(e) = inspect(&args[1]) {
        eprintln!("Error: {:#}", e);
        exit(1);
    }
}

fn load_html(target: &str) -> Result<String> {
    if Path::new(target).is_file() {
        return fs::read_to_string(target).with_context(|| format!("reading {}", target));
    }
    let pages = HttpSource::new(&HttpConfig::default())?;
    Ok(pages.fetch(target)?)
}

fn inspect(target: &str) -> Result<()> {
    let html = load_html(target)?;
    let table = extract_first_table(&html).map_err(|f| f.into_error(target))?;

    let width = table.max_row_width();
    println!("=== First table: {} ===", target);
    println!("Headers:        {}", table.headers.len());
    println!("Data rows:      {}", table.rows.len());
    println!("Widest row:     {}", width);
    if table.headers.len() != width {
        println!(
            "Note:           header count differs from row width; headers will be {}",
            if table.headers.len() < width { "padded" } else { "truncated" }
        );
    }
    println!();
    println!("{}", serde_json::to_string_pretty(&table)?);
    Ok(())
}
