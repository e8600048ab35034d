// src/pipeline.rs

use tracing::{info, instrument};

use crate::config::{Config, SourceConfig};
use crate::dataset::{build_dataset, Dataset};
use crate::error::{PipelineError, Result};
use crate::fetch::PageSource;
use crate::merge::{apply_required_filters, outer_join, MergedTable};
use crate::normalize::{AliasMatcher, NameMatcher, StatusTagMatcher};
use crate::output::write_records;
use crate::table::extract_first_table;

/// The name matcher a config asks for: the status/qualifier stripper,
/// wrapped in an alias table when one is configured.
pub fn matcher_for(cfg: &Config) -> Box<dyn NameMatcher> {
    if cfg.aliases.is_empty() {
        Box::new(StatusTagMatcher)
    } else {
        Box::new(AliasMatcher::new(StatusTagMatcher, &cfg.aliases))
    }
}

/// Fetch one page and turn its first table into a dataset.
#[instrument(level = "info", skip_all, fields(source = %src.name))]
pub fn load_source(
    src: &SourceConfig,
    key_column: &str,
    pages: &dyn PageSource,
    matcher: &dyn NameMatcher,
) -> Result<Dataset> {
    info!(url = %src.url, "fetching {} data", src.name);
    let html = pages.fetch(&src.url)?;

    let raw = extract_first_table(&html).map_err(|f| f.into_error(&src.url))?;
    if raw.rows.is_empty() {
        return Err(PipelineError::NoRowsFound {
            url: src.url.clone(),
        });
    }
    info!(rows = raw.rows.len(), "{} data fetched successfully", src.name);

    build_dataset(raw, &src.dataset_spec(key_column), matcher)
}

/// Fetch both pages, join them on the normalized name and drop incomplete rows.
///
/// Any fatal condition on either page ends the run before the merge.
pub fn collect(cfg: &Config, pages: &dyn PageSource, matcher: &dyn NameMatcher) -> Result<MergedTable> {
    let subscription = load_source(&cfg.subscription, &cfg.key_column, pages, matcher)?;
    let gmp = load_source(&cfg.gmp, &cfg.key_column, pages, matcher)?;

    info!("merging datasets");
    let mut merged = outer_join(
        &subscription,
        &gmp,
        (&cfg.subscription.suffix, &cfg.gmp.suffix),
    );
    apply_required_filters(&mut merged, &cfg.required_columns);
    Ok(merged)
}

/// Full run: [`collect`], then write the records to `cfg.output`.
/// Nothing is written when an earlier stage fails.
#[instrument(level = "info", skip_all, fields(output = %cfg.output.display()))]
pub fn run(cfg: &Config, pages: &dyn PageSource, matcher: &dyn NameMatcher) -> Result<MergedTable> {
    let merged = collect(cfg, pages, matcher)?;
    write_records(&merged, &cfg.output)?;
    Ok(merged)
}
