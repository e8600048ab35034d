//! Scrapes IPO subscription and grey-market-premium tables, joins them on a
//! normalized IPO name and writes the complete rows as JSON records.

pub mod clean;
pub mod config;
pub mod dataset;
pub mod error;
pub mod fetch;
pub mod merge;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod table;

pub use config::Config;
pub use error::{PipelineError, Result};
