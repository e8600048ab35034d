// src/config.rs

use serde::{Deserialize, Deserializer, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

use crate::dataset::DatasetSpec;
use crate::error::{PipelineError, Result};

pub const SUBSCRIPTION_URL: &str = "https://ipowatch.in/ipo-subscription-status-today/";
pub const GMP_URL: &str = "https://ipowatch.in/ipo-grey-market-premium-latest-ipo-gmp/";
pub const KEY_COLUMN: &str = "Normalized_IPO_Name";
pub const OUTPUT_FILE: &str = "merged_ipo_data.json";

/// One page to scrape and how to read its table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceConfig {
    /// Label used in logs and errors.
    pub name: String,
    pub url: String,
    /// Position of the IPO name column.
    pub identity_column: usize,
    pub numeric_columns: Vec<String>,
    /// Appended to this source's column names that collide after the merge.
    pub suffix: String,
}

impl SourceConfig {
    pub fn subscription() -> Self {
        Self {
            name: "subscription".into(),
            url: SUBSCRIPTION_URL.into(),
            identity_column: 0,
            numeric_columns: ["QIB", "NII", "RII", "Total", "Applications"]
                .map(String::from)
                .to_vec(),
            suffix: "_sub".into(),
        }
    }

    pub fn gmp() -> Self {
        Self {
            name: "gmp".into(),
            url: GMP_URL.into(),
            identity_column: 0,
            numeric_columns: ["IPO GMP", "IPO Price", "Listing Gain"]
                .map(String::from)
                .to_vec(),
            suffix: "_gmp".into(),
        }
    }

    pub fn dataset_spec(&self, key_column: &str) -> DatasetSpec {
        DatasetSpec {
            source: self.name.clone(),
            identity_column: self.identity_column,
            numeric_columns: self.numeric_columns.clone(),
            key_column: key_column.to_string(),
        }
    }
}

/// A source block as written in YAML. Whatever it leaves out comes from the
/// built-in source it overrides.
#[derive(Debug, Deserialize)]
struct SourceOverride {
    name: Option<String>,
    url: Option<String>,
    identity_column: Option<usize>,
    numeric_columns: Option<Vec<String>>,
    suffix: Option<String>,
}

impl SourceOverride {
    fn apply(self, mut base: SourceConfig) -> SourceConfig {
        if let Some(name) = self.name {
            base.name = name;
        }
        if let Some(url) = self.url {
            base.url = url;
        }
        if let Some(idx) = self.identity_column {
            base.identity_column = idx;
        }
        if let Some(cols) = self.numeric_columns {
            base.numeric_columns = cols;
        }
        if let Some(suffix) = self.suffix {
            base.suffix = suffix;
        }
        base
    }
}

fn subscription_overlay<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<SourceConfig, D::Error> {
    Ok(SourceOverride::deserialize(d)?.apply(SourceConfig::subscription()))
}

fn gmp_overlay<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<SourceConfig, D::Error> {
    Ok(SourceOverride::deserialize(d)?.apply(SourceConfig::gmp()))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    pub user_agent: Option<String>,
    /// Per-request timeout; the transport default applies when unset.
    pub timeout_secs: Option<u64>,
}

/// Everything a run needs. Every field has a default, so an empty YAML
/// document is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(deserialize_with = "subscription_overlay")]
    pub subscription: SourceConfig,
    #[serde(deserialize_with = "gmp_overlay")]
    pub gmp: SourceConfig,
    pub key_column: String,
    /// Rows missing any of these after the merge are dropped, in order.
    pub required_columns: Vec<String>,
    pub output: PathBuf,
    pub http: HttpConfig,
    /// Normalized name -> canonical name, for issues the two pages spell differently.
    pub aliases: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            subscription: SourceConfig::subscription(),
            gmp: SourceConfig::gmp(),
            key_column: KEY_COLUMN.into(),
            required_columns: vec!["Total".into(), "IPO GMP".into()],
            output: PathBuf::from(OUTPUT_FILE),
            http: HttpConfig::default(),
            aliases: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Read a YAML config file. Fields it leaves out keep their defaults,
    /// down to single fields of a source block.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let cfg: Config = serde_yaml::from_str(&text)?;
        cfg.validate()?;
        debug!(path = %path.display(), "loaded config");
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.key_column.trim().is_empty() {
            return Err(PipelineError::Config("key_column must not be empty".into()));
        }
        if self.subscription.suffix == self.gmp.suffix {
            return Err(PipelineError::Config(format!(
                "sources share the suffix {:?}; merged column names would collide",
                self.subscription.suffix
            )));
        }
        for src in [&self.subscription, &self.gmp] {
            url::Url::parse(&src.url).map_err(|e| {
                PipelineError::Config(format!("{}: bad url {:?}: {}", src.name, src.url, e))
            })?;
        }
        Ok(())
    }
}
