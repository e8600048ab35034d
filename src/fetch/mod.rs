// src/fetch/mod.rs

use reqwest::blocking::Client;
use std::{collections::HashMap, time::Duration};
use tracing::{debug, info};

use crate::config::HttpConfig;
use crate::error::{PipelineError, Result};

/// Where page HTML comes from. The live run uses [`HttpSource`]; tests
/// swap in [`StaticSource`].
pub trait PageSource {
    fn fetch(&self, url: &str) -> Result<String>;
}

/// Blocking HTTP GET, one request per page, no retries.
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(cfg: &HttpConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(ua) = &cfg.user_agent {
            builder = builder.user_agent(ua.clone());
        }
        if let Some(secs) = cfg.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| PipelineError::Config(format!("building HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl PageSource for HttpSource {
    fn fetch(&self, url: &str) -> Result<String> {
        let fail = |source| PipelineError::Fetch {
            url: url.to_string(),
            source,
        };

        info!(%url, "fetching");
        let body = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .map_err(fail)?;
        debug!(%url, bytes = body.len(), "fetched");
        Ok(body)
    }
}

/// Serves pages from memory, keyed by URL.
#[derive(Debug, Default, Clone)]
pub struct StaticSource {
    pages: HashMap<String, String>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }
}

impl PageSource for StaticSource {
    fn fetch(&self, url: &str) -> Result<String> {
        self.pages.get(url).cloned().ok_or_else(|| {
            PipelineError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no page registered for {}", url),
            ))
        })
    }
}
