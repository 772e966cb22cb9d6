//! Pluggable rule configuration sources

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use super::RulesConfig;

/// A place a rule configuration can be fetched from. Implementations only
/// produce the raw config; validation and activation happen in the store.
#[async_trait]
pub trait RuleSource: Send + Sync {
    async fn fetch(&self) -> Result<RulesConfig>;

    /// Human-readable source description for logs
    fn describe(&self) -> String;
}

/// Rules from a local JSON file
pub struct FileRuleSource {
    path: PathBuf,
}

impl FileRuleSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl RuleSource for FileRuleSource {
    async fn fetch(&self) -> Result<RulesConfig> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("reading {}", self.path.display()))?;
        let config: RulesConfig = serde_json::from_str(&raw)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        debug!(path = %self.path.display(), assets = config.assets.len(), "rules fetched");
        Ok(config)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Rules from a remote endpoint serving the same JSON shape, e.g. a
/// published spreadsheet export.
pub struct HttpRuleSource {
    client: Client,
    url: String,
}

impl HttpRuleSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .expect("Failed to create HTTP client"),
            url: url.into(),
        }
    }
}

#[async_trait]
impl RuleSource for HttpRuleSource {
    async fn fetch(&self) -> Result<RulesConfig> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("requesting {}", self.url))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("rule source error: {} - {}", status, body));
        }

        let config: RulesConfig = response
            .json()
            .await
            .with_context(|| format!("parsing rules from {}", self.url))?;
        debug!(url = %self.url, assets = config.assets.len(), "rules fetched");
        Ok(config)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}
