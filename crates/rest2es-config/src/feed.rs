use chrono::NaiveDate;
use serde::Deserialize;

use crate::env::resolve_env;
use crate::error::ConfigResult;

/// Project configuration from rest2es.toml.
#[derive(Debug, Deserialize)]
pub struct ProjectConfig {
    /// HTTP client settings shared by every feed's fetcher.
    #[serde(default)]
    pub http: HttpConfig,
    /// Feeds to run, one loop each.
    #[serde(rename = "feed", default)]
    pub feeds: Vec<FeedConfig>,
}

impl ProjectConfig {
    /// Parse a project config and resolve `${VAR}` references in hosts and urls.
    pub fn parse(toml_str: &str) -> ConfigResult<Self> {
        let mut config: ProjectConfig = toml::from_str(toml_str)?;
        for feed in &mut config.feeds {
            feed.resolve_env();
        }
        Ok(config)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Overall request timeout; unset leaves requests unbounded.
    pub request_timeout_ms: Option<u64>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: None,
        }
    }
}

/// One polled source and the index it loads into.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Stable identifier used in logs.
    pub name: String,
    /// Which feed implementation to use.
    pub kind: FeedKind,
    /// Backoff after an empty or failed poll, in milliseconds.
    #[serde(default = "default_sleep_ms")]
    pub sleep_ms: u64,
    /// Checkpoint file; without one the context lives only in memory.
    pub context_file: Option<String>,
    /// Document fields tracked into the context.
    #[serde(default)]
    pub watchlist: Vec<String>,
    /// Documents per bulk request.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    pub sink: SinkConfig,
    #[serde(default)]
    pub source: SourceConfig,
}

impl FeedConfig {
    fn resolve_env(&mut self) {
        self.sink.host = resolve_env(&self.sink.host);
        if let Some(url) = &self.source.url {
            self.source.url = Some(resolve_env(url));
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    /// USGS earthquake catalog.
    Earthquake,
    /// Generic JSON endpoint.
    Json,
}

/// Index the feed writes to.
#[derive(Debug, Clone, Deserialize)]
pub struct SinkConfig {
    /// Cluster base url, e.g. `http://localhost:9200`.
    pub host: String,
    pub index: String,
    /// Document type, for clusters that still use mapping types.
    #[serde(rename = "type")]
    pub doc_type: Option<String>,
}

/// Kind-specific source settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceConfig {
    /// Endpoint url (json feeds; optional override for earthquake).
    pub url: Option<String>,
    /// First day to load (earthquake).
    pub start_date: Option<NaiveDate>,
    /// JSON pointer to the row array (json).
    pub rows_pointer: Option<String>,
    /// Field copied into the document id (json).
    pub id_field: Option<String>,
    /// Query parameter carrying the resume position (json).
    pub resume_param: Option<String>,
    /// Watched field whose max is sent as the resume position (json).
    pub resume_field: Option<String>,
}

fn default_sleep_ms() -> u64 {
    300_000
}

fn default_batch_size() -> usize {
    rest2es_core::DEFAULT_BATCH_SIZE
}

fn default_connect_timeout_ms() -> u64 {
    30_000
}
