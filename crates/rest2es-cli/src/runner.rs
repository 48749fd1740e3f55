use std::future::Future;
use std::time::Duration;

use anyhow::{Context as _, Result};
use rest2es_config::{to_settings, FeedConfig, FeedKind, ProjectConfig};
use rest2es_core::{
    Context, Document, Feed, FeedDriver, FileCheckpointStore, PollController, Result as CoreResult,
};
use rest2es_feeds::{EarthquakeFeed, JsonFeed, JsonFeedConfig};
use rest2es_http::{ElasticsearchSink, FetcherConfig, HttpFetcher};
use serde_json::Value;
use tracing::info;

/// The feed kinds a config file can name.
pub enum FeedSource {
    Earthquake(EarthquakeFeed),
    Json(JsonFeed),
}

impl Feed for FeedSource {
    fn build_target(&self, context: Option<&Context>) -> Option<String> {
        match self {
            FeedSource::Earthquake(feed) => feed.build_target(context),
            FeedSource::Json(feed) => feed.build_target(context),
        }
    }

    fn extract_rows(&self, body: Value) -> CoreResult<Vec<Value>> {
        match self {
            FeedSource::Earthquake(feed) => feed.extract_rows(body),
            FeedSource::Json(feed) => feed.extract_rows(body),
        }
    }

    fn transform_record(&self, row: Value) -> impl Future<Output = CoreResult<Document>> + Send {
        async move {
            match self {
                FeedSource::Earthquake(feed) => feed.transform_record(row).await,
                FeedSource::Json(feed) => feed.transform_record(row).await,
            }
        }
    }
}

/// Build the feed behaviour for one `[[feed]]` entry.
pub fn build_feed(config: &FeedConfig) -> Result<FeedSource> {
    let source = &config.source;
    match config.kind {
        FeedKind::Earthquake => {
            let mut feed = match source.start_date {
                Some(date) => EarthquakeFeed::new(date),
                None => EarthquakeFeed::default(),
            };
            if let Some(url) = &source.url {
                feed = feed.with_base_url(url);
            }
            Ok(FeedSource::Earthquake(feed))
        }
        FeedKind::Json => {
            let url = source
                .url
                .clone()
                .with_context(|| format!("Feed '{}' has no source.url", config.name))?;
            let feed = JsonFeed::new(JsonFeedConfig {
                url,
                rows_pointer: source.rows_pointer.clone().unwrap_or_default(),
                id_field: source.id_field.clone(),
                resume_param: source.resume_param.clone(),
                resume_field: source.resume_field.clone(),
            })
            .with_context(|| format!("Feed '{}' has an invalid source.url", config.name))?;
            Ok(FeedSource::Json(feed))
        }
    }
}

fn fetcher_config(config: &ProjectConfig) -> FetcherConfig {
    FetcherConfig {
        connect_timeout: Duration::from_millis(config.http.connect_timeout_ms),
        request_timeout: config.http.request_timeout_ms.map(Duration::from_millis),
        ..FetcherConfig::default()
    }
}

/// Wire one controller per feed and hand them all to the driver.
pub fn spawn_feeds(config: &ProjectConfig) -> Result<FeedDriver> {
    let fetcher =
        HttpFetcher::new(&fetcher_config(config)).context("Failed to build HTTP client")?;

    let mut driver = FeedDriver::new();
    for feed_config in &config.feeds {
        let settings = to_settings(feed_config)?;
        let feed = build_feed(feed_config)?;
        let sink = ElasticsearchSink::new(&feed_config.sink.host)
            .with_context(|| format!("Feed '{}' has an invalid sink", feed_config.name))?;
        let checkpoint = feed_config.context_file.as_deref().map(FileCheckpointStore::new);

        let controller = PollController::new(settings, feed, fetcher.clone(), sink, checkpoint);
        driver.spawn(controller);
    }
    Ok(driver)
}

/// Run every feed until the process is stopped.
pub async fn run_feeds(config: ProjectConfig) -> Result<()> {
    let driver = spawn_feeds(&config)?;
    info!(feeds = driver.len(), "All feeds started");
    driver.wait().await;
    Ok(())
}
