use std::collections::HashSet;
use std::time::Duration;

use rest2es_core::FeedSettings;
use url::Url;

use crate::error::{ConfigError, ConfigResult};
use crate::feed::{FeedConfig, FeedKind, ProjectConfig};

/// Validate a project configuration.
pub fn validate_config(config: &ProjectConfig) -> ConfigResult<()> {
    if config.feeds.is_empty() {
        return Err(ConfigError::NoFeeds);
    }

    let mut seen = HashSet::new();
    for feed in &config.feeds {
        validate_feed(feed)?;
        if !seen.insert(feed.name.as_str()) {
            return Err(ConfigError::DuplicateFeed(feed.name.clone()));
        }
    }
    Ok(())
}

/// Validate a single feed.
pub fn validate_feed(feed: &FeedConfig) -> ConfigResult<()> {
    if feed.name.trim().is_empty() {
        return Err(ConfigError::EmptyName);
    }
    if feed.sink.index.trim().is_empty() {
        return Err(missing(feed, "sink.index"));
    }
    if feed.batch_size == 0 {
        return Err(ConfigError::InvalidBatchSize {
            feed: feed.name.clone(),
        });
    }

    validate_http_url(feed, &feed.sink.host)?;

    match feed.kind {
        FeedKind::Json => {
            let url = feed
                .source
                .url
                .as_deref()
                .ok_or_else(|| missing(feed, "source.url"))?;
            validate_http_url(feed, url)?;
            if feed.source.resume_param.is_some() != feed.source.resume_field.is_some() {
                return Err(ConfigError::IncompleteResume {
                    feed: feed.name.clone(),
                });
            }
            if let Some(field) = &feed.source.resume_field {
                // The resume value is read from the context, which only holds watched fields.
                if !feed.watchlist.contains(field) {
                    return Err(ConfigError::UnwatchedResumeField {
                        feed: feed.name.clone(),
                        field: field.clone(),
                    });
                }
            }
        }
        FeedKind::Earthquake => {
            if let Some(url) = feed.source.url.as_deref() {
                validate_http_url(feed, url)?;
            }
        }
    }

    Ok(())
}

/// Convert a validated feed config to core settings.
pub fn to_settings(feed: &FeedConfig) -> ConfigResult<FeedSettings> {
    validate_feed(feed)?;

    let mut settings = FeedSettings::new(&feed.name, &feed.sink.index)
        .backoff(Duration::from_millis(feed.sleep_ms))
        .batch_size(feed.batch_size);
    if let Some(doc_type) = &feed.sink.doc_type {
        settings = settings.doc_type(doc_type);
    }
    for field in &feed.watchlist {
        settings = settings.watch(field);
    }
    Ok(settings)
}

fn validate_http_url(feed: &FeedConfig, url: &str) -> ConfigResult<()> {
    let invalid = |message: String| ConfigError::InvalidUrl {
        feed: feed.name.clone(),
        url: url.to_string(),
        message,
    };

    let parsed = Url::parse(url).map_err(|e| invalid(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(format!("unsupported scheme '{}'", other))),
    }
}

fn missing(feed: &FeedConfig, field: &str) -> ConfigError {
    ConfigError::MissingField {
        feed: feed.name.clone(),
        field: field.to_string(),
    }
}
