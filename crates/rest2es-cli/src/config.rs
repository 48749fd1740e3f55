use std::fmt::Write;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rest2es_config::{validate_config, FeedKind, ProjectConfig};

/// Read, parse and validate rest2es.toml.
pub fn load_config(path: &Path) -> Result<ProjectConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config = ProjectConfig::parse(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    validate_config(&config).with_context(|| format!("Invalid config: {}", path.display()))?;

    Ok(config)
}

/// One line per feed, for `rest2es check`.
pub fn describe(config: &ProjectConfig) -> String {
    let mut out = String::new();
    for feed in &config.feeds {
        let kind = match feed.kind {
            FeedKind::Earthquake => "earthquake",
            FeedKind::Json => "json",
        };
        let checkpoint = feed.context_file.as_deref().unwrap_or("(memory only)");
        let _ = writeln!(
            out,
            "{}: {} -> {}/{} every {}ms, watching [{}], checkpoint {}",
            feed.name,
            kind,
            feed.sink.host,
            feed.sink.index,
            feed.sleep_ms,
            feed.watchlist.join(", "),
            checkpoint
        );
    }
    out
}
