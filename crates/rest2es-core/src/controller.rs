//! Poll cycle controller.
//!
//! Each cycle builds a target from the prior context, fetches it, transforms
//! and bulk-loads every row, and then decides which context to carry forward
//! and how long to wait:
//!
//! - no target: keep the prior context, wait the backoff
//! - fetch/parse/transform/load failure: keep the prior context, wait the backoff
//! - zero rows: keep the prior context, wait the backoff
//! - rows and a changed context: persist it, poll again immediately
//! - rows but an unchanged context: wait the backoff
//!
//! Batches flushed before a failure stay in the sink; the context of a failed
//! cycle is discarded.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::batcher::{BatchEntry, Batcher, DEFAULT_BATCH_SIZE};
use crate::checkpoint::CheckpointStore;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::feed::Feed;
use crate::loader::BatchLoader;
use crate::transport::{BulkSink, Fetcher};
use crate::watermark::WatermarkTracker;

/// Static settings of a single feed.
#[derive(Debug, Clone)]
pub struct FeedSettings {
    /// Feed name used in logs.
    pub name: String,
    /// Target index.
    pub index: String,
    /// Optional document type written into each directive.
    pub doc_type: Option<String>,
    /// Document fields whose min/max form the context.
    pub watchlist: Vec<String>,
    /// Wait after an idle or failed cycle.
    pub backoff: Duration,
    /// Documents per bulk request.
    pub batch_size: usize,
}

impl FeedSettings {
    pub fn new(name: impl Into<String>, index: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            index: index.into(),
            doc_type: None,
            watchlist: Vec::new(),
            backoff: Duration::from_secs(300),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn doc_type(mut self, doc_type: impl Into<String>) -> Self {
        self.doc_type = Some(doc_type.into());
        self
    }

    pub fn watch(mut self, field: impl Into<String>) -> Self {
        self.watchlist.push(field.into());
        self
    }

    pub fn backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }
}

/// What happened during a cycle.
#[derive(Debug)]
pub enum CycleOutcome {
    /// The feed produced no target.
    NoTarget,
    /// The source returned no rows.
    Empty,
    /// Rows were loaded.
    Loaded { rows: usize, changed: bool },
    /// The cycle failed and its partial work was discarded.
    Failed(Error),
}

/// Result of one cycle: the context to carry forward and the wait before the next.
#[derive(Debug)]
pub struct Cycle {
    pub context: Option<Context>,
    pub wait: Duration,
    pub outcome: CycleOutcome,
}

/// Running totals for a feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    pub cycles: u64,
    pub documents_loaded: u64,
    pub failures: u64,
    /// Failures on the bulk write side, a subset of `failures`.
    pub load_failures: u64,
}

/// Drives one feed: fetch, transform, load, checkpoint, sleep, repeat.
pub struct PollController<F, H, S, C> {
    settings: FeedSettings,
    feed: F,
    fetcher: H,
    loader: BatchLoader<S>,
    checkpoint: Option<C>,
    stats: FeedStats,
}

impl<F, H, S, C> PollController<F, H, S, C>
where
    F: Feed,
    H: Fetcher,
    S: BulkSink,
    C: CheckpointStore,
{
    pub fn new(settings: FeedSettings, feed: F, fetcher: H, sink: S, checkpoint: Option<C>) -> Self {
        let loader = BatchLoader::new(sink, settings.index.clone());
        Self {
            settings,
            feed,
            fetcher,
            loader,
            checkpoint,
            stats: FeedStats::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.settings.name
    }

    pub fn settings(&self) -> &FeedSettings {
        &self.settings
    }

    pub fn stats(&self) -> FeedStats {
        self.stats
    }

    /// Context to start from: the persisted one, if any.
    pub fn initial_context(&self) -> Option<Context> {
        self.checkpoint.as_ref().and_then(|store| store.load())
    }

    /// Run forever. There is no exit path short of process shutdown.
    pub async fn run(mut self) {
        let mut context = self.initial_context();
        info!(
            feed = %self.settings.name,
            index = %self.settings.index,
            resumed = context.is_some(),
            "Starting feed"
        );

        loop {
            let cycle = self.step(context).await;
            context = cycle.context;

            if cycle.wait.is_zero() {
                tokio::task::yield_now().await;
            } else {
                debug!(
                    feed = %self.settings.name,
                    wait_ms = cycle.wait.as_millis() as u64,
                    "Sleeping before next poll"
                );
                tokio::time::sleep(cycle.wait).await;
            }
        }
    }

    /// Run a single cycle starting from `prior`, persisting the new context if
    /// one was produced.
    pub async fn step(&mut self, prior: Option<Context>) -> Cycle {
        self.stats.cycles += 1;
        let backoff = self.settings.backoff;

        let Some(url) = self.feed.build_target(prior.as_ref()) else {
            info!(feed = %self.settings.name, "No target produced, sleeping before next poll");
            return Cycle {
                context: prior,
                wait: backoff,
                outcome: CycleOutcome::NoTarget,
            };
        };

        match self.poll(&url).await {
            Err(e) => {
                self.stats.failures += 1;
                if e.is_sink_error() {
                    self.stats.load_failures += 1;
                    warn!(
                        feed = %self.settings.name,
                        url = %url,
                        error = %e,
                        "Unable to load data, sleeping before next poll"
                    );
                } else {
                    warn!(
                        feed = %self.settings.name,
                        url = %url,
                        error = %e,
                        "Unable to pull data, sleeping before next poll"
                    );
                }
                Cycle {
                    context: prior,
                    wait: backoff,
                    outcome: CycleOutcome::Failed(e),
                }
            }
            Ok((_, 0)) => {
                info!(feed = %self.settings.name, "Received no results, sleeping before next poll");
                Cycle {
                    context: prior,
                    wait: backoff,
                    outcome: CycleOutcome::Empty,
                }
            }
            Ok((context, rows)) => {
                self.stats.documents_loaded += rows as u64;
                let changed = prior.as_ref() != Some(&context);

                if changed {
                    self.persist(&context).await;
                    Cycle {
                        context: Some(context),
                        wait: Duration::ZERO,
                        outcome: CycleOutcome::Loaded { rows, changed },
                    }
                } else {
                    info!(feed = %self.settings.name, rows, "Context unchanged, sleeping before next poll");
                    Cycle {
                        context: Some(context),
                        wait: backoff,
                        outcome: CycleOutcome::Loaded { rows, changed },
                    }
                }
            }
        }
    }

    /// Fetch `url`, load every row and return the cycle's context and row count.
    async fn poll(&self, url: &str) -> Result<(Context, usize)> {
        info!(feed = %self.settings.name, url = %url, "Polling data");

        let response = self.fetcher.fetch(url).await?;
        if !response.is_success() {
            return Err(Error::Status {
                status: response.status,
                url: url.to_string(),
            });
        }

        let body: Value =
            serde_json::from_slice(&response.body).map_err(|e| Error::Parse(e.to_string()))?;
        let rows = self.feed.extract_rows(body)?;
        info!(feed = %self.settings.name, count = rows.len(), "Received documents");

        let mut tracker = WatermarkTracker::new(self.settings.watchlist.clone());
        let mut batcher = Batcher::new(self.settings.batch_size);
        let doc_type = self.settings.doc_type.as_deref();
        let mut count = 0;

        for row in rows {
            let doc = self.feed.transform_record(row).await?;
            tracker.update(&doc);
            count += 1;

            let entry = BatchEntry::new(&self.settings.index, doc_type, doc);
            if let Some(full) = batcher.push(entry) {
                self.loader.flush(&full).await?;
            }
        }

        self.loader.flush(&batcher.take_remaining()).await?;

        Ok((tracker.into_context(), count))
    }

    async fn persist(&self, context: &Context) {
        let Some(store) = &self.checkpoint else {
            return;
        };
        if let Err(e) = store.save(context).await {
            warn!(feed = %self.settings.name, error = %e, "Unable to write context checkpoint");
        }
    }
}
