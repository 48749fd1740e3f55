use tracing::info;

use crate::batcher::BatchEntry;
use crate::error::{Error, Result};
use crate::transport::BulkSink;

/// Flushes batches to a [`BulkSink`] and classifies the outcome.
pub struct BatchLoader<S> {
    sink: S,
    index: String,
}

impl<S: BulkSink> BatchLoader<S> {
    pub fn new(sink: S, index: impl Into<String>) -> Self {
        Self {
            sink,
            index: index.into(),
        }
    }

    /// Submit `entries` as a single bulk write. Returns the number of documents loaded.
    ///
    /// An empty batch is a no-op. A partial failure fails the whole batch.
    pub async fn flush(&self, entries: &[BatchEntry]) -> Result<usize> {
        if entries.is_empty() {
            return Ok(0);
        }

        info!(index = %self.index, documents = entries.len(), "Starting bulk load");

        let response = self.sink.bulk(entries).await?;
        if response.errors {
            return Err(Error::BulkItemFailures {
                failed: response.failed_items.len(),
                reasons: response.failed_items.join("; "),
            });
        }

        info!(index = %self.index, documents = entries.len(), "Bulk load complete");
        Ok(entries.len())
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}
