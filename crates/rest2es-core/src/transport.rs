use std::future::Future;

use crate::batcher::BatchEntry;
use crate::error::Result;

/// Raw HTTP response handed back by a [`Fetcher`].
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues GET requests for a feed. No retries at this layer.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchResponse>> + Send;
}

/// Result of a bulk write.
#[derive(Debug, Clone, Default)]
pub struct BulkResponse {
    /// Set when at least one item in the request failed.
    pub errors: bool,
    /// Failure reasons of individual items, if the sink reports them.
    pub failed_items: Vec<String>,
}

/// Write side of a feed: accepts ordered directive/document pairs in one request.
pub trait BulkSink: Send + Sync {
    fn bulk(&self, entries: &[BatchEntry]) -> impl Future<Output = Result<BulkResponse>> + Send;
}
