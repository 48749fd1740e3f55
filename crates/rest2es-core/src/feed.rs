use std::future::Future;

use serde_json::Value;

use crate::context::Context;
use crate::error::Result;
use crate::types::Document;

/// Per-source behaviour of a feed.
///
/// One implementation per data source. The poll controller calls these in
/// order: `build_target` with the prior context, `extract_rows` on the parsed
/// response body, then `transform_record` once per row.
pub trait Feed: Send + Sync {
    /// URL to request next, or `None` when there is nothing to fetch right now.
    fn build_target(&self, context: Option<&Context>) -> Option<String>;

    /// Pull the ordered list of raw records out of a response body.
    fn extract_rows(&self, body: Value) -> Result<Vec<Value>>;

    /// Turn a raw record into a document. A `_id` field, if present, becomes
    /// the document identifier in the sink.
    fn transform_record(&self, row: Value) -> impl Future<Output = Result<Document>> + Send;
}
