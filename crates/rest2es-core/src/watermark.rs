use tracing::debug;

use crate::context::{Context, FieldRange};
use crate::types::{get_path, Document};

/// Accumulates min/max values of watched fields over a batch of documents.
///
/// The fold is commutative: feeding the same documents in any order yields
/// the same context.
#[derive(Debug, Clone)]
pub struct WatermarkTracker {
    watchlist: Vec<String>,
    context: Context,
}

impl WatermarkTracker {
    pub fn new(watchlist: Vec<String>) -> Self {
        Self {
            watchlist,
            context: Context::new(),
        }
    }

    /// Record the watched fields of a document. Absent or null fields are ignored.
    pub fn update(&mut self, doc: &Document) {
        for field in &self.watchlist {
            let Some(value) = get_path(doc, field) else {
                continue;
            };
            if value.is_null() {
                continue;
            }

            match self.context.get_mut(field) {
                Some(range) => {
                    if !range.widen(value) {
                        debug!(field = %field, value = %value, "Skipping value not comparable with tracked range");
                    }
                }
                None => self.context.insert(field.clone(), FieldRange::point(value.clone())),
            }
        }
    }

    /// Snapshot of the context accumulated so far.
    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn into_context(self) -> Context {
        self.context
    }

    pub fn watchlist(&self) -> &[String] {
        &self.watchlist
    }
}
