use serde::Serialize;
use serde_json::{json, Value};

use crate::types::{Document, ID_FIELD};

/// Default number of documents per bulk request (200 directive/document entries).
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Target of a single index operation within a bulk request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexDirective {
    #[serde(rename = "_index")]
    pub index: String,
    #[serde(rename = "_type", skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl IndexDirective {
    /// The `{"index": {...}}` action line of a bulk request.
    pub fn to_action(&self) -> Value {
        json!({ "index": self })
    }
}

/// A directive/document pair queued for bulk indexing.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchEntry {
    pub directive: IndexDirective,
    pub document: Document,
}

impl BatchEntry {
    /// Build an entry for `doc`, moving an explicit `_id` field into the directive.
    pub fn new(index: &str, doc_type: Option<&str>, mut doc: Document) -> Self {
        let id = doc.remove(ID_FIELD).and_then(|v| match v {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });

        Self {
            directive: IndexDirective {
                index: index.to_string(),
                doc_type: doc_type.map(str::to_string),
                id,
            },
            document: doc,
        }
    }
}

/// Accumulates entries until the configured batch size is reached.
#[derive(Debug)]
pub struct Batcher {
    max_documents: usize,
    pending: Vec<BatchEntry>,
}

impl Batcher {
    pub fn new(max_documents: usize) -> Self {
        let max_documents = max_documents.max(1);
        Self {
            max_documents,
            pending: Vec::with_capacity(max_documents),
        }
    }

    /// Add an entry. Returns the full batch once the threshold is reached.
    pub fn push(&mut self, entry: BatchEntry) -> Option<Vec<BatchEntry>> {
        self.pending.push(entry);
        if self.pending.len() >= self.max_documents {
            Some(std::mem::replace(
                &mut self.pending,
                Vec::with_capacity(self.max_documents),
            ))
        } else {
            None
        }
    }

    /// Drain whatever is still pending (possibly nothing).
    pub fn take_remaining(&mut self) -> Vec<BatchEntry> {
        std::mem::take(&mut self.pending)
    }

    /// Number of documents waiting to be flushed.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn max_documents(&self) -> usize {
        self.max_documents
    }
}

impl Default for Batcher {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn make_entry(n: u64) -> BatchEntry {
        BatchEntry::new("quakes", None, doc(json!({"n": n})))
    }

    #[test]
    fn test_entry_strips_string_id() {
        let entry = BatchEntry::new(
            "earthquake",
            Some("event"),
            doc(json!({"_id": "us1000", "mag": 2.5})),
        );
        assert_eq!(entry.directive.id.as_deref(), Some("us1000"));
        assert_eq!(entry.directive.doc_type.as_deref(), Some("event"));
        assert!(!entry.document.contains_key("_id"));
        assert_eq!(entry.document.get("mag"), Some(&json!(2.5)));
    }

    #[test]
    fn test_entry_numeric_id_and_missing_id() {
        let entry = BatchEntry::new("idx", None, doc(json!({"_id": 42})));
        assert_eq!(entry.directive.id.as_deref(), Some("42"));

        let entry = BatchEntry::new("idx", None, doc(json!({"x": 1})));
        assert_eq!(entry.directive.id, None);
    }

    #[test]
    fn test_directive_action_line() {
        let entry = BatchEntry::new("earthquake", Some("event"), doc(json!({"_id": "a"})));
        assert_eq!(
            entry.directive.to_action(),
            json!({"index": {"_index": "earthquake", "_type": "event", "_id": "a"}})
        );

        let entry = BatchEntry::new("earthquake", None, doc(json!({})));
        assert_eq!(
            entry.directive.to_action(),
            json!({"index": {"_index": "earthquake"}})
        );
    }

    #[test]
    fn test_batcher_releases_full_batch() {
        let mut batcher = Batcher::new(3);

        assert!(batcher.push(make_entry(1)).is_none());
        assert!(batcher.push(make_entry(2)).is_none());
        let full = batcher.push(make_entry(3)).expect("third entry fills the batch");
        assert_eq!(full.len(), 3);
        assert_eq!(batcher.pending_len(), 0);

        assert!(batcher.push(make_entry(4)).is_none());
        let tail = batcher.take_remaining();
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].document.get("n"), Some(&json!(4)));
        assert!(batcher.take_remaining().is_empty());
    }

    #[test]
    fn test_default_batch_size() {
        let mut batcher = Batcher::default();
        assert_eq!(batcher.max_documents(), 100);
        for n in 0..99 {
            assert!(batcher.push(make_entry(n)).is_none());
        }
        assert_eq!(batcher.push(make_entry(99)).map(|b| b.len()), Some(100));
    }
}
