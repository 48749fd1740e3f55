use std::future::Future;

use rest2es_core::{get_path, Context, Document, Error, Feed, Result, ID_FIELD};
use serde_json::Value;
use url::Url;

/// Settings of a generic JSON feed.
#[derive(Debug, Clone, Default)]
pub struct JsonFeedConfig {
    /// Endpoint to poll.
    pub url: String,
    /// JSON pointer to the row array (`/data/items`). Empty means the body itself.
    pub rows_pointer: String,
    /// Document field copied into the document id.
    pub id_field: Option<String>,
    /// Query parameter carrying the resume position.
    pub resume_param: Option<String>,
    /// Watched field whose `max` is sent as `resume_param`.
    pub resume_field: Option<String>,
}

/// Polls a fixed JSON endpoint, optionally resuming after the highest value seen.
#[derive(Debug, Clone)]
pub struct JsonFeed {
    url: Url,
    config: JsonFeedConfig,
}

impl JsonFeed {
    pub fn new(config: JsonFeedConfig) -> std::result::Result<Self, url::ParseError> {
        let url = Url::parse(&config.url)?;
        Ok(Self { url, config })
    }

    fn resume_value(&self, context: Option<&Context>) -> Option<(&str, String)> {
        let param = self.config.resume_param.as_deref()?;
        let field = self.config.resume_field.as_deref()?;
        let max = &context?.get(field)?.max;
        let value = match max {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Some((param, value))
    }
}

impl Feed for JsonFeed {
    fn build_target(&self, context: Option<&Context>) -> Option<String> {
        let mut url = self.url.clone();
        if let Some((param, value)) = self.resume_value(context) {
            url.query_pairs_mut().append_pair(param, &value);
        }
        Some(url.into())
    }

    fn extract_rows(&self, mut body: Value) -> Result<Vec<Value>> {
        let pointer = self.config.rows_pointer.as_str();
        match body.pointer_mut(pointer).map(Value::take) {
            Some(Value::Array(rows)) => Ok(rows),
            Some(_) => Err(Error::Parse(format!("'{}' is not an array", pointer))),
            None => Err(Error::Parse(format!("'{}' not found in response", pointer))),
        }
    }

    fn transform_record(&self, row: Value) -> impl Future<Output = Result<Document>> + Send {
        let id_field = self.config.id_field.clone();
        async move {
            let mut doc = match row {
                Value::Object(doc) => doc,
                other => return Err(Error::Transform(format!("row is not an object: {}", other))),
            };
            if let Some(id) = id_field.and_then(|field| get_path(&doc, &field).cloned()) {
                doc.insert(ID_FIELD.into(), id);
            }
            Ok(doc)
        }
    }
}
