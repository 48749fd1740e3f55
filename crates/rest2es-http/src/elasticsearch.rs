use std::future::Future;

use rest2es_core::{BatchEntry, BulkResponse, BulkSink, Error};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::{HttpError, HttpResult};

/// Bulk sink writing to an Elasticsearch-compatible `_bulk` endpoint.
#[derive(Clone)]
pub struct ElasticsearchSink {
    client: reqwest::Client,
    bulk_url: Url,
}

/// The parts of a `_bulk` response we care about.
#[derive(Debug, Deserialize)]
struct BulkApiResponse {
    #[serde(default)]
    errors: bool,
    #[serde(default)]
    items: Vec<Value>,
}

impl ElasticsearchSink {
    /// Create a sink for the cluster at `host` (e.g. `http://localhost:9200`).
    pub fn new(host: &str) -> HttpResult<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| HttpError::Client(e.to_string()))?;
        Self::with_client(client, host)
    }

    pub fn with_client(client: reqwest::Client, host: &str) -> HttpResult<Self> {
        let bulk_url = bulk_url(host)?;
        Ok(Self { client, bulk_url })
    }

    pub fn bulk_url(&self) -> &Url {
        &self.bulk_url
    }

    async fn post(client: reqwest::Client, url: Url, body: String) -> HttpResult<BulkResponse> {
        let response = client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(HttpError::ServerError {
                status: status.as_u16(),
                message: text,
            });
        }

        parse_bulk_response(&text)
    }
}

impl BulkSink for ElasticsearchSink {
    fn bulk(
        &self,
        entries: &[BatchEntry],
    ) -> impl Future<Output = rest2es_core::Result<BulkResponse>> + Send {
        let client = self.client.clone();
        let url = self.bulk_url.clone();
        let body = render_bulk_body(entries);
        let count = entries.len();

        async move {
            let body = body.map_err(|e| Error::Sink(e.to_string()))?;
            debug!(url = %url, documents = count, bytes = body.len(), "Posting bulk request");
            Self::post(client, url, body)
                .await
                .map_err(|e| Error::Sink(e.to_string()))
        }
    }
}

/// `{host}/_bulk`, keeping any path prefix on the host.
fn bulk_url(host: &str) -> HttpResult<Url> {
    let invalid = |message: String| HttpError::InvalidUrl {
        url: host.to_string(),
        message,
    };

    let mut base = Url::parse(host).map_err(|e| invalid(e.to_string()))?;
    if !matches!(base.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", base.scheme())));
    }
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("_bulk").map_err(|e| invalid(e.to_string()))
}

/// Render entries as newline-delimited action/document pairs.
pub fn render_bulk_body(entries: &[BatchEntry]) -> HttpResult<String> {
    let mut body = String::new();
    for entry in entries {
        body.push_str(&serde_json::to_string(&entry.directive.to_action())?);
        body.push('\n');
        body.push_str(&serde_json::to_string(&entry.document)?);
        body.push('\n');
    }
    Ok(body)
}

fn parse_bulk_response(text: &str) -> HttpResult<BulkResponse> {
    let response: BulkApiResponse = serde_json::from_str(text)?;
    let failed_items = response.items.iter().filter_map(item_failure).collect();
    Ok(BulkResponse {
        errors: response.errors,
        failed_items,
    })
}

/// Describe a failed item such as `{"index": {"_id": "x", "status": 400, "error": {...}}}`.
fn item_failure(item: &Value) -> Option<String> {
    let result = item.as_object()?.values().next()?;
    let error = result.get("error")?;

    let id = result.get("_id").and_then(Value::as_str).unwrap_or("-");
    let kind = error.get("type").and_then(Value::as_str).unwrap_or("unknown");
    let reason = error
        .get("reason")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string());
    Some(format!("{}: {}: {}", id, kind, reason))
}
