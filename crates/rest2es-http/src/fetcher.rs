use std::future::Future;
use std::time::Duration;

use rest2es_core::{Error, FetchResponse, Fetcher};
use tracing::debug;

use crate::error::{HttpError, HttpResult};

/// Settings for the source-side HTTP client.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Time allowed to establish a connection.
    pub connect_timeout: Duration,
    /// Overall request timeout. `None` leaves requests unbounded.
    pub request_timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            request_timeout: None,
            user_agent: concat!("rest2es/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// [`Fetcher`] backed by reqwest.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &FetcherConfig) -> HttpResult<Self> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone());
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| HttpError::Client(e.to_string()))?;
        Ok(Self { client })
    }

    async fn get(client: reqwest::Client, url: String) -> HttpResult<FetchResponse> {
        let response = client.get(&url).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        debug!(url = %url, status, bytes = body.len(), "Fetched");
        Ok(FetchResponse::new(status, body.to_vec()))
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> impl Future<Output = rest2es_core::Result<FetchResponse>> + Send {
        let client = self.client.clone();
        let url = url.to_string();
        async move {
            Self::get(client, url)
                .await
                .map_err(|e| Error::Transport(e.to_string()))
        }
    }
}
