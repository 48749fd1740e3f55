mod elasticsearch;
mod error;
mod fetcher;

pub use elasticsearch::{render_bulk_body, ElasticsearchSink};
pub use error::{HttpError, HttpResult};
pub use fetcher::{FetcherConfig, HttpFetcher};
