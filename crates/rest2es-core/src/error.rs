use thiserror::Error;

/// Errors that can occur while running a feed.
#[derive(Debug, Error)]
pub enum Error {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("unable to parse response body: {0}")]
    Parse(String),

    #[error("transform error: {0}")]
    Transform(String),

    #[error("bulk load failed: {0}")]
    Sink(String),

    #[error("bulk load failed for {failed} item(s): {reasons}")]
    BulkItemFailures { failed: usize, reasons: String },

    #[error("checkpoint error: {0}")]
    Checkpoint(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error came from the bulk write side of a cycle.
    pub fn is_sink_error(&self) -> bool {
        matches!(self, Error::Sink(_) | Error::BulkItemFailures { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
