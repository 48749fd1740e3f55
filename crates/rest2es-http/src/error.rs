use thiserror::Error;

/// Errors from the HTTP transports.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("network error: {0}")]
    Network(String),

    #[error("server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("invalid url '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("failed to build http client: {0}")]
    Client(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<reqwest::Error> for HttpError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => HttpError::ServerError {
                status: status.as_u16(),
                message: e.to_string(),
            },
            None => HttpError::Network(e.to_string()),
        }
    }
}

pub type HttpResult<T> = Result<T, HttpError>;
