use thiserror::Error;

/// Errors that can occur when parsing or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("no feeds configured")]
    NoFeeds,

    #[error("feed name must not be empty")]
    EmptyName,

    #[error("duplicate feed name '{0}'")]
    DuplicateFeed(String),

    #[error("feed '{feed}': missing required field: {field}")]
    MissingField { feed: String, field: String },

    #[error("feed '{feed}': invalid url '{url}': {message}")]
    InvalidUrl {
        feed: String,
        url: String,
        message: String,
    },

    #[error("feed '{feed}': source.resume_param and source.resume_field must be set together")]
    IncompleteResume { feed: String },

    #[error("feed '{feed}': resume field '{field}' is not in the watchlist")]
    UnwatchedResumeField { feed: String, field: String },

    #[error("feed '{feed}': batch_size must be at least 1")]
    InvalidBatchSize { feed: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
