mod env;
mod error;
mod feed;
mod validation;

pub use env::resolve_env;
pub use error::{ConfigError, ConfigResult};
pub use feed::{FeedConfig, FeedKind, HttpConfig, ProjectConfig, SinkConfig, SourceConfig};
pub use validation::{to_settings, validate_config, validate_feed};
