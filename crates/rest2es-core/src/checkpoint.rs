use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::context::Context;
use crate::error::{Error, Result};

/// Durable storage for a feed's context.
pub trait CheckpointStore: Send + Sync {
    /// Load the persisted context. Absent, unreadable or corrupt state yields `None`.
    fn load(&self) -> Option<Context>;

    /// Persist `context`, replacing whatever was stored before.
    fn save(&self, context: &Context) -> impl Future<Output = Result<()>> + Send;
}

/// Stores a context as pretty-printed JSON in a single file.
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    path: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn load(&self) -> Option<Context> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Unable to read context file");
                return None;
            }
        };

        match serde_json::from_str::<Context>(&data) {
            Ok(context) => {
                info!(path = %self.path.display(), context = %data.trim(), "Loaded previous context");
                Some(context)
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Unable to parse context file");
                None
            }
        }
    }

    fn save(&self, context: &Context) -> impl Future<Output = Result<()>> + Send {
        let json = serde_json::to_string_pretty(context);
        let path = self.path.clone();
        let tmp = self.temp_path();

        async move {
            let json = json?;
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }

            tokio::fs::write(&tmp, json).await?;
            tokio::fs::rename(&tmp, &path).await.map_err(|e| {
                Error::Checkpoint(format!(
                    "failed to move {} into place: {}",
                    tmp.display(),
                    e
                ))
            })?;
            Ok(())
        }
    }
}
