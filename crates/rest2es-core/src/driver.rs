use tokio::task::JoinSet;
use tracing::{error, info};

use crate::checkpoint::CheckpointStore;
use crate::controller::PollController;
use crate::feed::Feed;
use crate::transport::{BulkSink, Fetcher};

/// Runs every configured feed as its own task.
///
/// Feeds share nothing; a stalled or failing feed does not affect the others.
/// Dropping the driver aborts all feeds.
#[derive(Default)]
pub struct FeedDriver {
    tasks: JoinSet<()>,
    feeds: Vec<String>,
}

impl FeedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a feed's perpetual loop.
    pub fn spawn<F, H, S, C>(&mut self, controller: PollController<F, H, S, C>)
    where
        F: Feed + 'static,
        H: Fetcher + 'static,
        S: BulkSink + 'static,
        C: CheckpointStore + 'static,
    {
        let name = controller.name().to_string();
        info!(feed = %name, "Spawning feed");
        self.feeds.push(name);
        self.tasks.spawn(controller.run());
    }

    /// Names of spawned feeds, in spawn order.
    pub fn feeds(&self) -> &[String] {
        &self.feeds
    }

    pub fn len(&self) -> usize {
        self.feeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feeds.is_empty()
    }

    /// Wait on all feeds. Only returns if every feed task has ended.
    pub async fn wait(mut self) {
        while let Some(result) = self.tasks.join_next().await {
            if let Err(e) = result {
                error!(error = %e, "Feed task terminated");
            }
        }
    }
}
