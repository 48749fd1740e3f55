pub mod batcher;
pub mod checkpoint;
pub mod context;
pub mod controller;
pub mod driver;
pub mod error;
pub mod feed;
pub mod loader;
pub mod mock;
pub mod transport;
pub mod types;
pub mod watermark;

pub use batcher::{BatchEntry, Batcher, IndexDirective, DEFAULT_BATCH_SIZE};
pub use checkpoint::{CheckpointStore, FileCheckpointStore};
pub use context::{compare_values, Context, FieldRange};
pub use controller::{Cycle, CycleOutcome, FeedSettings, FeedStats, PollController};
pub use driver::FeedDriver;
pub use error::{Error, Result};
pub use feed::Feed;
pub use loader::BatchLoader;
pub use transport::{BulkResponse, BulkSink, FetchResponse, Fetcher};
pub use types::{get_path, Document, ID_FIELD};
pub use watermark::WatermarkTracker;
