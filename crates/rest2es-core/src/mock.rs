//! In-memory collaborators for tests.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};

use crate::batcher::BatchEntry;
use crate::checkpoint::CheckpointStore;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::transport::{BulkResponse, BulkSink, FetchResponse, Fetcher};

/// A mock bulk sink that records every accepted request.
#[derive(Clone, Default)]
pub struct MockSink {
    state: Arc<Mutex<SinkState>>,
}

#[derive(Default)]
struct SinkState {
    /// Requests the sink accepted, in order.
    requests: Vec<Vec<BatchEntry>>,
    /// Number of bulk calls seen, including failed ones.
    calls: usize,
    /// Calls numbered at or above this fail (0-based).
    fail_from_call: Option<usize>,
    /// Transport failure message.
    fail_with: Option<String>,
    /// Per-item failure reason reported with `errors: true`.
    item_failure: Option<String>,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every call fails at the transport level.
    pub fn failing(error_message: impl Into<String>) -> Self {
        let sink = Self::new();
        {
            let mut state = sink.state.lock().unwrap();
            state.fail_with = Some(error_message.into());
            state.fail_from_call = Some(0);
        }
        sink
    }

    /// A sink that accepts the first `successes` calls and fails the rest.
    pub fn failing_after(successes: usize, error_message: impl Into<String>) -> Self {
        let sink = Self::new();
        {
            let mut state = sink.state.lock().unwrap();
            state.fail_with = Some(error_message.into());
            state.fail_from_call = Some(successes);
        }
        sink
    }

    /// A sink that answers every call with a per-item failure.
    pub fn reporting_item_failures(reason: impl Into<String>) -> Self {
        let sink = Self::new();
        {
            let mut state = sink.state.lock().unwrap();
            state.item_failure = Some(reason.into());
            state.fail_from_call = Some(0);
        }
        sink
    }

    /// Requests that were accepted.
    pub fn requests(&self) -> Vec<Vec<BatchEntry>> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Number of accepted requests.
    pub fn total_requests(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }

    /// Number of bulk calls, including failed ones.
    pub fn total_calls(&self) -> usize {
        self.state.lock().unwrap().calls
    }

    /// Documents across all accepted requests.
    pub fn total_documents(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .map(|r| r.len())
            .sum()
    }

    /// Stop failing.
    pub fn recover(&self) {
        let mut state = self.state.lock().unwrap();
        state.fail_from_call = None;
    }
}

impl BulkSink for MockSink {
    fn bulk(&self, entries: &[BatchEntry]) -> impl Future<Output = Result<BulkResponse>> + Send {
        let state = self.state.clone();
        let entries = entries.to_vec();
        async move {
            let mut state = state.lock().unwrap();
            let call = state.calls;
            state.calls += 1;

            if state.fail_from_call.is_some_and(|from| call >= from) {
                if let Some(ref reason) = state.item_failure {
                    return Ok(BulkResponse {
                        errors: true,
                        failed_items: vec![reason.clone()],
                    });
                }
                let message = state.fail_with.clone().unwrap_or_default();
                return Err(Error::Sink(message));
            }

            state.requests.push(entries);
            Ok(BulkResponse::default())
        }
    }
}

/// A mock fetcher serving queued responses.
///
/// Once the queue is drained every request receives `200 []`.
#[derive(Clone, Default)]
pub struct MockFetcher {
    state: Arc<Mutex<FetchState>>,
}

#[derive(Default)]
struct FetchState {
    responses: VecDeque<std::result::Result<FetchResponse, String>>,
    requested: Vec<String>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a 200 response with a JSON body.
    pub fn respond_json(self, body: serde_json::Value) -> Self {
        self.respond(200, body.to_string())
    }

    /// Queue a response with an arbitrary status and body.
    pub fn respond(self, status: u16, body: impl Into<Vec<u8>>) -> Self {
        self.state
            .lock()
            .unwrap()
            .responses
            .push_back(Ok(FetchResponse::new(status, body)));
        self
    }

    /// Queue a transport failure.
    pub fn fail(self, error_message: impl Into<String>) -> Self {
        self.state
            .lock()
            .unwrap()
            .responses
            .push_back(Err(error_message.into()));
        self
    }

    /// URLs requested so far.
    pub fn requested_urls(&self) -> Vec<String> {
        self.state.lock().unwrap().requested.clone()
    }
}

impl Fetcher for MockFetcher {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchResponse>> + Send {
        let state = self.state.clone();
        let url = url.to_string();
        async move {
            let mut state = state.lock().unwrap();
            state.requested.push(url);
            match state.responses.pop_front() {
                Some(Ok(response)) => Ok(response),
                Some(Err(message)) => Err(Error::Transport(message)),
                None => Ok(FetchResponse::new(200, "[]")),
            }
        }
    }
}

/// A checkpoint store kept in memory, recording every save.
#[derive(Clone, Default)]
pub struct MemoryCheckpointStore {
    state: Arc<Mutex<CheckpointState>>,
}

#[derive(Default)]
struct CheckpointState {
    current: Option<Context>,
    saves: Vec<Context>,
    fail_with: Option<String>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `context`.
    pub fn with_context(context: Context) -> Self {
        let store = Self::new();
        store.state.lock().unwrap().current = Some(context);
        store
    }

    /// A store whose saves fail.
    pub fn failing(error_message: impl Into<String>) -> Self {
        let store = Self::new();
        store.state.lock().unwrap().fail_with = Some(error_message.into());
        store
    }

    /// Contexts passed to `save`, in order (including failed attempts).
    pub fn saves(&self) -> Vec<Context> {
        self.state.lock().unwrap().saves.clone()
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn load(&self) -> Option<Context> {
        self.state.lock().unwrap().current.clone()
    }

    fn save(&self, context: &Context) -> impl Future<Output = Result<()>> + Send {
        let result = {
            let mut state = self.state.lock().unwrap();
            state.saves.push(context.clone());

            match state.fail_with.clone() {
                Some(error) => Err(Error::Checkpoint(error)),
                None => {
                    state.current = Some(context.clone());
                    Ok(())
                }
            }
        };
        async move { result }
    }
}
