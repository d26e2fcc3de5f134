//! Recording fake transport.
//!
//! Every batch is recorded as sent. Snapshot requests (`d.multicall2`) are answered from the
//! configured snapshot so background refreshes never consume scripted replies; every other
//! batch pops the next scripted reply, falling back to one `0` per call.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use flotilla_rtorrent::{CallOutcome, MethodCall, RpcTransport, Value};
use flotilla_torrent_core::{TorrentError, TorrentResult, TransportFailure};

const SNAPSHOT_METHOD: &str = "d.multicall2";

#[derive(Default)]
struct State {
    batches: Vec<Vec<MethodCall>>,
    replies: VecDeque<TorrentResult<Vec<CallOutcome>>>,
    snapshot: Option<Value>,
    unreachable: bool,
    snapshots_time_out: bool,
}

/// Transport double that records batches and replays scripted replies in order.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    state: Arc<Mutex<State>>,
}

impl RecordingTransport {
    /// Create a transport with no script and no snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Answer snapshot requests with `snapshot` from now on.
    pub fn set_snapshot(&self, snapshot: Value) {
        self.state().snapshot = Some(snapshot);
    }

    /// Queue per-call outcomes for the next non-snapshot batch.
    pub fn push_reply(&self, outcomes: Vec<CallOutcome>) {
        self.state().replies.push_back(Ok(outcomes));
    }

    /// Queue an error for the next non-snapshot batch.
    pub fn push_error(&self, error: TorrentError) {
        self.state().replies.push_back(Err(error));
    }

    /// Fail every batch with a connection error while `unreachable` is set.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state().unreachable = unreachable;
    }

    /// Fail only snapshot requests with a timeout while `time_out` is set.
    pub fn set_snapshots_time_out(&self, time_out: bool) {
        self.state().snapshots_time_out = time_out;
    }

    /// Every batch sent so far, snapshot requests included.
    #[must_use]
    pub fn batches(&self) -> Vec<Vec<MethodCall>> {
        self.state().batches.clone()
    }

    /// Batches other than snapshot requests.
    #[must_use]
    pub fn command_batches(&self) -> Vec<Vec<MethodCall>> {
        self.batches()
            .into_iter()
            .filter(|batch| !is_snapshot_request(batch))
            .collect()
    }

    /// Method names of every non-snapshot call, flattened in dispatch order.
    #[must_use]
    pub fn command_methods(&self) -> Vec<String> {
        self.command_batches()
            .into_iter()
            .flatten()
            .map(|call| call.method)
            .collect()
    }

    /// Number of snapshot requests received.
    #[must_use]
    pub fn snapshot_requests(&self) -> usize {
        self.state()
            .batches
            .iter()
            .filter(|batch| is_snapshot_request(batch))
            .count()
    }
}

fn is_snapshot_request(batch: &[MethodCall]) -> bool {
    batch
        .first()
        .is_some_and(|call| call.method == SNAPSHOT_METHOD)
}

#[async_trait]
impl RpcTransport for RecordingTransport {
    async fn send(&self, calls: &[MethodCall]) -> TorrentResult<Vec<CallOutcome>> {
        let mut state = self.state();
        state.batches.push(calls.to_vec());
        if state.unreachable {
            return Err(TorrentError::transport(
                TransportFailure::Connection,
                std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "daemon offline"),
            ));
        }
        if is_snapshot_request(calls) {
            if state.snapshots_time_out {
                return Err(TorrentError::transport(
                    TransportFailure::Timeout,
                    std::io::Error::new(std::io::ErrorKind::TimedOut, "snapshot timed out"),
                ));
            }
            let snapshot = state.snapshot.clone().unwrap_or(Value::Int(0));
            return Ok(vec![Ok(snapshot)]);
        }
        state
            .replies
            .pop_front()
            .unwrap_or_else(|| Ok(calls.iter().map(|_| Ok(Value::Int(0))).collect()))
    }
}
