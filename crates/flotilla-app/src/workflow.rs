//! Multi-stage move workflow expressed as an explicit stage list.
//!
//! # Design
//! - The stage order and the skip rule for physical moves live in [`MoveStage::plan`], so
//!   they can be asserted without a daemon.
//! - Stage N+1 is dispatched only after stage N returned; the first error aborts the rest.
//! - Completed stages are not rolled back.

use flotilla_rtorrent::{MethodCall, RequestBuilder, RpcTransport, Value, methods};
use flotilla_torrent_core::TorrentResult;
use tracing::{debug, warn};

use crate::cleanup::is_removable;

/// One round-trip of the move workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveStage {
    /// Stop and close the torrents.
    Stop,
    /// Point the torrents at the destination directory.
    SetDirectory,
    /// Physically move payloads on the daemon host.
    MoveFiles,
    /// Re-verify payloads at the new location.
    CheckHash,
    /// Open and start the torrents again.
    Start,
}

impl MoveStage {
    /// Stages to run, in order. The hash check and restart run even without a physical move.
    #[must_use]
    pub fn plan(move_files: bool) -> Vec<Self> {
        let mut stages = vec![Self::Stop, Self::SetDirectory];
        if move_files {
            stages.push(Self::MoveFiles);
        }
        stages.extend([Self::CheckHash, Self::Start]);
        stages
    }

    /// Stage label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::SetDirectory => "set_directory",
            Self::MoveFiles => "move_files",
            Self::CheckHash => "check_hash",
            Self::Start => "start",
        }
    }
}

/// A resolved move: targets, destination, and the payload paths to relocate.
#[derive(Debug, Clone)]
pub struct MovePlan {
    hashes: Vec<String>,
    destination: String,
    sources: Vec<String>,
    stages: Vec<MoveStage>,
}

impl MovePlan {
    /// Build a plan. `sources` holds current base paths and is only consulted when
    /// `move_files` is set.
    #[must_use]
    pub fn new(
        hashes: Vec<String>,
        destination: String,
        move_files: bool,
        sources: Vec<String>,
    ) -> Self {
        Self {
            hashes,
            destination,
            sources,
            stages: MoveStage::plan(move_files),
        }
    }

    /// Stages this plan will run.
    #[must_use]
    pub fn stages(&self) -> &[MoveStage] {
        &self.stages
    }

    /// Calls issued for `stage`.
    #[must_use]
    pub fn calls(&self, stage: MoveStage) -> Vec<MethodCall> {
        match stage {
            MoveStage::Stop => methods::stop(&self.hashes),
            MoveStage::SetDirectory => methods::set_directory(&self.hashes, &self.destination),
            MoveStage::MoveFiles => {
                let mut calls = vec![methods::create_directory(&self.destination)];
                for source in &self.sources {
                    if is_removable(source) {
                        calls.push(methods::move_payload(source, &self.destination));
                    } else {
                        warn!(source = %source, "refusing to move payload from unsafe path");
                    }
                }
                calls
            }
            MoveStage::CheckHash => methods::check_hash(&self.hashes),
            MoveStage::Start => methods::start(&self.hashes),
        }
    }

    /// Run every stage in order and return the final stage's reply.
    ///
    /// # Errors
    ///
    /// Returns the first stage error; later stages are not dispatched.
    pub async fn run(&self, transport: &dyn RpcTransport) -> TorrentResult<Vec<Value>> {
        let mut last = Vec::new();
        for stage in &self.stages {
            let label = stage.as_str();
            last = RequestBuilder::new()
                .add_calls(self.calls(*stage))
                .on_complete(move |result| match result {
                    Ok(values) => debug!(stage = label, replies = values.len(), "move stage done"),
                    Err(err) => warn!(stage = label, error = %err, "move stage failed"),
                })
                .send(transport)
                .await?;
        }
        Ok(last)
    }
}
