//! Workflow and inspector traits implemented by daemon adapters.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::TorrentResult;
use crate::model::{
    AddFiles, AddUrls, DaemonResponse, DeleteTorrents, MoveTorrents, SetFilePriority, SetPriority,
    SetTaxonomy, SpeedLimit, Taxonomy, TorrentDetails, TorrentRecord, TransferStats,
};

/// Workflow façade exposed to request handlers for torrent lifecycle control.
///
/// Every operation validates its input before dispatch and triggers one collection refresh
/// once the daemon has answered, whether the workflow succeeded or not.
#[async_trait]
pub trait TorrentWorkflow: Send + Sync {
    /// Admit torrents by URL or magnet link.
    async fn add_urls(&self, request: AddUrls) -> TorrentResult<DaemonResponse>;

    /// Admit torrents from metainfo files, one round-trip per file.
    async fn add_files(&self, request: AddFiles) -> TorrentResult<DaemonResponse>;

    /// Open and start torrents.
    async fn start(&self, hashes: Vec<String>) -> TorrentResult<DaemonResponse>;

    /// Stop and close torrents.
    async fn stop(&self, hashes: Vec<String>) -> TorrentResult<DaemonResponse>;

    /// Schedule a hash check.
    async fn check_hash(&self, hashes: Vec<String>) -> TorrentResult<DaemonResponse>;

    /// Relocate torrents, optionally moving their payload on disk.
    async fn move_torrents(&self, request: MoveTorrents) -> TorrentResult<DaemonResponse>;

    /// Remove torrents, optionally deleting their data once the daemon confirms.
    async fn delete_torrents(&self, request: DeleteTorrents) -> TorrentResult<DaemonResponse>;

    /// Change torrent priority.
    async fn set_priority(&self, request: SetPriority) -> TorrentResult<DaemonResponse>;

    /// Change priority of individual files within one torrent.
    async fn set_file_priority(&self, request: SetFilePriority) -> TorrentResult<DaemonResponse>;

    /// Replace the tag set of torrents.
    async fn set_taxonomy(&self, request: SetTaxonomy) -> TorrentResult<DaemonResponse>;

    /// Change a global throttle.
    async fn set_speed_limits(&self, limit: SpeedLimit) -> TorrentResult<DaemonResponse>;
}

/// Inspector trait used by consumers to read the mirrored torrent state.
#[async_trait]
pub trait TorrentInspector: Send + Sync {
    /// Retrieve one torrent record.
    async fn torrent(&self, hash: &str) -> Option<TorrentRecord>;

    /// Retrieve every torrent in snapshot order.
    async fn torrents(&self) -> Vec<TorrentRecord>;

    /// Retrieve all three aggregate indices at once.
    async fn taxonomy(&self) -> Taxonomy;

    /// Retrieve the torrent count per status flag.
    async fn status_counts(&self) -> BTreeMap<String, u64> {
        self.taxonomy().await.statuses
    }

    /// Retrieve the torrent count per tag.
    async fn tag_counts(&self) -> BTreeMap<String, u64> {
        self.taxonomy().await.tags
    }

    /// Retrieve the torrent count per tracker domain.
    async fn tracker_counts(&self) -> BTreeMap<String, u64> {
        self.taxonomy().await.trackers
    }

    /// Query peers, files, and trackers of one torrent from the daemon.
    async fn torrent_details(&self, hash: &str) -> TorrentResult<TorrentDetails>;

    /// Query global transfer statistics from the daemon.
    async fn transfer_stats(&self) -> TorrentResult<TransferStats>;
}
