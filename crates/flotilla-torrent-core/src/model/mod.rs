//! Core torrent domain types and DTOs shared across the workspace.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Status flags a torrent can exhibit at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TorrentStatusFlag {
    /// Incomplete and started.
    Downloading,
    /// Complete and started.
    Seeding,
    /// Closed or explicitly stopped.
    Stopped,
    /// Hash check in progress.
    Checking,
    /// Daemon reported a message for the torrent.
    Error,
    /// Transferring data in either direction.
    Active,
    /// No data moving in either direction.
    Inactive,
}

impl TorrentStatusFlag {
    /// Stable key used by the status aggregate.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Downloading => "downloading",
            Self::Seeding => "seeding",
            Self::Stopped => "stopped",
            Self::Checking => "checking",
            Self::Error => "error",
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

/// Mirror of one torrent as last reported by the daemon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TorrentRecord {
    /// Upper-cased info hash.
    pub hash: String,
    /// Display name.
    pub name: String,
    /// Base path of the payload (file or directory).
    pub base_path: String,
    /// Directory the payload lives in.
    pub directory: String,
    /// Total payload size in bytes.
    pub size_bytes: u64,
    /// Bytes verified so far.
    pub bytes_done: u64,
    /// Current upload rate in bytes per second.
    pub upload_rate: u64,
    /// Current download rate in bytes per second.
    pub download_rate: u64,
    /// Total uploaded bytes.
    pub upload_total: u64,
    /// Total downloaded bytes.
    pub download_total: u64,
    /// Share ratio.
    pub ratio: f64,
    /// Torrent priority (0 = off .. 3 = high).
    pub priority: i64,
    /// User tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Tracker domains.
    #[serde(default)]
    pub tracker_hosts: Vec<String>,
    /// Daemon message, usually an error description.
    pub message: String,
    /// Derived status flags.
    #[serde(default)]
    pub statuses: BTreeSet<TorrentStatusFlag>,
}

impl TorrentRecord {
    /// Whether the record carries the given status flag.
    #[must_use]
    pub fn has_status(&self, flag: TorrentStatusFlag) -> bool {
        self.statuses.contains(&flag)
    }
}

/// Peer connected to a torrent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeerRecord {
    /// Remote address.
    pub address: String,
    /// Client identification string.
    pub client_version: String,
    /// Percentage of the payload the peer has.
    pub completed_percent: u64,
    /// Download rate from the peer in bytes per second.
    pub download_rate: u64,
    /// Upload rate to the peer in bytes per second.
    pub upload_rate: u64,
    /// Whether the connection is encrypted.
    pub is_encrypted: bool,
    /// Whether the peer initiated the connection.
    pub is_incoming: bool,
}

/// Individual file exposed by a torrent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Index of the file within the torrent.
    pub index: usize,
    /// Relative path of the file within the payload.
    pub path: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Chunks completed.
    pub completed_chunks: u64,
    /// Chunks in total.
    pub size_chunks: u64,
    /// Daemon file priority (0 = off, 1 = normal, 2 = high).
    pub priority: i64,
}

/// Tracker attached to a torrent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerRecord {
    /// Announce URL.
    pub url: String,
    /// Tracker group.
    pub group: i64,
    /// Tracker protocol type reported by the daemon (1 = http, 2 = udp, 3 = dht).
    pub tracker_type: i64,
    /// Whether the tracker is enabled.
    pub is_enabled: bool,
}

/// Peers, files, and trackers of one torrent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TorrentDetails {
    /// Connected peers.
    pub peers: Vec<PeerRecord>,
    /// Payload files.
    pub files: Vec<FileRecord>,
    /// Trackers.
    pub trackers: Vec<TrackerRecord>,
}

/// Global transfer statistics and throttles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferStats {
    /// Current global download rate in bytes per second.
    pub download_rate: u64,
    /// Current global upload rate in bytes per second.
    pub upload_rate: u64,
    /// Total bytes downloaded this session.
    pub download_total: u64,
    /// Total bytes uploaded this session.
    pub upload_total: u64,
    /// Download throttle in bytes per second (0 = unlimited).
    pub download_throttle: u64,
    /// Upload throttle in bytes per second (0 = unlimited).
    pub upload_throttle: u64,
}

/// Torrent counts grouped by status, tag, and tracker domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxonomy {
    /// Torrent count per status flag.
    pub statuses: BTreeMap<String, u64>,
    /// Torrent count per tag.
    pub tags: BTreeMap<String, u64>,
    /// Torrent count per tracker domain.
    pub trackers: BTreeMap<String, u64>,
}

/// Identifiers that changed between two reconciliation cycles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileDiff {
    /// Identifiers observed for the first time.
    pub added: Vec<String>,
    /// Identifiers absent from the new snapshot.
    pub removed: Vec<String>,
    /// Identifiers whose record changed.
    pub updated: Vec<String>,
}

impl ReconcileDiff {
    /// Whether the snapshot changed nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.updated.is_empty()
    }
}

/// Per-call results of the last batch a workflow dispatched, converted to JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DaemonResponse {
    /// Results in call order.
    pub results: Vec<serde_json::Value>,
}

/// Request payload for adding torrents by URL or magnet link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddUrls {
    /// Torrent URLs or magnet URIs.
    pub urls: Vec<String>,
    /// Destination directory on the daemon host.
    pub destination: String,
    /// Whether the torrents start immediately.
    #[serde(default)]
    pub start: bool,
    /// Tags applied on admission.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Raw metainfo file uploaded by a caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TorrentFilePayload {
    /// Original file name, used for logging only.
    pub name: String,
    /// Bencoded metainfo bytes.
    pub bytes: Vec<u8>,
}

/// Request payload for adding torrents from metainfo files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddFiles {
    /// Metainfo files, submitted one per round-trip.
    pub files: Vec<TorrentFilePayload>,
    /// Destination directory on the daemon host.
    pub destination: String,
    /// Whether the torrents start immediately.
    #[serde(default)]
    pub start: bool,
    /// Tags applied on admission.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Request payload for relocating torrents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveTorrents {
    /// Torrents to relocate.
    pub hashes: Vec<String>,
    /// New storage directory.
    pub destination: String,
    /// Whether the payload is physically moved on the daemon host.
    #[serde(default)]
    pub move_files: bool,
}

/// Request payload for removing torrents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteTorrents {
    /// Torrents to remove.
    pub hashes: Vec<String>,
    /// Whether downloaded data is deleted after the daemon confirms removal.
    #[serde(default)]
    pub delete_data: bool,
}

/// Torrent priority levels understood by the daemon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TorrentPriority {
    /// Do not transfer.
    Off,
    /// Low priority.
    Low,
    /// Default priority.
    #[default]
    Normal,
    /// High priority.
    High,
}

impl TorrentPriority {
    /// Numeric value sent to the daemon.
    #[must_use]
    pub const fn as_daemon_value(self) -> i64 {
        match self {
            Self::Off => 0,
            Self::Low => 1,
            Self::Normal => 2,
            Self::High => 3,
        }
    }
}

/// File priority levels understood by the daemon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilePriority {
    /// Do not download the file.
    Off,
    /// Default priority.
    #[default]
    Normal,
    /// Download before other files.
    High,
}

impl FilePriority {
    /// Numeric value sent to the daemon.
    #[must_use]
    pub const fn as_daemon_value(self) -> i64 {
        match self {
            Self::Off => 0,
            Self::Normal => 1,
            Self::High => 2,
        }
    }
}

/// Request payload for torrent priority changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetPriority {
    /// Target torrents.
    pub hashes: Vec<String>,
    /// New priority.
    pub priority: TorrentPriority,
}

/// Request payload for file priority changes within one torrent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetFilePriority {
    /// Target torrent.
    pub hash: String,
    /// File indices to update.
    pub indices: Vec<usize>,
    /// New priority.
    pub priority: FilePriority,
}

/// Request payload replacing the tag set of torrents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetTaxonomy {
    /// Target torrents.
    pub hashes: Vec<String>,
    /// Replacement tags (an empty list clears them).
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Direction of a global throttle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferDirection {
    /// Download throttle.
    Download,
    /// Upload throttle.
    Upload,
}

/// Request payload for a global throttle change.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SpeedLimit {
    /// Throttled direction.
    pub direction: TransferDirection,
    /// Limit in bytes per second (0 = unlimited).
    pub bytes_per_second: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_status_checks_derived_flags() {
        let record = TorrentRecord {
            statuses: BTreeSet::from([TorrentStatusFlag::Seeding, TorrentStatusFlag::Inactive]),
            ..TorrentRecord::default()
        };
        assert!(record.has_status(TorrentStatusFlag::Seeding));
        assert!(!record.has_status(TorrentStatusFlag::Stopped));
    }

    #[test]
    fn priorities_map_to_daemon_values() {
        assert_eq!(TorrentPriority::Off.as_daemon_value(), 0);
        assert_eq!(TorrentPriority::default().as_daemon_value(), 2);
        assert_eq!(TorrentPriority::High.as_daemon_value(), 3);
        assert_eq!(FilePriority::Off.as_daemon_value(), 0);
        assert_eq!(FilePriority::High.as_daemon_value(), 2);
    }

    #[test]
    fn status_flags_serialize_as_aggregate_keys() {
        for flag in [
            TorrentStatusFlag::Downloading,
            TorrentStatusFlag::Seeding,
            TorrentStatusFlag::Stopped,
            TorrentStatusFlag::Checking,
            TorrentStatusFlag::Error,
            TorrentStatusFlag::Active,
            TorrentStatusFlag::Inactive,
        ] {
            let json = serde_json::to_value(flag).expect("serialize flag");
            assert_eq!(json, serde_json::Value::String(flag.as_str().to_string()));
        }
    }

    #[test]
    fn reconcile_diff_reports_emptiness() {
        assert!(ReconcileDiff::default().is_empty());
        let diff = ReconcileDiff {
            removed: vec!["ABC".into()],
            ..ReconcileDiff::default()
        };
        assert!(!diff.is_empty());
    }
}
