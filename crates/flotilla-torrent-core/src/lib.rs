#![forbid(unsafe_code)]
#![warn(
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Daemon-agnostic torrent model, error taxonomy, and workflow traits.
//!
//! Layout: `model/` (records, requests, aggregates), `service/` (workflow and inspector
//! traits), `error.rs` (error taxonomy), `validate.rs` (pre-dispatch input checks).

pub mod error;
pub mod model;
pub mod service;
pub mod validate;

pub use error::{CallFault, TorrentError, TorrentResult, TransportFailure};
pub use model::{
    AddFiles, AddUrls, DaemonResponse, DeleteTorrents, FilePriority, FileRecord, MoveTorrents,
    PeerRecord, ReconcileDiff, SetFilePriority, SetPriority, SetTaxonomy, SpeedLimit, Taxonomy,
    TorrentDetails, TorrentFilePayload, TorrentPriority, TorrentRecord, TorrentStatusFlag,
    TrackerRecord, TransferDirection, TransferStats,
};
pub use service::{TorrentInspector, TorrentWorkflow};
