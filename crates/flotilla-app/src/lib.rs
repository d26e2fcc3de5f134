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

//! Flotilla application wiring: configuration, the bridge service object, the poller, and
//! the boot sequence.
//!
//! Layout: `bootstrap.rs` (service wiring), `config.rs` (flags and environment),
//! `orchestrator.rs` (workflows and reconciliation), `workflow.rs` (move stages),
//! `poller.rs` (recurring refresh), `cleanup.rs` (payload removal), `error.rs`.

/// Application bootstrap and environment loading.
pub mod bootstrap;
/// Post-success payload removal.
pub mod cleanup;
/// Command-line and environment configuration.
pub mod config;
/// Application error type.
pub mod error;
/// Bridge service object.
pub mod orchestrator;
/// Recurring snapshot poller.
pub mod poller;
/// Multi-stage workflows.
pub mod workflow;

pub use bootstrap::run_app;
pub use config::{AppConfig, CliArgs};
pub use error::{AppError, AppResult};
pub use orchestrator::TorrentClient;
pub use poller::{Poller, PollerState};
