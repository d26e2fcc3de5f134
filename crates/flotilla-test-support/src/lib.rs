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

//! Shared test helpers used across integration suites.
//! Layout: fixtures.rs (snapshot row builders), mocks.rs (recording fake transport).

pub mod fixtures;
pub mod mocks;

pub use fixtures::{TorrentRow, snapshot};
pub use mocks::RecordingTransport;
