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

//! Telemetry primitives shared across the Flotilla workspace.
//!
//! Layout: `init.rs` (subscriber installation), `context.rs` (process and operation spans),
//! `error.rs` (telemetry failures).

pub mod context;
pub mod error;
pub mod init;

pub use context::{GlobalContextGuard, current_operation_id, with_operation_context};
pub use error::{Result, TelemetryError};
pub use init::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, build_sha, init_logging};
