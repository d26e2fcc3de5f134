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

//! Notification bus for the Flotilla bridge.
//!
//! The bus carries typed events describing collection reconciliations, workflow
//! outcomes, and daemon health so an external dispatch layer can broadcast them.
//! Internally it uses `tokio::broadcast` with a bounded buffer plus a replay ring;
//! when the channel overflows the oldest events are dropped.
//!
//! Layout: `payloads.rs` (event types), `routing.rs` (bus and subscriptions).

pub mod payloads;
pub mod routing;

pub use payloads::{DEFAULT_REPLAY_CAPACITY, Event, EventEnvelope, EventId};
pub use routing::{EventBus, EventStream};
