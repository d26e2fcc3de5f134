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

//! rTorrent adapter: XML-RPC multicall over SCGI, request composition, response processing,
//! and the in-memory torrent collection.
//!
//! Layout: `xmlrpc/` (value model and codec), `scgi.rs` (framing), `transport.rs` (transport
//! seam and SCGI client), `request.rs` (batch builder), `methods.rs` (call catalogue),
//! `processors.rs` (row tables), `collection.rs` (state mirror), `error.rs` (codec errors).

/// Mirrored torrent state and aggregates.
pub mod collection;
mod error;
/// Daemon call catalogue.
pub mod methods;
/// Positional row decoding tables.
pub mod processors;
/// Multicall batch builder.
pub mod request;
/// SCGI framing helpers.
pub mod scgi;
/// Transport seam and SCGI implementation.
pub mod transport;
/// XML-RPC codec.
pub mod xmlrpc;

pub use collection::TorrentCollection;
pub use request::RequestBuilder;
pub use transport::{
    CallOutcome, DEFAULT_MAX_PAYLOAD_BYTES, DEFAULT_MAX_REPLY_BYTES, DEFAULT_RPC_TIMEOUT, MethodCall,
    RpcTransport, ScgiEndpoint, ScgiTransport,
};
pub use xmlrpc::Value;
