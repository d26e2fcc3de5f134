//! Transport seam and the SCGI implementation that talks to the daemon.
//!
//! # Design
//! - One connection per batch; no pooling, no retries.
//! - The whole exchange runs under one deadline so a hung daemon surfaces as a timeout.
//! - Oversized payloads are rejected before connecting; replies are read up to a ceiling.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use flotilla_torrent_core::{CallFault, TorrentError, TorrentResult};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use crate::error::{CodecError, connection_failed, timed_out};
use crate::scgi::{frame_request, split_reply};
use crate::xmlrpc::{Value, decode_multicall, encode_multicall};

/// Default per-call deadline.
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(30);

/// Largest request body the daemon accepts by default.
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 524_288;

/// Largest reply read from the daemon by default.
pub const DEFAULT_MAX_REPLY_BYTES: usize = 64 * 1024 * 1024;

/// One method invocation inside a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    /// Daemon method name.
    pub method: String,
    /// Positional parameters.
    pub params: Vec<Value>,
}

impl MethodCall {
    /// Start a call with no parameters.
    #[must_use]
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            params: Vec::new(),
        }
    }

    /// Append one positional parameter.
    #[must_use]
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }

    /// Append several string parameters.
    #[must_use]
    pub fn args<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Value>,
    {
        self.params.extend(values.into_iter().map(Into::into));
        self
    }
}

/// Result of one call within a batch: its value or the daemon's fault for it.
pub type CallOutcome = Result<Value, CallFault>;

/// Dispatches a batch of calls as one round-trip.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Send `calls` and return one outcome per call, aligned with the request order.
    async fn send(&self, calls: &[MethodCall]) -> TorrentResult<Vec<CallOutcome>>;
}

/// Where the daemon's SCGI listener lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScgiEndpoint {
    /// TCP listener.
    Tcp {
        /// Host name or address.
        host: String,
        /// Port number.
        port: u16,
    },
    /// Unix domain socket.
    Unix(PathBuf),
}

impl std::fmt::Display for ScgiEndpoint {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tcp { host, port } => write!(formatter, "{host}:{port}"),
            Self::Unix(path) => write!(formatter, "unix:{}", path.display()),
        }
    }
}

/// SCGI transport speaking XML-RPC multicall.
#[derive(Debug, Clone)]
pub struct ScgiTransport {
    endpoint: ScgiEndpoint,
    timeout: Duration,
    max_payload_bytes: usize,
    max_reply_bytes: usize,
}

impl ScgiTransport {
    /// Build a transport with default deadline and payload ceiling.
    #[must_use]
    pub const fn new(endpoint: ScgiEndpoint) -> Self {
        Self {
            endpoint,
            timeout: DEFAULT_RPC_TIMEOUT,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            max_reply_bytes: DEFAULT_MAX_REPLY_BYTES,
        }
    }

    /// Override the per-call deadline.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the payload ceiling.
    #[must_use]
    pub const fn with_max_payload_bytes(mut self, max_payload_bytes: usize) -> Self {
        self.max_payload_bytes = max_payload_bytes;
        self
    }

    /// Override the reply ceiling.
    #[must_use]
    pub const fn with_max_reply_bytes(mut self, max_reply_bytes: usize) -> Self {
        self.max_reply_bytes = max_reply_bytes;
        self
    }

    /// Configured endpoint.
    #[must_use]
    pub const fn endpoint(&self) -> &ScgiEndpoint {
        &self.endpoint
    }

    async fn round_trip(&self, frame: &[u8]) -> std::io::Result<Vec<u8>> {
        match &self.endpoint {
            ScgiEndpoint::Tcp { host, port } => {
                let stream = TcpStream::connect((host.as_str(), *port)).await?;
                exchange(stream, frame, self.max_reply_bytes).await
            }
            #[cfg(unix)]
            ScgiEndpoint::Unix(path) => {
                let stream = tokio::net::UnixStream::connect(path).await?;
                exchange(stream, frame, self.max_reply_bytes).await
            }
            #[cfg(not(unix))]
            ScgiEndpoint::Unix(_) => Err(std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                "unix sockets are not available on this platform",
            )),
        }
    }
}

/// Reads at most one byte past `limit` so an oversized reply is detectable.
async fn exchange<S>(mut stream: S, frame: &[u8], limit: usize) -> std::io::Result<Vec<u8>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(frame).await?;
    stream.flush().await?;
    stream.shutdown().await?;
    let mut reply = Vec::new();
    let cap = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
    (&mut stream).take(cap).read_to_end(&mut reply).await?;
    Ok(reply)
}

#[async_trait]
impl RpcTransport for ScgiTransport {
    async fn send(&self, calls: &[MethodCall]) -> TorrentResult<Vec<CallOutcome>> {
        if calls.is_empty() {
            return Err(TorrentError::validation("calls", "empty"));
        }
        let payload = encode_multicall(calls);
        if payload.len() > self.max_payload_bytes {
            return Err(TorrentError::validation(
                "payload",
                "exceeds daemon payload ceiling",
            ));
        }
        let frame = frame_request(payload.as_bytes());
        debug!(
            endpoint = %self.endpoint,
            calls = calls.len(),
            bytes = payload.len(),
            "dispatching multicall"
        );
        let reply = tokio::time::timeout(self.timeout, self.round_trip(&frame))
            .await
            .map_err(timed_out)?
            .map_err(connection_failed)?;
        if reply.len() > self.max_reply_bytes {
            return Err(CodecError::ReplyTooLarge {
                limit: self.max_reply_bytes,
            }
            .into());
        }
        let body = split_reply(&reply)?;
        decode_multicall(body, calls.len())
    }
}
