//! Error types for torrent core services.

use std::error::Error;
use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Cause tag attached to transport failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportFailure {
    /// The daemon socket could not be reached or the connection dropped.
    Connection,
    /// The round-trip exceeded the configured deadline.
    Timeout,
    /// The reply could not be framed or decoded.
    Decode,
}

impl TransportFailure {
    /// Stable label used in logs and event payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connection => "connection",
            Self::Timeout => "timeout",
            Self::Decode => "decode",
        }
    }
}

impl Display for TransportFailure {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// A call-specific fault returned by the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallFault {
    /// Position of the faulting call within its batch; `None` for a whole-response fault.
    pub index: Option<usize>,
    /// Method name of the faulting call when known.
    pub method: Option<String>,
    /// Daemon fault code.
    pub code: i64,
    /// Daemon fault string.
    pub message: String,
}

/// Primary error type for torrent operations.
#[derive(Debug, Error)]
pub enum TorrentError {
    /// The daemon could not be reached or its reply could not be read.
    #[error("daemon transport failed")]
    Transport {
        /// Failure cause tag.
        kind: TransportFailure,
        /// Underlying failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The daemon answered with one or more call faults.
    #[error("daemon rejected one or more calls")]
    Protocol {
        /// Faults in batch order.
        faults: Vec<CallFault>,
        /// Results of the calls that did succeed, in batch order. Empty when the daemon
        /// faulted the whole request.
        completed: Vec<serde_json::Value>,
    },
    /// Caller input was rejected before anything was dispatched.
    #[error("invalid request")]
    Validation {
        /// Field that failed validation.
        field: &'static str,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// The torrent is unknown to the collection.
    #[error("torrent not found")]
    NotFound {
        /// Missing torrent identifier.
        hash: String,
    },
}

impl TorrentError {
    /// Build a transport error with the given cause tag.
    pub fn transport(kind: TransportFailure, source: impl Error + Send + Sync + 'static) -> Self {
        Self::Transport {
            kind,
            source: Box::new(source),
        }
    }

    /// Build a validation error.
    #[must_use]
    pub const fn validation(field: &'static str, reason: &'static str) -> Self {
        Self::Validation { field, reason }
    }

    /// Transport cause tag when this is a transport failure.
    #[must_use]
    pub const fn transport_kind(&self) -> Option<TransportFailure> {
        match self {
            Self::Transport { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// One-line description including context fields, suitable for event payloads.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::Transport { kind, source } => format!("{self} ({kind}): {source}"),
            Self::Protocol { faults, .. } => {
                let described: Vec<String> = faults
                    .iter()
                    .map(|fault| {
                        format!(
                            "{}#{}: [{}] {}",
                            fault.method.as_deref().unwrap_or("response"),
                            fault
                                .index
                                .map_or_else(|| "-".to_string(), |index| index.to_string()),
                            fault.code,
                            fault.message
                        )
                    })
                    .collect();
                format!("{self}: {}", described.join("; "))
            }
            Self::Validation { field, reason } => format!("{self}: {field} {reason}"),
            Self::NotFound { hash } => format!("{self}: {hash}"),
        }
    }
}

/// Convenience alias for torrent operation results.
pub type TorrentResult<T> = Result<T, TorrentError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn transport_error_exposes_kind_and_source() {
        let err = TorrentError::transport(
            TransportFailure::Connection,
            io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
        );
        assert_eq!(err.transport_kind(), Some(TransportFailure::Connection));
        assert_eq!(err.to_string(), "daemon transport failed");
        assert!(err.source().is_some());
        assert!(err.detail().contains("connection"));
    }

    #[test]
    fn protocol_detail_lists_every_fault() {
        let err = TorrentError::Protocol {
            completed: Vec::new(),
            faults: vec![
                CallFault {
                    index: Some(1),
                    method: Some("d.start".into()),
                    code: -501,
                    message: "Could not find info-hash.".into(),
                },
                CallFault {
                    index: None,
                    method: None,
                    code: -506,
                    message: "Method not defined".into(),
                },
            ],
        };
        let detail = err.detail();
        assert!(detail.contains("d.start#1: [-501]"));
        assert!(detail.contains("response#-: [-506]"));
        assert!(err.transport_kind().is_none());
    }

    #[test]
    fn validation_detail_names_field() {
        let err = TorrentError::validation("hashes", "empty");
        assert_eq!(err.detail(), "invalid request: hashes empty");
    }
}
