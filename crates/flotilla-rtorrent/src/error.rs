//! # Design
//!
//! - Centralize codec error context without leaking `quick_xml` types through the public API.
//! - Keep error messages constant; store operational context in fields.
//! - Provide helpers that fold codec and I/O failures into `TorrentError` transport kinds.

use std::error::Error;
use std::fmt::{self, Display, Formatter};

use flotilla_torrent_core::{TorrentError, TransportFailure};

#[derive(Debug)]
/// Internal error details raised while framing or decoding daemon replies.
pub(crate) enum CodecError {
    /// The XML reader rejected the document.
    Xml {
        /// Underlying reader error.
        source: quick_xml::Error,
    },
    /// An element appeared where a different one was required.
    UnexpectedElement {
        /// Element the decoder was looking for.
        expected: &'static str,
        /// Element that was found instead.
        found: String,
    },
    /// A required element was missing.
    MissingElement {
        /// Element that was absent.
        element: &'static str,
    },
    /// A scalar could not be parsed as its declared type.
    InvalidScalar {
        /// Declared XML-RPC type.
        kind: &'static str,
        /// Raw text of the scalar.
        value: String,
    },
    /// The reply carried no bytes at all.
    EmptyReply,
    /// The CGI header block of the reply was not terminated.
    UnterminatedHeader,
    /// The reply grew past the configured ceiling.
    ReplyTooLarge {
        /// Largest reply accepted, in bytes.
        limit: usize,
    },
    /// The multicall reply did not align with the request.
    ResultCountMismatch {
        /// Number of calls sent.
        expected: usize,
        /// Number of results received.
        actual: usize,
    },
    /// A multicall entry was neither a result wrapper nor a fault.
    MalformedEntry {
        /// Position of the entry in the batch.
        index: usize,
    },
}

impl Display for CodecError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Xml { .. } => formatter.write_str("malformed XML in daemon reply"),
            Self::UnexpectedElement { expected, found } => {
                write!(formatter, "unexpected element <{found}>, expected <{expected}>")
            }
            Self::MissingElement { element } => {
                write!(formatter, "missing <{element}> element")
            }
            Self::InvalidScalar { kind, value } => {
                write!(formatter, "invalid {kind} scalar {value:?}")
            }
            Self::EmptyReply => formatter.write_str("daemon closed the connection without a reply"),
            Self::UnterminatedHeader => formatter.write_str("unterminated reply header block"),
            Self::ReplyTooLarge { limit } => {
                write!(formatter, "daemon reply exceeds {limit} bytes")
            }
            Self::ResultCountMismatch { expected, actual } => write!(
                formatter,
                "multicall returned {actual} results for {expected} calls"
            ),
            Self::MalformedEntry { index } => {
                write!(formatter, "malformed multicall entry at index {index}")
            }
        }
    }
}

impl Error for CodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Xml { source } => Some(source),
            _ => None,
        }
    }
}

impl From<quick_xml::Error> for CodecError {
    fn from(source: quick_xml::Error) -> Self {
        Self::Xml { source }
    }
}

impl From<CodecError> for TorrentError {
    fn from(error: CodecError) -> Self {
        Self::transport(TransportFailure::Decode, error)
    }
}

/// Wrap a socket failure as a connection transport error.
pub(crate) fn connection_failed(source: std::io::Error) -> TorrentError {
    TorrentError::transport(TransportFailure::Connection, source)
}

/// Wrap an elapsed deadline as a timeout transport error.
pub(crate) fn timed_out(source: tokio::time::error::Elapsed) -> TorrentError {
    TorrentError::transport(TransportFailure::Timeout, source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_error_display_and_source() {
        let cases = vec![
            (
                CodecError::UnexpectedElement {
                    expected: "value",
                    found: "param".into(),
                },
                "unexpected element <param>, expected <value>",
            ),
            (
                CodecError::MissingElement { element: "params" },
                "missing <params> element",
            ),
            (
                CodecError::InvalidScalar {
                    kind: "i8",
                    value: "x".into(),
                },
                "invalid i8 scalar \"x\"",
            ),
            (
                CodecError::ResultCountMismatch {
                    expected: 2,
                    actual: 1,
                },
                "multicall returned 1 results for 2 calls",
            ),
        ];
        for (err, message) in cases {
            assert_eq!(err.to_string(), message);
            assert!(err.source().is_none());
        }
    }

    #[test]
    fn codec_errors_become_decode_transport_failures() {
        let err: TorrentError = CodecError::EmptyReply.into();
        assert_eq!(err.transport_kind(), Some(TransportFailure::Decode));

        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        assert_eq!(
            connection_failed(io).transport_kind(),
            Some(TransportFailure::Connection)
        );
    }
}
