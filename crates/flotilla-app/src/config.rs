//! Command-line and environment configuration.
//!
//! # Design
//! - Every flag is also readable from a `FLOTILLA_*` environment variable.
//! - Raw arguments are validated into [`AppConfig`] before any connection is attempted.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use clap::Parser;
use flotilla_rtorrent::{DEFAULT_MAX_PAYLOAD_BYTES, DEFAULT_RPC_TIMEOUT, ScgiEndpoint};
use flotilla_telemetry::{DEFAULT_LOG_LEVEL, LogFormat};

use crate::error::{AppError, AppResult};
use crate::poller::DEFAULT_POLL_INTERVAL;

/// Raw arguments accepted by the `flotilla` binary.
#[derive(Debug, Parser)]
#[command(name = "flotilla", about = "Bridge between a torrent manager and an rTorrent daemon")]
pub struct CliArgs {
    /// TCP host of the daemon's SCGI listener.
    #[arg(long, env = "FLOTILLA_SCGI_HOST", default_value = "127.0.0.1")]
    pub scgi_host: String,
    /// TCP port of the daemon's SCGI listener.
    #[arg(long, env = "FLOTILLA_SCGI_PORT", default_value_t = 5000)]
    pub scgi_port: u16,
    /// Unix socket path; takes precedence over host and port.
    #[arg(long, env = "FLOTILLA_SCGI_SOCKET")]
    pub scgi_socket: Option<PathBuf>,
    /// Seconds between snapshot polls.
    #[arg(long, env = "FLOTILLA_POLL_INTERVAL_SECS", default_value_t = DEFAULT_POLL_INTERVAL.as_secs())]
    pub poll_interval_secs: u64,
    /// Seconds before a daemon round-trip is abandoned.
    #[arg(long, env = "FLOTILLA_RPC_TIMEOUT_SECS", default_value_t = DEFAULT_RPC_TIMEOUT.as_secs())]
    pub rpc_timeout_secs: u64,
    /// Largest encoded payload the daemon accepts.
    #[arg(long, env = "FLOTILLA_MAX_PAYLOAD_BYTES", default_value_t = DEFAULT_MAX_PAYLOAD_BYTES)]
    pub max_payload_bytes: usize,
    /// Default log filter when `RUST_LOG` is unset.
    #[arg(long, env = "FLOTILLA_LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,
    /// Log output format (`json` or `pretty`); inferred from the build when unset.
    #[arg(long, env = "FLOTILLA_LOG_FORMAT")]
    pub log_format: Option<String>,
}

/// Validated runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Where the daemon listens.
    pub endpoint: ScgiEndpoint,
    /// Poller interval.
    pub poll_interval: Duration,
    /// Per-round-trip transport timeout.
    pub rpc_timeout: Duration,
    /// Payload ceiling enforced before connecting.
    pub max_payload_bytes: usize,
    /// Default log filter.
    pub log_level: String,
    /// Log output format.
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Parse process arguments and environment, then validate them.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidConfig`] when a value is out of range.
    pub fn from_env() -> AppResult<Self> {
        Self::try_from(CliArgs::parse())
    }
}

impl TryFrom<CliArgs> for AppConfig {
    type Error = AppError;

    fn try_from(args: CliArgs) -> AppResult<Self> {
        let endpoint = match args.scgi_socket {
            Some(path) if path.as_os_str().is_empty() => {
                return Err(AppError::invalid_config("scgi_socket", "empty", ""));
            }
            Some(path) => ScgiEndpoint::Unix(path),
            None => {
                let host = args.scgi_host.trim();
                if host.is_empty() {
                    return Err(AppError::invalid_config("scgi_host", "empty", &args.scgi_host));
                }
                if args.scgi_port == 0 {
                    return Err(AppError::invalid_config("scgi_port", "zero", args.scgi_port));
                }
                ScgiEndpoint::Tcp {
                    host: host.to_string(),
                    port: args.scgi_port,
                }
            }
        };

        if args.poll_interval_secs == 0 {
            return Err(AppError::invalid_config(
                "poll_interval_secs",
                "zero",
                args.poll_interval_secs,
            ));
        }
        if args.rpc_timeout_secs == 0 {
            return Err(AppError::invalid_config(
                "rpc_timeout_secs",
                "zero",
                args.rpc_timeout_secs,
            ));
        }
        if args.max_payload_bytes == 0 {
            return Err(AppError::invalid_config(
                "max_payload_bytes",
                "zero",
                args.max_payload_bytes,
            ));
        }

        let log_level = args.log_level.trim();
        if log_level.is_empty() {
            return Err(AppError::invalid_config("log_level", "empty", &args.log_level));
        }
        let log_format = match args.log_format.as_deref() {
            None => LogFormat::infer(),
            Some(raw) => LogFormat::from_str(raw)
                .map_err(|_| AppError::invalid_config("log_format", "unknown", raw))?,
        };

        Ok(Self {
            endpoint,
            poll_interval: Duration::from_secs(args.poll_interval_secs),
            rpc_timeout: Duration::from_secs(args.rpc_timeout_secs),
            max_payload_bytes: args.max_payload_bytes,
            log_level: log_level.to_string(),
            log_format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> AppResult<AppConfig> {
        let args = CliArgs::try_parse_from(std::iter::once("flotilla").chain(extra.iter().copied()))
            .map_err(|_| AppError::invalid_config("args", "unparseable", extra.join(" ")))?;
        AppConfig::try_from(args)
    }

    #[test]
    fn explicit_flags_are_applied() -> anyhow::Result<()> {
        let config = parse(&[
            "--scgi-host",
            "10.0.0.2",
            "--scgi-port",
            "5050",
            "--poll-interval-secs",
            "2",
            "--rpc-timeout-secs",
            "7",
            "--max-payload-bytes",
            "1024",
            "--log-format",
            "json",
        ])?;
        assert_eq!(
            config.endpoint,
            ScgiEndpoint::Tcp {
                host: "10.0.0.2".into(),
                port: 5050,
            }
        );
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.rpc_timeout, Duration::from_secs(7));
        assert_eq!(config.max_payload_bytes, 1024);
        assert_eq!(config.log_format, LogFormat::Json);
        Ok(())
    }

    #[test]
    fn socket_path_wins_over_tcp() -> anyhow::Result<()> {
        let config = parse(&["--scgi-socket", "/run/rtorrent.sock", "--scgi-port", "0"])?;
        assert_eq!(
            config.endpoint,
            ScgiEndpoint::Unix(PathBuf::from("/run/rtorrent.sock"))
        );
        Ok(())
    }

    #[test]
    fn zero_intervals_are_rejected() {
        let err = parse(&["--poll-interval-secs", "0"]).expect_err("zero poll interval");
        assert!(matches!(
            err,
            AppError::InvalidConfig {
                field: "poll_interval_secs",
                reason: "zero",
                ..
            }
        ));

        let err = parse(&["--rpc-timeout-secs", "0"]).expect_err("zero timeout");
        assert!(matches!(
            err,
            AppError::InvalidConfig {
                field: "rpc_timeout_secs",
                ..
            }
        ));
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        let err = parse(&["--log-format", "xml"]).expect_err("xml is not a log format");
        assert!(matches!(
            err,
            AppError::InvalidConfig {
                field: "log_format",
                value: Some(ref value),
                ..
            } if value == "xml"
        ));
    }

    #[test]
    fn blank_host_is_rejected() {
        let err = parse(&["--scgi-host", "  "]).expect_err("blank host");
        assert!(matches!(
            err,
            AppError::InvalidConfig {
                field: "scgi_host",
                ..
            }
        ));
    }
}
