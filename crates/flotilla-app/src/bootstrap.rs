use std::future::Future;
use std::sync::Arc;

use flotilla_events::EventBus;
use flotilla_rtorrent::ScgiTransport;
use flotilla_telemetry::{GlobalContextGuard, LoggingConfig, build_sha};
use tracing::{info, warn};

use crate::cleanup::{DataRemover, FsDataRemover};
use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::orchestrator::TorrentClient;
use crate::poller::Poller;

/// Dependencies required to bootstrap the bridge.
pub(crate) struct BootstrapDependencies {
    config: AppConfig,
    events: EventBus,
    client: Arc<TorrentClient>,
}

impl BootstrapDependencies {
    /// Construct production dependencies from arguments and the environment.
    pub(crate) fn from_env() -> AppResult<Self> {
        let config = AppConfig::from_env()?;
        Ok(Self::from_config(config))
    }

    /// Wire the SCGI transport, event bus, and service object for `config`.
    pub(crate) fn from_config(config: AppConfig) -> Self {
        let transport = ScgiTransport::new(config.endpoint.clone())
            .with_timeout(config.rpc_timeout)
            .with_max_payload_bytes(config.max_payload_bytes);
        let events = EventBus::new();
        let remover: Arc<dyn DataRemover> = Arc::new(FsDataRemover);
        let client = Arc::new(TorrentClient::new(
            Arc::new(transport),
            events.clone(),
            remover,
        ));
        Self {
            config,
            events,
            client,
        }
    }
}

/// Entry point for the bridge boot sequence.
///
/// # Errors
///
/// Returns an error if configuration, logging, or the shutdown signal handler fails.
pub async fn run_app() -> AppResult<()> {
    let dependencies = BootstrapDependencies::from_env()?;
    let logging = LoggingConfig {
        level: &dependencies.config.log_level,
        format: dependencies.config.log_format,
        build_sha: build_sha(),
    };
    flotilla_telemetry::init_logging(&logging)
        .map_err(|err| AppError::telemetry("telemetry.init", err))?;
    run_app_with(dependencies, async {
        tokio::signal::ctrl_c()
            .await
            .map_err(|err| AppError::io("signal.ctrl_c", None, err))
    })
    .await
}

/// Boot sequence that relies entirely on injected dependencies to simplify testing.
pub(crate) async fn run_app_with<S>(dependencies: BootstrapDependencies, shutdown: S) -> AppResult<()>
where
    S: Future<Output = AppResult<()>>,
{
    let _context = GlobalContextGuard::new("bootstrap");
    info!(endpoint = %dependencies.config.endpoint, "Flotilla bridge bootstrap starting");

    let BootstrapDependencies {
        config,
        events,
        client,
    } = dependencies;

    match client.refresh().await {
        Ok(Some(diff)) => info!(torrents = diff.added.len(), "initial snapshot loaded"),
        Ok(None) => warn!("initial snapshot unusable; waiting for the poller"),
        Err(err) => warn!(error = %err, "initial snapshot failed; waiting for the poller"),
    }

    let mut poller = Poller::new(client, events, config.poll_interval);
    poller.start();

    let signal = shutdown.await;
    info!("shutdown requested");
    poller.stop().await;
    signal?;
    info!("Flotilla bridge shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use anyhow::Result;
    use flotilla_rtorrent::ScgiEndpoint;
    use flotilla_telemetry::LogFormat;
    use tokio::net::TcpListener;

    fn config_for(port: u16) -> AppConfig {
        AppConfig {
            endpoint: ScgiEndpoint::Tcp {
                host: "127.0.0.1".into(),
                port,
            },
            poll_interval: Duration::from_millis(20),
            rpc_timeout: Duration::from_millis(100),
            max_payload_bytes: 4_096,
            log_level: "info".into(),
            log_format: LogFormat::Pretty,
        }
    }

    #[tokio::test]
    async fn unreachable_daemon_does_not_prevent_clean_shutdown() -> Result<()> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();
        drop(listener);

        let dependencies = BootstrapDependencies::from_config(config_for(port));
        let events = dependencies.events.clone();
        run_app_with(dependencies, async {
            tokio::time::sleep(Duration::from_millis(60)).await;
            Ok(())
        })
        .await?;

        assert!(events.backlog_since(0).iter().any(|envelope| {
            envelope.event.kind() == "health_changed"
        }));
        Ok(())
    }

    #[tokio::test]
    async fn shutdown_signal_errors_surface_after_the_poller_stops() {
        let dependencies = BootstrapDependencies::from_config(config_for(9));
        let err = run_app_with(dependencies, async {
            Err(AppError::io(
                "signal.ctrl_c",
                None,
                std::io::Error::other("no signal handler"),
            ))
        })
        .await
        .expect_err("signal failure propagates");
        assert!(matches!(err, AppError::Io { operation: "signal.ctrl_c", .. }));
    }
}
