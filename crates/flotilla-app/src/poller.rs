//! Recurring snapshot poller.
//!
//! `Idle -> start() -> Running -> stop() -> Idle`. Each tick awaits one refresh, so ticks
//! never overlap; refreshes triggered by workflows run independently of the timer.

use std::sync::Arc;
use std::time::Duration;

use flotilla_events::{Event, EventBus};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::orchestrator::TorrentClient;

/// Default interval between snapshot polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

const DAEMON_COMPONENT: &str = "daemon";

/// Lifecycle state of a [`Poller`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    /// No timer is scheduled.
    Idle,
    /// The timer task is scheduled.
    Running,
}

struct RunningTask {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Drives periodic reconciliation of the torrent collection.
pub struct Poller {
    client: Arc<TorrentClient>,
    events: EventBus,
    interval: Duration,
    running: Option<RunningTask>,
}

impl Poller {
    /// Create an idle poller.
    #[must_use]
    pub const fn new(client: Arc<TorrentClient>, events: EventBus, interval: Duration) -> Self {
        Self {
            client,
            events,
            interval,
            running: None,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> PollerState {
        if self.running.is_some() {
            PollerState::Running
        } else {
            PollerState::Idle
        }
    }

    /// Schedule the recurring refresh. Starting a running poller is a no-op.
    pub fn start(&mut self) {
        if self.running.is_some() {
            debug!("poller already running");
            return;
        }
        let (shutdown, mut stopped) = watch::channel(false);
        let client = Arc::clone(&self.client);
        let events = self.events.clone();
        let interval = self.interval;
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut degraded = false;
            loop {
                tokio::select! {
                    biased;
                    _ = stopped.changed() => break,
                    _ = ticker.tick() => {
                        match client.refresh().await {
                            Ok(_) => {
                                if degraded {
                                    degraded = false;
                                    info!("daemon reachable again");
                                    events.publish(Event::HealthChanged { degraded: Vec::new() });
                                }
                            }
                            Err(err) => {
                                warn!(error = %err, "snapshot poll failed");
                                if !degraded {
                                    degraded = true;
                                    events.publish(Event::HealthChanged {
                                        degraded: vec![DAEMON_COMPONENT.to_string()],
                                    });
                                }
                            }
                        }
                    }
                }
            }
            debug!("poller loop exited");
        });
        info!(interval = ?interval, "poller started");
        self.running = Some(RunningTask { shutdown, task });
    }

    /// Cancel the timer. A refresh already in flight finishes before this returns.
    pub async fn stop(&mut self) {
        let Some(RunningTask { shutdown, task }) = self.running.take() else {
            return;
        };
        let _ = shutdown.send(true);
        if let Err(err) = task.await {
            warn!(error = %err, "poller task join failed");
        }
        info!("poller stopped");
    }
}
