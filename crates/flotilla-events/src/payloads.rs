//! Event payload types carried across the bridge.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

/// Identifier assigned to each event emitted by the bridge.
pub type EventId = u64;

/// Default buffer size for the in-memory replay ring.
pub const DEFAULT_REPLAY_CAPACITY: usize = 1_024;

/// Typed domain events surfaced across the system.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// The torrent collection was reconciled against a fresh snapshot and changed.
    TorrentsReconciled {
        /// Identifiers that appeared in this snapshot.
        added: Vec<String>,
        /// Identifiers that disappeared from this snapshot.
        removed: Vec<String>,
        /// Identifiers whose record differs from the previous cycle.
        updated: Vec<String>,
        /// Number of torrents held after reconciliation.
        total: usize,
    },
    /// At least one aggregate index changed after reconciliation.
    TaxonomyChanged {
        /// Torrent count per status flag.
        statuses: BTreeMap<String, u64>,
        /// Torrent count per tag.
        tags: BTreeMap<String, u64>,
        /// Torrent count per tracker domain.
        trackers: BTreeMap<String, u64>,
    },
    /// A mutating workflow finished successfully.
    WorkflowCompleted {
        /// Workflow identifier (for example `move` or `delete`).
        operation: String,
        /// Torrents targeted by the workflow.
        hashes: Vec<String>,
    },
    /// A mutating workflow failed; earlier stages are not rolled back.
    WorkflowFailed {
        /// Workflow identifier.
        operation: String,
        /// Human-readable failure description.
        message: String,
    },
    /// Daemon reachability changed (degraded or restored components).
    HealthChanged {
        /// Components currently considered degraded.
        degraded: Vec<String>,
    },
}

impl Event {
    /// Machine-friendly discriminator for downstream consumers.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::TorrentsReconciled { .. } => "torrents_reconciled",
            Self::TaxonomyChanged { .. } => "taxonomy_changed",
            Self::WorkflowCompleted { .. } => "workflow_completed",
            Self::WorkflowFailed { .. } => "workflow_failed",
            Self::HealthChanged { .. } => "health_changed",
        }
    }
}

/// Metadata wrapper around events. Each envelope tracks the event id and emission timestamp.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct EventEnvelope {
    /// Sequential identifier.
    pub id: EventId,
    /// Emission timestamp.
    pub timestamp: DateTime<Utc>,
    /// Wrapped event.
    pub event: Event,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_serde_tag() {
        let event = Event::WorkflowFailed {
            operation: "move".into(),
            message: "connection refused".into(),
        };
        let value = serde_json::to_value(&event).expect("serialize event");
        assert_eq!(value["type"], event.kind());

        let health = Event::HealthChanged {
            degraded: vec!["daemon".into()],
        };
        assert_eq!(health.kind(), "health_changed");
    }

    #[test]
    fn taxonomy_event_round_trips_through_json() {
        let mut statuses = BTreeMap::new();
        statuses.insert("seeding".to_string(), 2);
        let event = Event::TaxonomyChanged {
            statuses,
            tags: BTreeMap::new(),
            trackers: BTreeMap::new(),
        };
        let json = serde_json::to_string(&event).expect("serialize");
        let decoded: Event = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(decoded, event);
    }
}
