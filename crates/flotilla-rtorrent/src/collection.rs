//! In-memory mirror of the daemon's torrents with derived aggregate counts.
//!
//! # Design
//! - Every update replaces the record set wholesale and recomputes all aggregates from
//!   scratch, so counts cannot drift from the records they summarise.
//! - An absent or malformed snapshot is "no data this cycle" and leaves state untouched; an
//!   empty list is a real zero-torrent snapshot.
//! - Records keep snapshot order; a hash index gives constant-time lookups.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use flotilla_torrent_core::{ReconcileDiff, Taxonomy, TorrentRecord};
use tracing::{debug, warn};

use crate::processors::decode_torrent_list;
use crate::xmlrpc::Value;

/// Canonical mirror of daemon torrent state.
#[derive(Debug, Default)]
pub struct TorrentCollection {
    records: Vec<TorrentRecord>,
    index: HashMap<String, usize>,
    taxonomy: Taxonomy,
}

impl TorrentCollection {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconcile against a raw `d.multicall2` snapshot.
    ///
    /// Returns `None` without touching state when the snapshot is absent or unusable.
    pub fn update(&mut self, snapshot: Option<&Value>) -> Option<ReconcileDiff> {
        let Some(records) = decode_torrent_list(snapshot) else {
            debug!("snapshot unavailable; keeping previous torrent state");
            return None;
        };
        Some(self.replace_records(records))
    }

    /// Replace every record with `records` and recompute aggregates.
    ///
    /// Duplicate hashes keep their first occurrence.
    pub fn replace_records(&mut self, records: Vec<TorrentRecord>) -> ReconcileDiff {
        let mut next = Vec::with_capacity(records.len());
        let mut index = HashMap::with_capacity(records.len());
        for record in records {
            if index.contains_key(&record.hash) {
                warn!(hash = %record.hash, "duplicate torrent in snapshot; keeping first");
                continue;
            }
            index.insert(record.hash.clone(), next.len());
            next.push(record);
        }

        let mut diff = ReconcileDiff::default();
        for record in &next {
            match self.torrent(&record.hash) {
                None => diff.added.push(record.hash.clone()),
                Some(previous) if previous != record => diff.updated.push(record.hash.clone()),
                Some(_) => {}
            }
        }
        diff.removed = self
            .records
            .iter()
            .filter(|record| !index.contains_key(&record.hash))
            .map(|record| record.hash.clone())
            .collect();

        self.records = next;
        self.index = index;
        self.taxonomy = compute_taxonomy(&self.records);
        diff
    }

    /// Look up one torrent.
    #[must_use]
    pub fn torrent(&self, hash: &str) -> Option<&TorrentRecord> {
        self.index
            .get(hash)
            .and_then(|position| self.records.get(*position))
    }

    /// All torrents in snapshot order.
    #[must_use]
    pub fn torrents(&self) -> &[TorrentRecord] {
        &self.records
    }

    /// Number of mirrored torrents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the mirror holds no torrents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All three aggregate indices.
    #[must_use]
    pub const fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    /// Torrent count per status flag.
    #[must_use]
    pub const fn status_counts(&self) -> &BTreeMap<String, u64> {
        &self.taxonomy.statuses
    }

    /// Torrent count per tag.
    #[must_use]
    pub const fn tag_counts(&self) -> &BTreeMap<String, u64> {
        &self.taxonomy.tags
    }

    /// Torrent count per tracker domain.
    #[must_use]
    pub const fn tracker_counts(&self) -> &BTreeMap<String, u64> {
        &self.taxonomy.trackers
    }
}

fn compute_taxonomy(records: &[TorrentRecord]) -> Taxonomy {
    let mut taxonomy = Taxonomy::default();
    for record in records {
        for status in &record.statuses {
            bump(&mut taxonomy.statuses, status.as_str());
        }
        for tag in record.tags.iter().collect::<BTreeSet<_>>() {
            bump(&mut taxonomy.tags, tag);
        }
        for tracker in record.tracker_hosts.iter().collect::<BTreeSet<_>>() {
            bump(&mut taxonomy.trackers, tracker);
        }
    }
    taxonomy
}

fn bump(counts: &mut BTreeMap<String, u64>, key: &str) {
    *counts.entry(key.to_string()).or_default() += 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use flotilla_torrent_core::TorrentStatusFlag;

    fn record(hash: &str, status: TorrentStatusFlag, tags: &[&str], trackers: &[&str]) -> TorrentRecord {
        TorrentRecord {
            hash: hash.to_string(),
            name: hash.to_lowercase(),
            tags: tags.iter().map(|tag| (*tag).to_string()).collect(),
            tracker_hosts: trackers.iter().map(|host| (*host).to_string()).collect(),
            statuses: BTreeSet::from([status]),
            ..TorrentRecord::default()
        }
    }

    fn raw_row(hash: &str, tags: &str) -> Value {
        Value::Array(vec![
            Value::from(hash),
            Value::from(hash),
            Value::from("/data"),
            Value::from("/data"),
            Value::Int(10),
            Value::Int(10),
            Value::Int(0),
            Value::Int(0),
            Value::Int(0),
            Value::Int(0),
            Value::Int(0),
            Value::Int(2),
            Value::from(tags),
            Value::from(""),
            Value::Int(0),
            Value::Int(1),
            Value::Int(1),
            Value::Int(1),
            Value::from("http://tracker.example.org/announce@!@"),
        ])
    }

    #[test]
    fn seeding_then_stopped_scenario() {
        let mut collection = TorrentCollection::new();
        collection.replace_records(vec![record(
            "ABC",
            TorrentStatusFlag::Seeding,
            &["movies"],
            &[],
        )]);
        let diff = collection.replace_records(vec![
            record("ABC", TorrentStatusFlag::Seeding, &["movies"], &[]),
            record("DEF", TorrentStatusFlag::Stopped, &[], &[]),
        ]);
        assert_eq!(diff.added, vec!["DEF".to_string()]);
        assert!(diff.updated.is_empty());
        assert_eq!(
            collection.status_counts(),
            &BTreeMap::from([("seeding".to_string(), 1), ("stopped".to_string(), 1)])
        );
        assert_eq!(
            collection.tag_counts(),
            &BTreeMap::from([("movies".to_string(), 1)])
        );
    }

    #[test]
    fn aggregates_count_each_distinct_value_once_per_record() {
        let mut collection = TorrentCollection::new();
        collection.replace_records(vec![
            record(
                "A",
                TorrentStatusFlag::Seeding,
                &["movies", "hd", "movies"],
                &["example.org"],
            ),
            record("B", TorrentStatusFlag::Downloading, &["hd", "tv"], &["example.org", "other.net"]),
            record("C", TorrentStatusFlag::Seeding, &["tv"], &[]),
        ]);
        assert_eq!(
            collection.tag_counts(),
            &BTreeMap::from([
                ("hd".to_string(), 2),
                ("movies".to_string(), 1),
                ("tv".to_string(), 2),
            ])
        );
        assert_eq!(
            collection.tracker_counts(),
            &BTreeMap::from([("example.org".to_string(), 2), ("other.net".to_string(), 1)])
        );
        assert_eq!(collection.status_counts().get("seeding"), Some(&2));
        assert_eq!(collection.status_counts().get("downloading"), Some(&1));
    }

    #[test]
    fn identical_snapshots_are_idempotent() {
        let snapshot = Value::Array(vec![raw_row("AAA", "movies"), raw_row("BBB", "tv")]);
        let mut collection = TorrentCollection::new();
        let first = collection.update(Some(&snapshot)).unwrap_or_default();
        assert_eq!(first.added.len(), 2);
        let records = collection.torrents().to_vec();
        let taxonomy = collection.taxonomy().clone();

        let second = collection.update(Some(&snapshot)).unwrap_or_default();
        assert!(second.is_empty());
        assert_eq!(collection.torrents(), records.as_slice());
        assert_eq!(collection.taxonomy(), &taxonomy);
    }

    #[test]
    fn omitted_torrents_are_removed() {
        let mut collection = TorrentCollection::new();
        collection.update(Some(&Value::Array(vec![
            raw_row("AAA", ""),
            raw_row("BBB", ""),
        ])));
        let diff = collection
            .update(Some(&Value::Array(vec![raw_row("BBB", "tv")])))
            .unwrap_or_default();
        assert_eq!(diff.removed, vec!["AAA".to_string()]);
        assert_eq!(diff.updated, vec!["BBB".to_string()]);
        assert!(collection.torrent("AAA").is_none());
        assert!(collection.torrent("BBB").is_some());
        assert_eq!(collection.tag_counts().get("tv"), Some(&1));
    }

    #[test]
    fn unusable_snapshots_leave_state_untouched() {
        let snapshot = Value::Array(vec![raw_row("AAA", "movies")]);
        let mut collection = TorrentCollection::new();
        collection.update(Some(&snapshot));
        let before = collection.torrents().to_vec();

        assert!(collection.update(None).is_none());
        assert!(collection.update(Some(&Value::from("garbage"))).is_none());
        assert!(
            collection
                .update(Some(&Value::Array(vec![Value::Int(3)])))
                .is_none()
        );
        assert_eq!(collection.torrents(), before.as_slice());
        assert_eq!(collection.tag_counts().get("movies"), Some(&1));
    }

    #[test]
    fn empty_list_clears_the_mirror() {
        let mut collection = TorrentCollection::new();
        collection.update(Some(&Value::Array(vec![raw_row("AAA", "")])));
        let diff = collection
            .update(Some(&Value::Array(Vec::new())))
            .unwrap_or_default();
        assert_eq!(diff.removed, vec!["AAA".to_string()]);
        assert!(collection.is_empty());
        assert!(collection.status_counts().is_empty());
    }

    #[test]
    fn snapshot_order_is_preserved_and_duplicates_dropped() {
        let mut collection = TorrentCollection::new();
        collection.replace_records(vec![
            record("ZZZ", TorrentStatusFlag::Seeding, &[], &[]),
            record("AAA", TorrentStatusFlag::Seeding, &[], &[]),
            record("ZZZ", TorrentStatusFlag::Stopped, &[], &[]),
        ]);
        let hashes: Vec<&str> = collection
            .torrents()
            .iter()
            .map(|record| record.hash.as_str())
            .collect();
        assert_eq!(hashes, vec!["ZZZ", "AAA"]);
        assert_eq!(collection.len(), 2);
        assert!(
            collection
                .torrent("ZZZ")
                .is_some_and(|record| record.has_status(TorrentStatusFlag::Seeding))
        );
    }
}
