//! Response processors mapping positional multicall rows into typed records.
//!
//! Each table lists `{index, name, transform}` entries. The names double as the property
//! list sent with the matching `*.multicall` request, so request and decode can never drift.
//! Rows shorter than their table leave the remaining fields at their defaults.

use std::collections::BTreeSet;
use std::net::IpAddr;

use flotilla_torrent_core::{
    FileRecord, PeerRecord, TorrentDetails, TorrentRecord, TorrentResult, TorrentStatusFlag,
    TrackerRecord, TransferStats,
};
use tracing::warn;
use url::Url;

use crate::xmlrpc::Value;

/// Separator the tracker-list expression places after every announce URL.
pub const TRACKER_URL_SEPARATOR: &str = "@!@";

/// One column of a positional reply row.
pub struct FieldSpec<R> {
    /// Position of the column within the row.
    pub index: usize,
    /// Daemon property requested for this column.
    pub name: &'static str,
    /// Writes the decoded column into the record.
    pub transform: fn(&mut R, &Value),
}

#[derive(Debug, Default)]
struct TorrentRow {
    record: TorrentRecord,
    hashing: bool,
    open: bool,
    state: i64,
    complete: bool,
}

static TORRENT_FIELDS: [FieldSpec<TorrentRow>; 19] = [
    FieldSpec {
        index: 0,
        name: "d.hash=",
        transform: |row, value| row.record.hash = text(value).trim().to_ascii_uppercase(),
    },
    FieldSpec {
        index: 1,
        name: "d.name=",
        transform: |row, value| row.record.name = text(value),
    },
    FieldSpec {
        index: 2,
        name: "d.base_path=",
        transform: |row, value| row.record.base_path = text(value),
    },
    FieldSpec {
        index: 3,
        name: "d.directory=",
        transform: |row, value| row.record.directory = text(value),
    },
    FieldSpec {
        index: 4,
        name: "d.size_bytes=",
        transform: |row, value| row.record.size_bytes = unsigned(value),
    },
    FieldSpec {
        index: 5,
        name: "d.bytes_done=",
        transform: |row, value| row.record.bytes_done = unsigned(value),
    },
    FieldSpec {
        index: 6,
        name: "d.up.rate=",
        transform: |row, value| row.record.upload_rate = unsigned(value),
    },
    FieldSpec {
        index: 7,
        name: "d.down.rate=",
        transform: |row, value| row.record.download_rate = unsigned(value),
    },
    FieldSpec {
        index: 8,
        name: "d.up.total=",
        transform: |row, value| row.record.upload_total = unsigned(value),
    },
    FieldSpec {
        index: 9,
        name: "d.down.total=",
        transform: |row, value| row.record.download_total = unsigned(value),
    },
    FieldSpec {
        index: 10,
        name: "d.ratio=",
        transform: |row, value| row.record.ratio = per_mille(value),
    },
    FieldSpec {
        index: 11,
        name: "d.priority=",
        transform: |row, value| row.record.priority = signed(value),
    },
    FieldSpec {
        index: 12,
        name: "d.custom1=",
        transform: |row, value| row.record.tags = split_tags(&text(value)),
    },
    FieldSpec {
        index: 13,
        name: "d.message=",
        transform: |row, value| row.record.message = text(value),
    },
    FieldSpec {
        index: 14,
        name: "d.hashing=",
        transform: |row, value| row.hashing = flag(value),
    },
    FieldSpec {
        index: 15,
        name: "d.is_open=",
        transform: |row, value| row.open = flag(value),
    },
    FieldSpec {
        index: 16,
        name: "d.state=",
        transform: |row, value| row.state = signed(value),
    },
    FieldSpec {
        index: 17,
        name: "d.complete=",
        transform: |row, value| row.complete = flag(value),
    },
    FieldSpec {
        index: 18,
        name: "cat=\"$t.multicall=d.hash=,t.url=,cat={@!@}\"",
        transform: |row, value| row.record.tracker_hosts = tracker_hosts(&text(value)),
    },
];

/// Peer columns requested with `p.multicall`.
pub static PEER_FIELDS: [FieldSpec<PeerRecord>; 7] = [
    FieldSpec {
        index: 0,
        name: "p.address=",
        transform: |peer, value| peer.address = text(value),
    },
    FieldSpec {
        index: 1,
        name: "p.client_version=",
        transform: |peer, value| peer.client_version = text(value),
    },
    FieldSpec {
        index: 2,
        name: "p.completed_percent=",
        transform: |peer, value| peer.completed_percent = unsigned(value),
    },
    FieldSpec {
        index: 3,
        name: "p.down_rate=",
        transform: |peer, value| peer.download_rate = unsigned(value),
    },
    FieldSpec {
        index: 4,
        name: "p.up_rate=",
        transform: |peer, value| peer.upload_rate = unsigned(value),
    },
    FieldSpec {
        index: 5,
        name: "p.is_encrypted=",
        transform: |peer, value| peer.is_encrypted = flag(value),
    },
    FieldSpec {
        index: 6,
        name: "p.is_incoming=",
        transform: |peer, value| peer.is_incoming = flag(value),
    },
];

/// File columns requested with `f.multicall`.
pub static FILE_FIELDS: [FieldSpec<FileRecord>; 5] = [
    FieldSpec {
        index: 0,
        name: "f.path=",
        transform: |file, value| file.path = text(value),
    },
    FieldSpec {
        index: 1,
        name: "f.size_bytes=",
        transform: |file, value| file.size_bytes = unsigned(value),
    },
    FieldSpec {
        index: 2,
        name: "f.completed_chunks=",
        transform: |file, value| file.completed_chunks = unsigned(value),
    },
    FieldSpec {
        index: 3,
        name: "f.size_chunks=",
        transform: |file, value| file.size_chunks = unsigned(value),
    },
    FieldSpec {
        index: 4,
        name: "f.priority=",
        transform: |file, value| file.priority = signed(value),
    },
];

/// Tracker columns requested with `t.multicall`.
pub static TRACKER_FIELDS: [FieldSpec<TrackerRecord>; 4] = [
    FieldSpec {
        index: 0,
        name: "t.url=",
        transform: |tracker, value| tracker.url = text(value),
    },
    FieldSpec {
        index: 1,
        name: "t.group=",
        transform: |tracker, value| tracker.group = signed(value),
    },
    FieldSpec {
        index: 2,
        name: "t.type=",
        transform: |tracker, value| tracker.tracker_type = signed(value),
    },
    FieldSpec {
        index: 3,
        name: "t.is_enabled=",
        transform: |tracker, value| tracker.is_enabled = flag(value),
    },
];

/// Global throttle queries, one call per column.
pub static TRANSFER_FIELDS: [FieldSpec<TransferStats>; 6] = [
    FieldSpec {
        index: 0,
        name: "throttle.global_down.rate",
        transform: |stats, value| stats.download_rate = unsigned(value),
    },
    FieldSpec {
        index: 1,
        name: "throttle.global_up.rate",
        transform: |stats, value| stats.upload_rate = unsigned(value),
    },
    FieldSpec {
        index: 2,
        name: "throttle.global_down.total",
        transform: |stats, value| stats.download_total = unsigned(value),
    },
    FieldSpec {
        index: 3,
        name: "throttle.global_up.total",
        transform: |stats, value| stats.upload_total = unsigned(value),
    },
    FieldSpec {
        index: 4,
        name: "throttle.global_down.max_rate",
        transform: |stats, value| stats.download_throttle = unsigned(value),
    },
    FieldSpec {
        index: 5,
        name: "throttle.global_up.max_rate",
        transform: |stats, value| stats.upload_throttle = unsigned(value),
    },
];

/// Property names requested with `d.multicall2`, in column order.
pub fn torrent_field_names() -> impl Iterator<Item = &'static str> {
    TORRENT_FIELDS.iter().map(|field| field.name)
}

/// Property names of a table, in column order.
pub fn field_names<R>(table: &'static [FieldSpec<R>]) -> impl Iterator<Item = &'static str> {
    table.iter().map(|field| field.name)
}

fn decode_row<R: Default>(columns: &[Value], table: &[FieldSpec<R>]) -> R {
    let mut record = R::default();
    for field in table {
        if let Some(value) = columns.get(field.index) {
            (field.transform)(&mut record, value);
        }
    }
    record
}

fn decode_rows<R: Default>(rows: Option<&Value>, table: &[FieldSpec<R>]) -> Vec<R> {
    rows.and_then(Value::as_array)
        .unwrap_or_default()
        .iter()
        .filter_map(Value::as_array)
        .map(|columns| decode_row(columns, table))
        .collect()
}

/// Decode a `d.multicall2` snapshot.
///
/// Returns `None` when the snapshot is absent, not a list, or consists solely of unusable
/// rows; an empty list is a legitimate zero-torrent snapshot. Rows that are not lists or lack
/// a hash are skipped.
#[must_use]
pub fn decode_torrent_list(snapshot: Option<&Value>) -> Option<Vec<TorrentRecord>> {
    let rows = snapshot?.as_array()?;
    let mut records = Vec::with_capacity(rows.len());
    for (position, row) in rows.iter().enumerate() {
        let Some(columns) = row.as_array() else {
            warn!(position, "skipping torrent row that is not a list");
            continue;
        };
        let decoded = decode_row(columns, &TORRENT_FIELDS);
        if decoded.record.hash.is_empty() {
            warn!(position, "skipping torrent row without a hash");
            continue;
        }
        records.push(finish_torrent(decoded));
    }
    if records.is_empty() && !rows.is_empty() {
        warn!(rows = rows.len(), "snapshot contained no usable torrent rows");
        return None;
    }
    Some(records)
}

fn finish_torrent(row: TorrentRow) -> TorrentRecord {
    let statuses = derive_statuses(&row);
    TorrentRecord {
        statuses,
        ..row.record
    }
}

fn derive_statuses(row: &TorrentRow) -> BTreeSet<TorrentStatusFlag> {
    let mut statuses = BTreeSet::new();
    if row.hashing {
        statuses.insert(TorrentStatusFlag::Checking);
    }
    if !row.record.message.trim().is_empty() {
        statuses.insert(TorrentStatusFlag::Error);
    }
    if !row.open || row.state == 0 {
        statuses.insert(TorrentStatusFlag::Stopped);
    } else if row.complete {
        statuses.insert(TorrentStatusFlag::Seeding);
    } else {
        statuses.insert(TorrentStatusFlag::Downloading);
    }
    if row.record.upload_rate > 0 || row.record.download_rate > 0 {
        statuses.insert(TorrentStatusFlag::Active);
    } else {
        statuses.insert(TorrentStatusFlag::Inactive);
    }
    statuses
}

/// Decode the `[peers, files, trackers]` reply of a details batch.
///
/// # Errors
///
/// Never fails; missing sections decode as empty lists. The signature matches the
/// request builder's transform contract.
pub fn torrent_details(values: Vec<Value>) -> TorrentResult<TorrentDetails> {
    let mut files = decode_rows(values.get(1), &FILE_FIELDS);
    for (index, file) in files.iter_mut().enumerate() {
        file.index = index;
    }
    Ok(TorrentDetails {
        peers: decode_rows(values.first(), &PEER_FIELDS),
        files,
        trackers: decode_rows(values.get(2), &TRACKER_FIELDS),
    })
}

/// Decode the replies of a transfer statistics batch.
///
/// # Errors
///
/// Never fails; missing values stay zero. The signature matches the request builder's
/// transform contract.
pub fn transfer_stats(values: Vec<Value>) -> TorrentResult<TransferStats> {
    Ok(decode_row(&values, &TRANSFER_FIELDS))
}

/// Reduce a tracker announce URL to its registrable domain; IP hosts are kept verbatim.
#[must_use]
pub fn tracker_domain(announce: &str) -> Option<String> {
    let parsed = Url::parse(announce.trim()).ok()?;
    let host = parsed.host_str()?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.parse::<IpAddr>().is_ok() {
        return Some(host.to_string());
    }
    let labels: Vec<&str> = host.split('.').filter(|label| !label.is_empty()).collect();
    if labels.is_empty() {
        return None;
    }
    let start = labels.len().saturating_sub(2);
    Some(labels[start..].join(".").to_ascii_lowercase())
}

fn tracker_hosts(joined: &str) -> Vec<String> {
    let mut hosts: Vec<String> = Vec::new();
    for domain in joined
        .split(TRACKER_URL_SEPARATOR)
        .filter(|url| !url.trim().is_empty())
        .filter_map(tracker_domain)
    {
        if !hosts.contains(&domain) {
            hosts.push(domain);
        }
    }
    hosts
}

fn split_tags(joined: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in joined.split(',').map(str::trim).filter(|tag| !tag.is_empty()) {
        if !tags.iter().any(|existing| existing == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

fn text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.as_i64().map(|number| number.to_string()).unwrap_or_default(),
    }
}

fn unsigned(value: &Value) -> u64 {
    value
        .as_i64()
        .and_then(|number| u64::try_from(number).ok())
        .unwrap_or_default()
}

fn signed(value: &Value) -> i64 {
    value.as_i64().unwrap_or_default()
}

fn flag(value: &Value) -> bool {
    value.as_bool().unwrap_or(false)
}

#[allow(clippy::cast_precision_loss)]
fn per_mille(value: &Value) -> f64 {
    match value {
        Value::Double(ratio) => *ratio,
        other => other.as_i64().map_or(0.0, |raw| raw as f64 / 1000.0),
    }
}
