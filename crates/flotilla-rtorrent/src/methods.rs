//! Catalogue of the daemon calls the bridge issues.
//!
//! Functions return plain [`MethodCall`] lists so workflows can batch them freely.

use flotilla_torrent_core::{FilePriority, SpeedLimit, TorrentPriority, TransferDirection};

use crate::processors::{
    FILE_FIELDS, PEER_FIELDS, TRACKER_FIELDS, TRANSFER_FIELDS, field_names, torrent_field_names,
};
use crate::transport::MethodCall;
use crate::xmlrpc::Value;

/// Snapshot of every torrent in the `main` view.
#[must_use]
pub fn torrent_list() -> MethodCall {
    MethodCall::new("d.multicall2")
        .args(["", "main"])
        .args(torrent_field_names())
}

fn per_hash(hashes: &[String], methods: &[&'static str]) -> Vec<MethodCall> {
    hashes
        .iter()
        .flat_map(|hash| {
            methods
                .iter()
                .map(move |method| MethodCall::new(*method).arg(hash.as_str()))
        })
        .collect()
}

/// Open and start torrents.
#[must_use]
pub fn start(hashes: &[String]) -> Vec<MethodCall> {
    per_hash(hashes, &["d.open", "d.start"])
}

/// Stop and close torrents.
#[must_use]
pub fn stop(hashes: &[String]) -> Vec<MethodCall> {
    per_hash(hashes, &["d.stop", "d.close"])
}

/// Schedule hash checks.
#[must_use]
pub fn check_hash(hashes: &[String]) -> Vec<MethodCall> {
    per_hash(hashes, &["d.check_hash"])
}

/// Remove torrents from the daemon's session.
#[must_use]
pub fn erase(hashes: &[String]) -> Vec<MethodCall> {
    per_hash(hashes, &["d.erase"])
}

/// Point torrents at a new storage directory.
#[must_use]
pub fn set_directory(hashes: &[String], destination: &str) -> Vec<MethodCall> {
    hashes
        .iter()
        .map(|hash| {
            MethodCall::new("d.directory.set")
                .arg(hash.as_str())
                .arg(destination)
        })
        .collect()
}

/// Change torrent priority and let the daemon re-evaluate its queues.
#[must_use]
pub fn set_priority(hashes: &[String], priority: TorrentPriority) -> Vec<MethodCall> {
    hashes
        .iter()
        .flat_map(|hash| {
            [
                MethodCall::new("d.priority.set")
                    .arg(hash.as_str())
                    .arg(priority.as_daemon_value()),
                MethodCall::new("d.update_priorities").arg(hash.as_str()),
            ]
        })
        .collect()
}

/// Change priority of files within one torrent.
#[must_use]
pub fn set_file_priority(hash: &str, indices: &[usize], priority: FilePriority) -> Vec<MethodCall> {
    let mut calls: Vec<MethodCall> = indices
        .iter()
        .map(|index| {
            MethodCall::new("f.priority.set")
                .arg(format!("{hash}:f{index}"))
                .arg(priority.as_daemon_value())
        })
        .collect();
    calls.push(MethodCall::new("d.update_priorities").arg(hash));
    calls
}

/// Replace the tag set stored in `d.custom1`.
#[must_use]
pub fn set_tags(hashes: &[String], tags: &[String]) -> Vec<MethodCall> {
    let joined = tags.join(",");
    hashes
        .iter()
        .map(|hash| {
            MethodCall::new("d.custom1.set")
                .arg(hash.as_str())
                .arg(joined.as_str())
        })
        .collect()
}

/// Create a directory on the daemon host.
#[must_use]
pub fn create_directory(path: &str) -> MethodCall {
    MethodCall::new("execute2").args(["", "mkdir", "-p", path])
}

/// Move a payload on the daemon host without overwriting newer files.
#[must_use]
pub fn move_payload(source: &str, destination: &str) -> MethodCall {
    MethodCall::new("execute2").args(["", "mv", "-u", source, destination])
}

fn load_commands(destination: &str, tags: &[String]) -> Vec<Value> {
    let mut commands = vec![Value::from(format!(
        "d.directory.set=\"{}\"",
        quote(destination)
    ))];
    if !tags.is_empty() {
        commands.push(Value::from(format!(
            "d.custom1.set=\"{}\"",
            quote(&tags.join(","))
        )));
    }
    commands
}

fn quote(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Load a torrent from a URL or magnet link.
#[must_use]
pub fn load_url(url: &str, destination: &str, start: bool, tags: &[String]) -> MethodCall {
    let method = if start { "load.start" } else { "load.normal" };
    MethodCall::new(method)
        .arg("")
        .arg(url)
        .args(load_commands(destination, tags))
}

/// Load a torrent from raw metainfo bytes.
#[must_use]
pub fn load_raw(bytes: &[u8], destination: &str, start: bool, tags: &[String]) -> MethodCall {
    let method = if start { "load.raw_start" } else { "load.raw" };
    MethodCall::new(method)
        .arg("")
        .arg(Value::Base64(bytes.to_vec()))
        .args(load_commands(destination, tags))
}

/// Change a global throttle.
#[must_use]
pub fn set_throttle(limit: SpeedLimit) -> MethodCall {
    let method = match limit.direction {
        TransferDirection::Download => "throttle.global_down.max_rate.set",
        TransferDirection::Upload => "throttle.global_up.max_rate.set",
    };
    let rate = i64::try_from(limit.bytes_per_second).unwrap_or(i64::MAX);
    MethodCall::new(method).arg("").arg(rate)
}

/// Peers, files, and trackers of one torrent, in that order.
#[must_use]
pub fn torrent_details(hash: &str) -> Vec<MethodCall> {
    [
        ("p.multicall", field_names(&PEER_FIELDS).collect::<Vec<_>>()),
        ("f.multicall", field_names(&FILE_FIELDS).collect()),
        ("t.multicall", field_names(&TRACKER_FIELDS).collect()),
    ]
    .into_iter()
    .map(|(method, fields)| MethodCall::new(method).args([hash, ""]).args(fields))
    .collect()
}

/// Global rates, totals, and throttles, one call per statistic.
#[must_use]
pub fn transfer_stats() -> Vec<MethodCall> {
    field_names(&TRANSFER_FIELDS)
        .map(|method| MethodCall::new(method).arg(""))
        .collect()
}
