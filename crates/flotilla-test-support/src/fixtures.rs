//! Snapshot row builders mirroring the daemon's `d.multicall2` column order.

use flotilla_rtorrent::Value;

/// Builder for one positional torrent row.
#[derive(Debug, Clone)]
pub struct TorrentRow {
    hash: String,
    name: String,
    base_path: String,
    directory: String,
    size_bytes: i64,
    bytes_done: i64,
    upload_rate: i64,
    download_rate: i64,
    tags: Vec<String>,
    message: String,
    hashing: bool,
    open: bool,
    started: bool,
    trackers: Vec<String>,
}

impl TorrentRow {
    /// A started, open, complete torrent stored under `/downloads/<hash>`.
    #[must_use]
    pub fn seeding(hash: &str) -> Self {
        Self {
            hash: hash.to_string(),
            name: format!("torrent-{hash}"),
            base_path: format!("/downloads/{hash}"),
            directory: "/downloads".to_string(),
            size_bytes: 1_000,
            bytes_done: 1_000,
            upload_rate: 0,
            download_rate: 0,
            tags: Vec::new(),
            message: String::new(),
            hashing: false,
            open: true,
            started: true,
            trackers: Vec::new(),
        }
    }

    /// A closed torrent.
    #[must_use]
    pub fn stopped(hash: &str) -> Self {
        Self {
            open: false,
            started: false,
            ..Self::seeding(hash)
        }
    }

    /// A started torrent that is still downloading.
    #[must_use]
    pub fn downloading(hash: &str) -> Self {
        Self {
            bytes_done: 100,
            download_rate: 512,
            ..Self::seeding(hash)
        }
    }

    /// Override the payload base path.
    #[must_use]
    pub fn base_path(mut self, base_path: &str) -> Self {
        self.base_path = base_path.to_string();
        self
    }

    /// Override the tag list.
    #[must_use]
    pub fn tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|tag| (*tag).to_string()).collect();
        self
    }

    /// Override the tracker announce URLs.
    #[must_use]
    pub fn trackers(mut self, trackers: &[&str]) -> Self {
        self.trackers = trackers.iter().map(|url| (*url).to_string()).collect();
        self
    }

    /// Set a daemon message.
    #[must_use]
    pub fn message(mut self, message: &str) -> Self {
        self.message = message.to_string();
        self
    }

    /// Mark the torrent as hashing.
    #[must_use]
    pub const fn hashing(mut self) -> Self {
        self.hashing = true;
        self
    }

    /// Render the row as the daemon would return it.
    #[must_use]
    pub fn into_value(self) -> Value {
        let complete = self.bytes_done >= self.size_bytes;
        let trackers: String = self
            .trackers
            .iter()
            .map(|url| format!("{url}@!@"))
            .collect();
        Value::Array(vec![
            Value::from(self.hash),
            Value::from(self.name),
            Value::from(self.base_path),
            Value::from(self.directory),
            Value::Int(self.size_bytes),
            Value::Int(self.bytes_done),
            Value::Int(self.upload_rate),
            Value::Int(self.download_rate),
            Value::Int(0),
            Value::Int(0),
            Value::Int(1_000),
            Value::Int(2),
            Value::from(self.tags.join(",")),
            Value::from(self.message),
            Value::Int(i64::from(self.hashing)),
            Value::Int(i64::from(self.open)),
            Value::Int(i64::from(self.started)),
            Value::Int(i64::from(complete)),
            Value::from(trackers),
        ])
    }
}

/// Assemble rows into a `d.multicall2` reply value.
#[must_use]
pub fn snapshot(rows: impl IntoIterator<Item = TorrentRow>) -> Value {
    Value::Array(rows.into_iter().map(TorrentRow::into_value).collect())
}
