//! Input checks applied before anything is dispatched to the daemon.

use std::collections::HashSet;

use crate::error::{TorrentError, TorrentResult};

/// Trim, upper-case, and de-duplicate torrent identifiers, keeping first-seen order.
///
/// # Errors
///
/// Returns a validation error when no non-blank identifier remains.
pub fn normalize_hashes(hashes: &[String]) -> TorrentResult<Vec<String>> {
    let mut seen = HashSet::new();
    let normalized: Vec<String> = hashes
        .iter()
        .map(|hash| hash.trim().to_ascii_uppercase())
        .filter(|hash| !hash.is_empty())
        .filter(|hash| seen.insert(hash.clone()))
        .collect();
    if normalized.is_empty() {
        return Err(TorrentError::validation("hashes", "empty"));
    }
    Ok(normalized)
}

/// Validate a destination directory on the daemon host.
///
/// # Errors
///
/// Returns a validation error for blank paths or paths containing NUL bytes.
pub fn validate_destination(destination: &str) -> TorrentResult<String> {
    let trimmed = destination.trim();
    if trimmed.is_empty() {
        return Err(TorrentError::validation("destination", "empty"));
    }
    if trimmed.contains('\0') {
        return Err(TorrentError::validation("destination", "contains NUL"));
    }
    Ok(trimmed.to_string())
}

/// Trim tags and drop blanks and duplicates; commas are reserved as the daemon-side separator.
///
/// # Errors
///
/// Returns a validation error when a tag contains a comma.
pub fn normalize_tags(tags: &[String]) -> TorrentResult<Vec<String>> {
    let mut seen = HashSet::new();
    let mut normalized = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() {
            continue;
        }
        if tag.contains(',') {
            return Err(TorrentError::validation("tags", "contains comma"));
        }
        if seen.insert(tag.to_string()) {
            normalized.push(tag.to_string());
        }
    }
    Ok(normalized)
}
