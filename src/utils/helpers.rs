//! Name and path helpers shared by the storage facades

use crate::error::{AzstoreError, Result};
use chrono::{DateTime, Utc};

/// Reject empty or whitespace-only resource names.
pub fn require_name(kind: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AzstoreError::invalid_argument(format!(
            "{kind} name cannot be empty"
        )));
    }
    Ok(())
}

/// Strip leading and trailing slashes from a directory path; the empty
/// string denotes the share root.
pub fn normalize_directory(path: &str) -> &str {
    path.trim_matches('/')
}

/// Join a directory path and a child name with `/`.
pub fn join_path(directory: &str, name: &str) -> String {
    let directory = normalize_directory(directory);
    let name = name.trim_start_matches('/');
    if directory.is_empty() {
        name.to_string()
    } else {
        format!("{directory}/{name}")
    }
}

/// Split a path into its non-empty `/` separated segments.
pub fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Convert an SDK timestamp.
pub fn to_utc(timestamp: time::OffsetDateTime) -> DateTime<Utc> {
    DateTime::from_timestamp(timestamp.unix_timestamp(), timestamp.nanosecond())
        .unwrap_or_default()
}
