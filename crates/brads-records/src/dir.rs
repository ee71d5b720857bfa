//! Listing and ID allocation over numeric-ID directories.
//!
//! Storage directories name each record file by the canonical base-10
//! encoding of its identifier. That makes the set of existing IDs
//! recoverable from the directory itself: list the entries, parse each name
//! as a `u64`, and ignore everything that does not parse (an `events`
//! subdirectory, editor droppings, in-flight `.tmp` files).

use crate::Result;
use std::path::Path;

/// Reads the directory at `path` and returns the IDs of all entries whose
/// names are base-10 `u64` values, sorted ascending.
///
/// Entries with non-numeric names are ignored. A missing directory is not
/// an error: it holds no IDs, so an empty list is returned.
///
/// # Errors
///
/// Returns [`Error::Io`](crate::Error::Io) for listing failures other than
/// the directory being absent.
pub async fn read_dir_ids<P: AsRef<Path>>(path: P) -> Result<Vec<u64>> {
    let mut entries = match tokio::fs::read_dir(path.as_ref()).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };

    let mut ids = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if let Ok(id) = name.parse::<u64>() {
            ids.push(id);
        }
    }
    ids.sort_unstable();
    Ok(ids)
}

/// Returns the next unused ID for the directory at `path`.
///
/// IDs are sequential starting at 1: the result is one past the highest
/// existing ID, or 1 if the directory is empty or absent.
///
/// This is a scan-then-allocate primitive with no locking of its own; two
/// concurrent callers can be handed the same ID. Callers are expected to
/// serialize allocate-then-create sequences against the same directory.
///
/// # Errors
///
/// Returns [`Error::Io`](crate::Error::Io) if the directory listing fails.
pub async fn next_id<P: AsRef<Path>>(path: P) -> Result<u64> {
    let ids = read_dir_ids(path).await?;
    Ok(match ids.last() {
        Some(max) => max + 1,
        None => 1,
    })
}
