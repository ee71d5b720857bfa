//! Path scheme for the filesystem store.
//!
//! Tree layout, per repository namespace:
//!
//! ```text
//! root
//! └── example.org
//!     └── project
//!         └── issues
//!             ├── 1
//!             │   ├── 0 - encoded issue (comment 0)
//!             │   ├── 1 - encoded reply comment
//!             │   ├── 2
//!             │   └── events
//!             │       ├── 1 - encoded event
//!             │       └── 2
//!             └── 2
//!                 ├── 0
//!                 └── events
//! ```
//!
//! Path segments for entity IDs are the canonical base-10 encoding of the
//! ID, which is what lets ID allocation reconstruct existing IDs from
//! directory entry names.

use crate::domain::RepoSpec;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Directory name for issue storage within a namespace.
const ISSUES_DIR: &str = "issues";

/// Directory name for an issue's events.
const EVENTS_DIR: &str = "events";

/// Resolves the storage namespace for a repository under `root`.
///
/// # Errors
///
/// Returns [`Error::Validation`] if the repository URI is not a clean
/// relative path (empty, absolute, or containing `.`/`..` segments or
/// backslashes).
pub(super) fn namespace(root: &Path, repo: &RepoSpec) -> Result<PathBuf> {
    let uri = &repo.uri;
    let clean = !uri.is_empty()
        && !uri.contains('\\')
        && uri
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..");
    if !clean {
        return Err(Error::Validation(format!("invalid repo URI (not clean): {uri:?}")));
    }
    Ok(root.join(uri))
}

/// Issue storage dir for a namespace.
pub(super) fn issues_dir(ns: &Path) -> PathBuf {
    ns.join(ISSUES_DIR)
}

/// Dir holding one issue's comment records (and its events subdir).
pub(super) fn issue_dir(ns: &Path, issue_id: u64) -> PathBuf {
    issues_dir(ns).join(issue_id.to_string())
}

/// Path of one comment record; comment 0 is the issue itself.
pub(super) fn comment_path(ns: &Path, issue_id: u64, comment_id: u64) -> PathBuf {
    issue_dir(ns, issue_id).join(comment_id.to_string())
}

/// Dir holding one issue's event records.
pub(super) fn events_dir(ns: &Path, issue_id: u64) -> PathBuf {
    issue_dir(ns, issue_id).join(EVENTS_DIR)
}

/// Path of one event record.
pub(super) fn event_path(ns: &Path, issue_id: u64, event_id: u64) -> PathBuf {
    events_dir(ns, issue_id).join(event_id.to_string())
}
