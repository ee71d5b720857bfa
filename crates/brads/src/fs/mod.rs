//! Filesystem-backed implementation of [`IssueService`].
//!
//! Each repository namespace owns a directory subtree under the store's
//! root; issues, comments, and events are individual JSON record files
//! named by their canonical base-10 ID (the path scheme module documents
//! the layout).
//! Record writes are whole-record atomic replaces, and mutating operations
//! serialize on an internal lock because ID allocation is scan-then-create
//! (two unserialized allocators could be handed the same ID).
//!
//! [`IssueService`]: crate::service::IssueService

mod auth;
mod copier;
mod events;
mod notify;
mod paths;
mod reactions;
mod records;
mod trait_impl;

use crate::domain::{RepoSpec, User, UserSpec};
use crate::error::Result;
use crate::notify::NotificationService;
use crate::users::UserDirectory;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Filesystem-backed issue service.
///
/// Create one with [`FsService::new`]; the root directory must already
/// exist. Namespace subtrees are created on first issue creation.
pub struct FsService {
    /// Root directory for issue storage for all repositories.
    root: PathBuf,

    /// External user service: acting identity, display-user resolution,
    /// collaborator authority.
    users: Arc<dyn UserDirectory>,

    /// External notification service; `None` disables all notification
    /// side effects.
    notifications: Option<Arc<dyn NotificationService>>,

    /// Serializes mutating operations. ID allocation scans the directory
    /// and takes max+1, so allocate-then-create sequences must not
    /// interleave. Reads don't take this lock.
    write_lock: Mutex<()>,
}

impl FsService {
    /// Creates a filesystem-backed issue service rooted at `root`, which
    /// must already exist. It uses the notification service, if any.
    pub fn new(
        root: impl Into<PathBuf>,
        users: Arc<dyn UserDirectory>,
        notifications: Option<Arc<dyn NotificationService>>,
    ) -> Self {
        Self {
            root: root.into(),
            users,
            notifications,
            write_lock: Mutex::new(()),
        }
    }

    /// Storage namespace for a repository, after URI validation.
    fn namespace(&self, repo: &RepoSpec) -> Result<PathBuf> {
        paths::namespace(&self.root, repo)
    }
}

/// Display-user resolution scoped to one operation.
///
/// Comment listings resolve the same authors over and over (every
/// reaction repeats its authors), so each operation carries one of these:
/// an explicit cache that lives exactly as long as the call, instead of
/// process-wide state.
struct ResolvedUsers<'a> {
    users: &'a dyn UserDirectory,
    cache: HashMap<UserSpec, User>,
}

impl<'a> ResolvedUsers<'a> {
    fn new(users: &'a dyn UserDirectory) -> Self {
        Self {
            users,
            cache: HashMap::new(),
        }
    }

    /// Resolves a user reference, falling back to an anonymous
    /// placeholder when the directory can't produce a user.
    async fn resolve(&mut self, spec: UserSpec) -> User {
        if let Some(user) = self.cache.get(&spec) {
            return user.clone();
        }
        let user = match self.users.get(&spec).await {
            Ok(Some(user)) => user,
            Ok(None) | Err(_) => anonymous(spec.clone()),
        };
        self.cache.insert(spec, user.clone());
        user
    }
}

/// Placeholder for user references the directory cannot resolve.
fn anonymous(spec: UserSpec) -> User {
    User {
        login: format!("Anonymous {}", spec.id),
        avatar_url: "https://secure.gravatar.com/avatar?d=mm&f=y&s=96".to_owned(),
        html_url: String::new(),
        site_admin: false,
        spec,
    }
}
