//! The user directory collaborator boundary.
//!
//! Issue records store opaque [`UserSpec`] references; resolving them to
//! display users, knowing who the acting identity is, and answering
//! collaborator queries are all jobs of an external user service. Backends
//! consume it through this trait and stay provider-agnostic.

use crate::domain::{RepoSpec, User, UserSpec};
use crate::error::Result;
use async_trait::async_trait;

/// External user service consumed by storage backends.
///
/// All failures should be reported as
/// [`Error::External`](crate::Error::External); backends decide per call
/// site whether a failure is fatal (authorization) or falls back
/// (display-user resolution).
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// The acting identity for the current operation, or `None` for an
    /// anonymous caller.
    async fn authenticated(&self) -> Result<Option<User>>;

    /// Resolve a user reference to a display user.
    ///
    /// Returns `Ok(None)` if the reference does not name a known user.
    async fn get(&self, spec: &UserSpec) -> Result<Option<User>>;

    /// Reports whether `user` is a collaborator on `repo`, as recorded by
    /// the external authority.
    async fn is_collaborator(&self, repo: &RepoSpec, user: &UserSpec) -> Result<bool>;
}
