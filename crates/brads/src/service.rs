//! The pluggable issue service contract.
//!
//! [`IssueService`] is the seam every storage backend implements: the
//! filesystem store in [`fs`](crate::fs), and out-of-tree adapters over
//! third-party trackers. The trait is object-safe, allowing dynamic
//! dispatch via `Box<dyn IssueService>` or `Arc<dyn IssueService>`.
//!
//! # Method categories
//!
//! - **Queries**: `list`, `count`, `get`, `list_comments`, `list_events`
//! - **Creation**: `create`, `create_comment`
//! - **Mutation**: `edit`, `edit_comment`
//!
//! # Identity
//!
//! Backends learn the acting identity from their injected user directory
//! rather than from per-call parameters. Queries work for anonymous
//! callers (with `editable` reported as `false`); creation and mutation
//! require an authenticated identity.
//!
//! # Error handling
//!
//! All methods return [`Result`] with the crate-wide [`Error`] taxonomy:
//! validation and permission failures are detected before any mutation and
//! are recoverable by the caller; storage failures abort the operation and
//! are surfaced verbatim.
//!
//! [`Error`]: crate::Error

use crate::domain::{
    Comment, CommentRequest, Event, Issue, IssueListOptions, IssueRequest, ListOptions,
    NewComment, NewIssue, RepoSpec,
};
use crate::error::Result;
use async_trait::async_trait;

/// Core service trait for issue management.
///
/// Implementations must be `Send + Sync`. All methods take `&self`;
/// backends that need write serialization use interior locking.
#[async_trait]
pub trait IssueService: Send + Sync {
    /// List issues in the repository, newest first.
    ///
    /// Issues are filtered by the options' state filter and returned in
    /// reverse-creation order (highest ID first). Each issue carries its
    /// reply count and summary comment metadata; bodies and reactions are
    /// served by [`list_comments`](IssueService::list_comments).
    async fn list(&self, repo: &RepoSpec, opt: IssueListOptions) -> Result<Vec<Issue>>;

    /// Count issues in the repository matching the state filter.
    async fn count(&self, repo: &RepoSpec, opt: IssueListOptions) -> Result<u64>;

    /// Get a single issue.
    ///
    /// `editable` reflects whether the acting identity may edit the issue.
    /// For an authenticated caller the issue is marked read with the
    /// notification service as a best-effort side effect.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`](crate::Error::NotFound) if the issue
    /// doesn't exist.
    async fn get(&self, repo: &RepoSpec, id: u64) -> Result<Issue>;

    /// List comments on an issue in ascending ID order.
    ///
    /// Comment 0 is the issue description. Reactions and edit-audit
    /// metadata are resolved for each comment, and `editable` is computed
    /// per comment for the acting identity. The options' pagination window
    /// applies to the ID sequence.
    async fn list_comments(
        &self,
        repo: &RepoSpec,
        id: u64,
        opt: ListOptions,
    ) -> Result<Vec<Comment>>;

    /// List events on an issue in ascending ID order.
    async fn list_events(&self, repo: &RepoSpec, id: u64, opt: ListOptions) -> Result<Vec<Event>>;

    /// Create a new issue.
    ///
    /// The issue starts open, its description becomes comment 0, and the
    /// author is subscribed and notified best-effort. Returns the created
    /// issue marked editable.
    ///
    /// # Errors
    ///
    /// - [`Error::PermissionDenied`](crate::Error::PermissionDenied) for
    ///   anonymous callers
    /// - [`Error::Validation`](crate::Error::Validation) for a blank title
    /// - [`Error::Unsupported`](crate::Error::Unsupported) if the payload
    ///   carries fields the backend does not support
    async fn create(&self, repo: &RepoSpec, new_issue: NewIssue) -> Result<Issue>;

    /// Create a reply comment on an issue.
    ///
    /// # Errors
    ///
    /// - [`Error::PermissionDenied`](crate::Error::PermissionDenied) for
    ///   anonymous callers
    /// - [`Error::Validation`](crate::Error::Validation) for a blank body
    /// - [`Error::NotFound`](crate::Error::NotFound) if the issue doesn't
    ///   exist
    async fn create_comment(&self, repo: &RepoSpec, id: u64, comment: NewComment)
    -> Result<Comment>;

    /// Edit an issue's state and/or title.
    ///
    /// Only fields present in the request are applied. At most one audit
    /// event is derived per call - a state transition, or a rename when
    /// the state did not change - and appended to the issue's event log.
    /// Returns the updated issue together with the derived events (zero or
    /// one element).
    ///
    /// # Errors
    ///
    /// - [`Error::PermissionDenied`](crate::Error::PermissionDenied) if the
    ///   caller is anonymous or is not the author, a site admin, or a
    ///   repository collaborator
    /// - [`Error::NotFound`](crate::Error::NotFound) if the issue doesn't
    ///   exist
    async fn edit(
        &self,
        repo: &RepoSpec,
        id: u64,
        request: IssueRequest,
    ) -> Result<(Issue, Vec<Event>)>;

    /// Edit a comment's body and/or toggle one reaction.
    ///
    /// `request.id` 0 denotes the issue description, which routes to the
    /// issue record. Body edits require edit authorization and stamp the
    /// edit-audit metadata; reaction-only requests require only an
    /// authenticated identity. The returned comment is always editable:
    /// the caller just edited it.
    ///
    /// # Errors
    ///
    /// - [`Error::PermissionDenied`](crate::Error::PermissionDenied) per
    ///   the authorization rules above
    /// - [`Error::Validation`](crate::Error::Validation) for an empty
    ///   request or blank body
    /// - [`Error::TooManyReactions`](crate::Error::TooManyReactions) if a
    ///   toggle would exceed the per-user reaction quota
    /// - [`Error::NotFound`](crate::Error::NotFound) if the issue or
    ///   comment doesn't exist
    async fn edit_comment(
        &self,
        repo: &RepoSpec,
        id: u64,
        request: CommentRequest,
    ) -> Result<Comment>;
}
