//! The notification service collaborator boundary.
//!
//! Storage backends call out to an external notification/subscription
//! service at defined points: subscribing interested users on writes,
//! marking an issue read when fetched, and pushing a notification after an
//! update. Every call is best-effort from the backend's perspective -
//! failures are logged and swallowed, never escalated into the primary
//! operation's result.

use crate::domain::{RepoSpec, State, UserSpec};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// A notification pushed to subscribers after an issue update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    /// Title of the issue the update happened on.
    pub title: String,

    /// State of the issue after the update.
    pub state: State,

    /// Who caused the update.
    pub actor: UserSpec,

    /// When the update happened.
    pub updated_at: DateTime<Utc>,

    /// URL fragment locating the update within the issue (e.g.
    /// `comment-3`), empty for the issue itself.
    pub fragment: String,
}

/// External notification and subscription service.
#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Subscribe users to further updates on an issue.
    async fn subscribe(
        &self,
        repo: &RepoSpec,
        issue_id: u64,
        subscribers: Vec<UserSpec>,
    ) -> Result<()>;

    /// Mark an issue read for one user.
    async fn mark_read(&self, repo: &RepoSpec, issue_id: u64, user: &UserSpec) -> Result<()>;

    /// Notify all subscribed users of an update.
    async fn notify(
        &self,
        repo: &RepoSpec,
        issue_id: u64,
        request: NotificationRequest,
    ) -> Result<()>;
}
