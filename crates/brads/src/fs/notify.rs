//! Call-outs to the notification service.
//!
//! Each method is a no-op when the store has no notification service
//! attached. Callers treat every one of them as best-effort: failures are
//! logged and swallowed, never escalated into the primary operation's
//! result.

use super::records::IssueRecord;
use super::{FsService, paths};
use crate::domain::{RepoSpec, UserSpec};
use crate::error::Result;
use crate::notify::NotificationRequest;
use chrono::{DateTime, Utc};

impl FsService {
    /// Subscribes users to further updates on the issue.
    pub(super) async fn subscribe(
        &self,
        repo: &RepoSpec,
        issue_id: u64,
        subscribers: Vec<UserSpec>,
    ) -> Result<()> {
        let Some(notifications) = &self.notifications else {
            return Ok(());
        };
        notifications.subscribe(repo, issue_id, subscribers).await
    }

    /// Marks the issue read for `user`.
    pub(super) async fn mark_read(
        &self,
        repo: &RepoSpec,
        issue_id: u64,
        user: &UserSpec,
    ) -> Result<()> {
        let Some(notifications) = &self.notifications else {
            return Ok(());
        };
        notifications.mark_read(repo, issue_id, user).await
    }

    /// Notifies all subscribed users of an update at `fragment`.
    pub(super) async fn notify(
        &self,
        repo: &RepoSpec,
        issue_id: u64,
        fragment: &str,
        actor: &UserSpec,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        let Some(notifications) = &self.notifications else {
            return Ok(());
        };

        // The request carries issue title and state, which only storage
        // has at this point.
        let ns = self.namespace(repo)?;
        let issue: IssueRecord =
            brads_records::read_json(paths::comment_path(&ns, issue_id, 0)).await?;

        notifications
            .notify(
                repo,
                issue_id,
                NotificationRequest {
                    title: issue.title,
                    state: issue.state,
                    actor: actor.clone(),
                    updated_at,
                    fragment: fragment.to_owned(),
                },
            )
            .await
    }
}
