//! Bulk import from another issue service.

use super::records::{
    CommentRecord, EditedRecord, EventRecord, IssueRecord, LabelRecord, ReactionRecord,
    UserSpecRecord,
};
use super::{FsService, paths};
use crate::domain::{Comment, IssueListOptions, ListOptions, RepoSpec, StateFilter};
use crate::error::Result;
use crate::service::IssueService;
use brads_records::write_json;

impl FsService {
    /// Copies every issue, comment, and event for `repo` from `src` into
    /// this store, preserving IDs, authors, and timestamps.
    ///
    /// Intended for one-time migrations into an empty namespace; copying
    /// an issue whose directory already exists fails.
    ///
    /// # Errors
    ///
    /// Fails on the first read error from `src` or write error to this
    /// store; the namespace may then hold a partial copy.
    pub async fn copy_from(&self, src: &dyn IssueService, repo: &RepoSpec) -> Result<()> {
        let ns = self.namespace(repo)?;
        tokio::fs::create_dir_all(paths::issues_dir(&ns)).await?;

        let guard = self.write_lock.lock().await;

        let issues = src.list(repo, IssueListOptions { state: StateFilter::All }).await?;
        tracing::info!(repo = %repo, issues = issues.len(), "copying issues");
        for issue in issues {
            // The listing carries no bodies; comment 0 does.
            let comments = src.list_comments(repo, issue.id, ListOptions::default()).await?;
            tracing::info!(issue = issue.id, comments = comments.len(), "copying comments");

            tokio::fs::create_dir(paths::issue_dir(&ns, issue.id)).await?;
            tokio::fs::create_dir(paths::events_dir(&ns, issue.id)).await?;

            for comment in comments {
                if comment.id == 0 {
                    let record = IssueRecord {
                        state: issue.state,
                        title: issue.title.clone(),
                        labels: issue.labels.iter().map(LabelRecord::from).collect(),
                        comment: comment_record(comment),
                    };
                    write_json(paths::comment_path(&ns, issue.id, 0), &record).await?;
                } else {
                    let id = comment.id;
                    let record = comment_record(comment);
                    write_json(paths::comment_path(&ns, issue.id, id), &record).await?;
                }
            }

            let events = src.list_events(repo, issue.id, ListOptions::default()).await?;
            tracing::info!(issue = issue.id, events = events.len(), "copying events");
            for event in events {
                let record = EventRecord::new(
                    UserSpecRecord::from(&event.actor.spec),
                    event.created_at,
                    &event.kind,
                );
                write_json(paths::event_path(&ns, issue.id, event.id), &record).await?;
            }
        }

        drop(guard);
        Ok(())
    }
}

/// On-disk form of a comment fetched from another service.
fn comment_record(comment: Comment) -> CommentRecord {
    CommentRecord {
        author: UserSpecRecord::from(&comment.user.spec),
        created_at: comment.created_at,
        edited: comment.edited.map(|edited| EditedRecord {
            by: UserSpecRecord::from(&edited.by.spec),
            at: edited.at,
        }),
        body: comment.body,
        reactions: comment
            .reactions
            .into_iter()
            .map(|reaction| ReactionRecord {
                emoji: reaction.emoji,
                authors: reaction
                    .users
                    .iter()
                    .map(|user| UserSpecRecord::from(&user.spec))
                    .collect(),
            })
            .collect(),
    }
}
