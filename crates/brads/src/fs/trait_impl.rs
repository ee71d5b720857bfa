//! IssueService trait implementation for the filesystem store.

use super::records::{
    CommentRecord, EditedRecord, EventRecord, IssueRecord, LabelRecord, ReactionRecord,
    UserSpecRecord,
};
use super::{FsService, ResolvedUsers, auth, events, paths, reactions};
use crate::domain::{
    Comment, CommentRequest, Edited, Event, Issue, IssueListOptions, IssueRequest, ListOptions,
    NewComment, NewIssue, Reaction, RepoSpec, State, User, UserSpec,
};
use crate::error::{Error, Result};
use crate::service::IssueService;
use async_trait::async_trait;
use brads_records::{next_id, read_dir_ids, read_json, write_json};
use chrono::{DateTime, Utc};

#[async_trait]
impl IssueService for FsService {
    async fn list(&self, repo: &RepoSpec, opt: IssueListOptions) -> Result<Vec<Issue>> {
        let ns = self.namespace(repo)?;
        let mut users = ResolvedUsers::new(self.users.as_ref());

        let mut issues = Vec::new();
        let ids = read_dir_ids(paths::issues_dir(&ns)).await?;
        for id in ids.into_iter().rev() {
            let issue: IssueRecord = read_json(paths::comment_path(&ns, id, 0)).await?;

            if !opt.state.matches(issue.state) {
                continue;
            }

            // Count replies.
            let comments = read_dir_ids(paths::issue_dir(&ns, id)).await?;

            let author = issue.comment.author.user_spec();
            issues.push(Issue {
                id,
                state: issue.state,
                title: issue.title,
                labels: issue.labels.iter().map(LabelRecord::label).collect(),
                comment: comment_summary(
                    0,
                    users.resolve(author).await,
                    issue.comment.created_at,
                    false,
                ),
                replies: comments.len().saturating_sub(1),
            });
        }

        Ok(issues)
    }

    async fn count(&self, repo: &RepoSpec, opt: IssueListOptions) -> Result<u64> {
        let ns = self.namespace(repo)?;

        let mut count = 0;
        for id in read_dir_ids(paths::issues_dir(&ns)).await? {
            let issue: IssueRecord = read_json(paths::comment_path(&ns, id, 0)).await?;
            if opt.state.matches(issue.state) {
                count += 1;
            }
        }

        Ok(count)
    }

    async fn get(&self, repo: &RepoSpec, id: u64) -> Result<Issue> {
        let current = self.users.authenticated().await?;
        let ns = self.namespace(repo)?;

        let issue: IssueRecord = read_json(paths::comment_path(&ns, id, 0)).await?;
        let author = issue.comment.author.user_spec();

        if let Some(user) = &current {
            // Mark as read.
            if let Err(err) = self.mark_read(repo, id, &user.spec).await {
                tracing::warn!(issue = id, %err, "failed to mark issue as read");
            }
        }

        let editable =
            auth::editable(self.users.as_ref(), repo, current.as_ref(), &issue.comment.author)
                .await;
        let mut users = ResolvedUsers::new(self.users.as_ref());
        Ok(Issue {
            id,
            state: issue.state,
            title: issue.title,
            labels: issue.labels.iter().map(LabelRecord::label).collect(),
            comment: comment_summary(
                0,
                users.resolve(author).await,
                issue.comment.created_at,
                editable,
            ),
            replies: 0,
        })
    }

    async fn list_comments(
        &self,
        repo: &RepoSpec,
        id: u64,
        opt: ListOptions,
    ) -> Result<Vec<Comment>> {
        let current = self.users.authenticated().await?;
        let ns = self.namespace(repo)?;
        let mut users = ResolvedUsers::new(self.users.as_ref());

        let ids = paginate(read_dir_ids(paths::issue_dir(&ns, id)).await?, opt);
        let mut comments = Vec::new();
        for comment_id in ids {
            // Comment 0 shares the issue record; the issue-only fields
            // are ignored on decode.
            let comment: CommentRecord =
                read_json(paths::comment_path(&ns, id, comment_id)).await?;

            let user = users.resolve(comment.author.user_spec()).await;
            let edited = resolve_edited(&mut users, comment.edited.as_ref()).await;
            let reactions = resolve_reactions(&mut users, &comment.reactions).await;
            let editable =
                auth::editable(self.users.as_ref(), repo, current.as_ref(), &comment.author)
                    .await;
            comments.push(Comment {
                id: comment_id,
                user,
                created_at: comment.created_at,
                edited,
                body: comment.body,
                reactions,
                editable,
            });
        }

        Ok(comments)
    }

    async fn list_events(&self, repo: &RepoSpec, id: u64, opt: ListOptions) -> Result<Vec<Event>> {
        let ns = self.namespace(repo)?;
        let mut users = ResolvedUsers::new(self.users.as_ref());

        let ids = paginate(read_dir_ids(paths::events_dir(&ns, id)).await?, opt);
        let mut events = Vec::new();
        for event_id in ids {
            let event: EventRecord = read_json(paths::event_path(&ns, id, event_id)).await?;
            events.push(Event {
                id: event_id,
                actor: users.resolve(event.actor.user_spec()).await,
                created_at: event.created_at,
                kind: event.event_kind(),
            });
        }

        Ok(events)
    }

    async fn create(&self, repo: &RepoSpec, new_issue: NewIssue) -> Result<Issue> {
        // Create operation requires an authenticated user.
        let Some(current) = self.users.authenticated().await? else {
            return Err(Error::PermissionDenied);
        };

        new_issue.validate()?;
        if new_issue.reference.is_some() {
            return Err(Error::Unsupported(
                "cross-references are not supported by the filesystem store",
            ));
        }

        let ns = self.namespace(repo)?;
        // Only needed for the first issue in the repository.
        tokio::fs::create_dir_all(paths::issues_dir(&ns)).await?;

        let labels: Vec<LabelRecord> = new_issue.labels.iter().map(LabelRecord::from).collect();
        let record = IssueRecord {
            state: State::Open,
            title: new_issue.title,
            labels,
            comment: CommentRecord {
                author: UserSpecRecord::from(&current.spec),
                created_at: Utc::now(),
                edited: None,
                body: new_issue.body,
                reactions: Vec::new(),
            },
        };
        let author = record.comment.author.user_spec();

        // Commit to storage.
        let guard = self.write_lock.lock().await;
        let issue_id = next_id(paths::issues_dir(&ns)).await?;
        tokio::fs::create_dir(paths::issue_dir(&ns, issue_id)).await?;
        tokio::fs::create_dir(paths::events_dir(&ns, issue_id)).await?;
        write_json(paths::comment_path(&ns, issue_id, 0), &record).await?;
        drop(guard);

        // Subscribe interested users.
        if let Err(err) = self.subscribe(repo, issue_id, vec![author.clone()]).await {
            tracing::warn!(issue = issue_id, %err, "failed to subscribe interested users");
        }
        // Notify subscribed users.
        if let Err(err) = self
            .notify(repo, issue_id, "", &author, record.comment.created_at)
            .await
        {
            tracing::warn!(issue = issue_id, %err, "failed to notify subscribed users");
        }

        let mut users = ResolvedUsers::new(self.users.as_ref());
        Ok(Issue {
            id: issue_id,
            state: record.state,
            title: record.title,
            labels: new_issue.labels,
            comment: Comment {
                id: 0,
                user: users.resolve(author).await,
                created_at: record.comment.created_at,
                edited: None,
                body: record.comment.body,
                reactions: Vec::new(),
                // You can always edit issues you've created.
                editable: true,
            },
            replies: 0,
        })
    }

    async fn create_comment(
        &self,
        repo: &RepoSpec,
        id: u64,
        comment: NewComment,
    ) -> Result<Comment> {
        // CreateComment operation requires an authenticated user.
        let Some(current) = self.users.authenticated().await? else {
            return Err(Error::PermissionDenied);
        };

        comment.validate()?;

        let ns = self.namespace(repo)?;
        let record = CommentRecord {
            author: UserSpecRecord::from(&current.spec),
            created_at: Utc::now(),
            edited: None,
            body: comment.body,
            reactions: Vec::new(),
        };
        let author = record.author.user_spec();

        // Commit to storage. A missing issue surfaces as not-found on the
        // record write.
        let guard = self.write_lock.lock().await;
        let comment_id = next_id(paths::issue_dir(&ns, id)).await?;
        write_json(paths::comment_path(&ns, id, comment_id), &record).await?;
        drop(guard);

        // Subscribe interested users.
        if let Err(err) = self.subscribe(repo, id, vec![author.clone()]).await {
            tracing::warn!(issue = id, %err, "failed to subscribe interested users");
        }
        // Notify subscribed users.
        if let Err(err) = self
            .notify(
                repo,
                id,
                &format!("comment-{comment_id}"),
                &author,
                record.created_at,
            )
            .await
        {
            tracing::warn!(issue = id, %err, "failed to notify subscribed users");
        }

        let mut users = ResolvedUsers::new(self.users.as_ref());
        Ok(Comment {
            id: comment_id,
            user: users.resolve(author).await,
            created_at: record.created_at,
            edited: None,
            body: record.body,
            reactions: Vec::new(),
            // You can always edit comments you've created.
            editable: true,
        })
    }

    async fn edit(
        &self,
        repo: &RepoSpec,
        id: u64,
        request: IssueRequest,
    ) -> Result<(Issue, Vec<Event>)> {
        let Some(current) = self.users.authenticated().await? else {
            return Err(Error::PermissionDenied);
        };

        request.validate()?;

        let ns = self.namespace(repo)?;
        let guard = self.write_lock.lock().await;

        // Get from storage.
        let mut issue: IssueRecord = read_json(paths::comment_path(&ns, id, 0)).await?;

        // Authorization check.
        auth::can_edit(self.users.as_ref(), repo, Some(&current), &issue.comment.author).await?;

        let author = issue.comment.author.user_spec();
        let actor = current.spec.clone();

        // Apply edits.
        let orig_state = issue.state;
        if let Some(state) = request.state {
            issue.state = state;
        }
        let orig_title = issue.title.clone();
        if let Some(title) = &request.title {
            issue.title = title.clone();
        }

        // Commit to storage.
        write_json(paths::comment_path(&ns, id, 0), &issue).await?;

        // Derive the audit event and commit it to storage.
        let created_at = Utc::now();
        let mut users = ResolvedUsers::new(self.users.as_ref());
        let mut derived = Vec::new();
        if let Some(kind) = events::derive_event(&request, orig_state, &orig_title) {
            let event_id = next_id(paths::events_dir(&ns, id)).await?;
            let record = EventRecord::new(UserSpecRecord::from(&actor), created_at, &kind);
            write_json(paths::event_path(&ns, id, event_id), &record).await?;

            derived.push(Event {
                id: event_id,
                actor: users.resolve(actor.clone()).await,
                created_at,
                kind,
            });
        }
        drop(guard);

        if request.state.is_some_and(|state| state != orig_state) {
            // Subscribe interested users.
            if let Err(err) = self.subscribe(repo, id, vec![actor.clone()]).await {
                tracing::warn!(issue = id, %err, "failed to subscribe interested users");
            }
            // Notify subscribed users.
            if let Err(err) = self.notify(repo, id, "", &actor, created_at).await {
                tracing::warn!(issue = id, %err, "failed to notify subscribed users");
            }
        }

        Ok((
            Issue {
                id,
                state: issue.state,
                title: issue.title,
                labels: issue.labels.iter().map(LabelRecord::label).collect(),
                comment: comment_summary(
                    0,
                    users.resolve(author).await,
                    issue.comment.created_at,
                    // You can always edit issues you've edited.
                    true,
                ),
                replies: 0,
            },
            derived,
        ))
    }

    async fn edit_comment(
        &self,
        repo: &RepoSpec,
        id: u64,
        request: CommentRequest,
    ) -> Result<Comment> {
        let Some(current) = self.users.authenticated().await? else {
            return Err(Error::PermissionDenied);
        };

        let requires_edit = request.validate()?;

        let ns = self.namespace(repo)?;
        let mut users = ResolvedUsers::new(self.users.as_ref());
        let edited_at = Utc::now();

        let guard = self.write_lock.lock().await;

        if request.id == 0 {
            // The issue description shares the issue record; rewriting it
            // must keep the issue-only fields.
            let mut issue: IssueRecord = read_json(paths::comment_path(&ns, id, 0)).await?;

            self.authorize_comment_edit(repo, requires_edit, &current, &issue.comment.author)
                .await?;
            let author = issue.comment.author.user_spec();

            apply_comment_edit(&mut issue.comment, &current.spec, &request, edited_at)?;

            // Commit to storage.
            write_json(paths::comment_path(&ns, id, 0), &issue).await?;
            drop(guard);

            if request.body.is_some() {
                // Subscribe interested users.
                if let Err(err) = self.subscribe(repo, id, vec![current.spec.clone()]).await {
                    tracing::warn!(issue = id, %err, "failed to subscribe interested users");
                }
            }

            let edited = resolve_edited(&mut users, issue.comment.edited.as_ref()).await;
            let reactions = resolve_reactions(&mut users, &issue.comment.reactions).await;
            return Ok(Comment {
                id: 0,
                user: users.resolve(author).await,
                created_at: issue.comment.created_at,
                edited,
                body: issue.comment.body,
                reactions,
                // You can always edit comments you've edited.
                editable: true,
            });
        }

        // Get from storage.
        let mut comment: CommentRecord =
            read_json(paths::comment_path(&ns, id, request.id)).await?;

        self.authorize_comment_edit(repo, requires_edit, &current, &comment.author)
            .await?;
        let author = comment.author.user_spec();

        apply_comment_edit(&mut comment, &current.spec, &request, edited_at)?;

        // Commit to storage.
        write_json(paths::comment_path(&ns, id, request.id), &comment).await?;
        drop(guard);

        if request.body.is_some() {
            // Subscribe interested users.
            if let Err(err) = self.subscribe(repo, id, vec![current.spec.clone()]).await {
                tracing::warn!(issue = id, %err, "failed to subscribe interested users");
            }
        }

        let edited = resolve_edited(&mut users, comment.edited.as_ref()).await;
        let reactions = resolve_reactions(&mut users, &comment.reactions).await;
        Ok(Comment {
            id: request.id,
            user: users.resolve(author).await,
            created_at: comment.created_at,
            edited,
            body: comment.body,
            reactions,
            // You can always edit comments you've edited.
            editable: true,
        })
    }
}

impl FsService {
    /// Authorization for a comment edit: body edits need full edit
    /// authorization, reaction-only requests need react authorization.
    async fn authorize_comment_edit(
        &self,
        repo: &RepoSpec,
        requires_edit: bool,
        current: &User,
        author: &UserSpecRecord,
    ) -> Result<()> {
        if requires_edit {
            auth::can_edit(self.users.as_ref(), repo, Some(current), author).await
        } else {
            auth::can_react(Some(current))
        }
    }
}

/// Applies a comment edit to the record in memory: body replacement with
/// the edit-audit stamp, and/or a single reaction toggle.
fn apply_comment_edit(
    comment: &mut CommentRecord,
    actor: &UserSpec,
    request: &CommentRequest,
    edited_at: DateTime<Utc>,
) -> Result<()> {
    if let Some(body) = &request.body {
        comment.body = body.clone();
        comment.edited = Some(EditedRecord {
            by: UserSpecRecord::from(actor),
            at: edited_at,
        });
    }
    if let Some(emoji) = &request.reaction {
        reactions::toggle_reaction(comment, actor, emoji)?;
    }
    Ok(())
}

/// Applies a pagination window to an ascending ID sequence.
fn paginate(ids: Vec<u64>, opt: ListOptions) -> Vec<u64> {
    let iter = ids.into_iter().skip(opt.start.unwrap_or(0));
    match opt.length {
        Some(length) => iter.take(length).collect(),
        None => iter.collect(),
    }
}

/// Comment metadata without body or reactions, as returned by issue list
/// and get operations.
fn comment_summary(id: u64, user: User, created_at: DateTime<Utc>, editable: bool) -> Comment {
    Comment {
        id,
        user,
        created_at,
        edited: None,
        body: String::new(),
        reactions: Vec::new(),
        editable,
    }
}

async fn resolve_edited(
    users: &mut ResolvedUsers<'_>,
    edited: Option<&EditedRecord>,
) -> Option<Edited> {
    match edited {
        Some(edited) => Some(Edited {
            by: users.resolve(edited.by.user_spec()).await,
            at: edited.at,
        }),
        None => None,
    }
}

async fn resolve_reactions(
    users: &mut ResolvedUsers<'_>,
    records: &[ReactionRecord],
) -> Vec<Reaction> {
    let mut reactions = Vec::new();
    for record in records {
        let mut reacted = Vec::new();
        for author in &record.authors {
            reacted.push(users.resolve(author.user_spec()).await);
        }
        reactions.push(Reaction {
            emoji: record.emoji.clone(),
            users: reacted,
        });
    }
    reactions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginate_windows_the_id_sequence() {
        let ids = vec![0, 1, 2, 3, 4];

        assert_eq!(paginate(ids.clone(), ListOptions::default()), ids);
        assert_eq!(
            paginate(
                ids.clone(),
                ListOptions {
                    start: Some(2),
                    length: None,
                }
            ),
            vec![2, 3, 4]
        );
        assert_eq!(
            paginate(
                ids.clone(),
                ListOptions {
                    start: Some(1),
                    length: Some(2),
                }
            ),
            vec![1, 2]
        );
        assert_eq!(
            paginate(
                ids,
                ListOptions {
                    start: Some(10),
                    length: Some(2),
                }
            ),
            Vec::<u64>::new()
        );
    }
}
