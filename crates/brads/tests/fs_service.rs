//! End-to-end tests for the filesystem-backed issue service.

use async_trait::async_trait;
use brads::domain::{
    CommentRequest, EmojiId, EventKind, IssueListOptions, IssueRequest, ListOptions, NewComment,
    NewIssue, Reference, RepoSpec, State, StateFilter, User, UserSpec,
};
use brads::fs::FsService;
use brads::notify::{NotificationRequest, NotificationService};
use brads::users::UserDirectory;
use brads::{Error, IssueService, Result};
use std::sync::{Arc, Mutex};

/// User directory fake: a fixed user set, a switchable acting identity,
/// and an explicit collaborator list.
struct TestDirectory {
    authenticated: Mutex<Option<User>>,
    users: Vec<User>,
    collaborators: Mutex<Vec<(RepoSpec, UserSpec)>>,
}

impl TestDirectory {
    fn new(users: Vec<User>) -> Arc<Self> {
        Arc::new(Self {
            authenticated: Mutex::new(None),
            users,
            collaborators: Mutex::new(Vec::new()),
        })
    }

    fn sign_in(&self, user: Option<User>) {
        *self.authenticated.lock().unwrap() = user;
    }

    fn add_collaborator(&self, repo: &RepoSpec, user: &UserSpec) {
        self.collaborators
            .lock()
            .unwrap()
            .push((repo.clone(), user.clone()));
    }
}

#[async_trait]
impl UserDirectory for TestDirectory {
    async fn authenticated(&self) -> Result<Option<User>> {
        Ok(self.authenticated.lock().unwrap().clone())
    }

    async fn get(&self, spec: &UserSpec) -> Result<Option<User>> {
        Ok(self.users.iter().find(|u| u.spec == *spec).cloned())
    }

    async fn is_collaborator(&self, repo: &RepoSpec, user: &UserSpec) -> Result<bool> {
        Ok(self
            .collaborators
            .lock()
            .unwrap()
            .iter()
            .any(|(r, u)| r == repo && u == user))
    }
}

/// Notification service fake that records every call.
#[derive(Default)]
struct RecordingNotifications {
    calls: Mutex<Vec<String>>,
}

impl RecordingNotifications {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationService for RecordingNotifications {
    async fn subscribe(
        &self,
        repo: &RepoSpec,
        issue_id: u64,
        subscribers: Vec<UserSpec>,
    ) -> Result<()> {
        let ids: Vec<String> = subscribers.iter().map(|s| s.id.to_string()).collect();
        self.calls
            .lock()
            .unwrap()
            .push(format!("subscribe {repo} {issue_id} [{}]", ids.join(",")));
        Ok(())
    }

    async fn mark_read(&self, repo: &RepoSpec, issue_id: u64, user: &UserSpec) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("mark_read {repo} {issue_id} {}", user.id));
        Ok(())
    }

    async fn notify(
        &self,
        repo: &RepoSpec,
        issue_id: u64,
        request: NotificationRequest,
    ) -> Result<()> {
        self.calls.lock().unwrap().push(format!(
            "notify {repo} {issue_id} {:?} fragment={:?}",
            request.title, request.fragment
        ));
        Ok(())
    }
}

fn user(id: u64, login: &str, site_admin: bool) -> User {
    User {
        spec: UserSpec::local(id),
        login: login.to_owned(),
        avatar_url: format!("https://example.org/{login}.png"),
        html_url: format!("https://example.org/{login}"),
        site_admin,
    }
}

struct Harness {
    _root: tempfile::TempDir,
    service: FsService,
    directory: Arc<TestDirectory>,
    notifications: Arc<RecordingNotifications>,
    repo: RepoSpec,
}

fn harness() -> Harness {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let root = tempfile::tempdir().unwrap();
    let directory = TestDirectory::new(vec![
        user(1, "alice", false),
        user(2, "bob", false),
        user(3, "carol", false),
        user(4, "admin", true),
    ]);
    let notifications = Arc::new(RecordingNotifications::default());
    let service = FsService::new(
        root.path(),
        directory.clone(),
        Some(notifications.clone()),
    );
    Harness {
        _root: root,
        service,
        directory,
        notifications,
        repo: RepoSpec::from("example.org/project"),
    }
}

fn new_issue(title: &str, body: &str) -> NewIssue {
    NewIssue {
        title: title.to_owned(),
        body: body.to_owned(),
        ..Default::default()
    }
}

fn reaction_request(comment_id: u64, emoji: &str) -> CommentRequest {
    CommentRequest {
        id: comment_id,
        reaction: Some(EmojiId::from(emoji)),
        ..Default::default()
    }
}

#[tokio::test]
async fn issue_lifecycle_scenario() -> anyhow::Result<()> {
    let h = harness();
    h.directory.sign_in(Some(user(1, "alice", false)));

    // Create an issue.
    let issue = h.service.create(&h.repo, new_issue("T1", "B1")).await?;
    assert_eq!(issue.id, 1);
    assert_eq!(issue.state, State::Open);
    assert_eq!(issue.title, "T1");
    assert_eq!(issue.replies, 0);
    assert_eq!(issue.comment.id, 0);
    assert_eq!(issue.comment.body, "B1");
    assert_eq!(issue.comment.user.login, "alice");
    assert!(issue.comment.editable);

    let comments = h
        .service
        .list_comments(&h.repo, 1, ListOptions::default())
        .await?;
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].id, 0);
    assert_eq!(comments[0].body, "B1");

    // Add a reply; the description is comment 0, so the first reply is 1.
    let reply = h
        .service
        .create_comment(
            &h.repo,
            1,
            NewComment {
                body: "C1".to_owned(),
            },
        )
        .await?;
    assert_eq!(reply.id, 1);
    assert_eq!(reply.body, "C1");
    assert!(reply.editable);

    let listed = h
        .service
        .list(&h.repo, IssueListOptions::default())
        .await?;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].replies, 1);

    // Close the issue.
    let (issue, events) = h
        .service
        .edit(
            &h.repo,
            1,
            IssueRequest {
                state: Some(State::Closed),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(issue.state, State::Closed);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, EventKind::Closed);

    assert_eq!(
        h.service
            .count(&h.repo, IssueListOptions { state: StateFilter::Open })
            .await?,
        0
    );
    assert_eq!(
        h.service
            .count(&h.repo, IssueListOptions { state: StateFilter::Closed })
            .await?,
        1
    );
    assert_eq!(
        h.service
            .count(&h.repo, IssueListOptions { state: StateFilter::All })
            .await?,
        1
    );

    // Toggle a reaction on the reply, then toggle it back off.
    let comment = h
        .service
        .edit_comment(&h.repo, 1, reaction_request(1, "heart"))
        .await?;
    assert_eq!(comment.reactions.len(), 1);
    assert_eq!(comment.reactions[0].emoji.as_str(), "heart");
    assert_eq!(comment.reactions[0].users.len(), 1);
    assert_eq!(comment.reactions[0].users[0].login, "alice");

    let comment = h
        .service
        .edit_comment(&h.repo, 1, reaction_request(1, "heart"))
        .await?;
    assert!(comment.reactions.is_empty());

    // Reopen; the event log now holds the full history in order.
    let (_, events) = h
        .service
        .edit(
            &h.repo,
            1,
            IssueRequest {
                state: Some(State::Open),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(events[0].kind, EventKind::Reopened);

    let events = h
        .service
        .list_events(&h.repo, 1, ListOptions::default())
        .await?;
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].id, 1);
    assert_eq!(events[0].kind, EventKind::Closed);
    assert_eq!(events[1].id, 2);
    assert_eq!(events[1].kind, EventKind::Reopened);
    assert_eq!(events[0].actor.login, "alice");

    Ok(())
}

#[tokio::test]
async fn issues_list_newest_first_with_sequential_ids() -> anyhow::Result<()> {
    let h = harness();
    h.directory.sign_in(Some(user(1, "alice", false)));

    for n in 1..=3 {
        let issue = h
            .service
            .create(&h.repo, new_issue(&format!("T{n}"), "body"))
            .await?;
        assert_eq!(issue.id, n);
    }

    let listed = h
        .service
        .list(&h.repo, IssueListOptions::default())
        .await?;
    let ids: Vec<u64> = listed.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![3, 2, 1]);

    Ok(())
}

#[tokio::test]
async fn on_disk_layout_matches_the_scheme() -> anyhow::Result<()> {
    let h = harness();
    h.directory.sign_in(Some(user(1, "alice", false)));

    h.service.create(&h.repo, new_issue("T1", "B1")).await?;
    h.service
        .create_comment(
            &h.repo,
            1,
            NewComment {
                body: "C1".to_owned(),
            },
        )
        .await?;
    h.service
        .edit(
            &h.repo,
            1,
            IssueRequest {
                state: Some(State::Closed),
                ..Default::default()
            },
        )
        .await?;

    let ns = h._root.path().join("example.org/project");
    assert!(ns.join("issues/1/0").is_file());
    assert!(ns.join("issues/1/1").is_file());
    assert!(ns.join("issues/1/events").is_dir());
    assert!(ns.join("issues/1/events/1").is_file());

    // Records are self-describing JSON in the stable wire format.
    let raw = std::fs::read(ns.join("issues/1/0"))?;
    let issue: serde_json::Value = serde_json::from_slice(&raw)?;
    assert_eq!(issue["State"], "closed");
    assert_eq!(issue["Title"], "T1");
    assert_eq!(issue["Body"], "B1");
    assert_eq!(issue["Author"]["ID"], 1);

    let raw = std::fs::read(ns.join("issues/1/events/1"))?;
    let event: serde_json::Value = serde_json::from_slice(&raw)?;
    assert_eq!(event["Type"], "closed");
    assert_eq!(event["Actor"]["ID"], 1);

    Ok(())
}

#[tokio::test]
async fn anonymous_callers_can_read_but_not_write() -> anyhow::Result<()> {
    let h = harness();
    h.directory.sign_in(Some(user(1, "alice", false)));
    h.service.create(&h.repo, new_issue("T1", "B1")).await?;

    h.directory.sign_in(None);

    assert!(matches!(
        h.service.create(&h.repo, new_issue("T2", "B2")).await,
        Err(Error::PermissionDenied)
    ));
    assert!(matches!(
        h.service
            .create_comment(
                &h.repo,
                1,
                NewComment {
                    body: "C1".to_owned()
                }
            )
            .await,
        Err(Error::PermissionDenied)
    ));
    assert!(matches!(
        h.service
            .edit(
                &h.repo,
                1,
                IssueRequest {
                    state: Some(State::Closed),
                    ..Default::default()
                }
            )
            .await,
        Err(Error::PermissionDenied)
    ));
    assert!(matches!(
        h.service
            .edit_comment(&h.repo, 1, reaction_request(0, "heart"))
            .await,
        Err(Error::PermissionDenied)
    ));

    // Reads still work, with nothing editable.
    let issue = h.service.get(&h.repo, 1).await?;
    assert!(!issue.comment.editable);
    let comments = h
        .service
        .list_comments(&h.repo, 1, ListOptions::default())
        .await?;
    assert!(!comments[0].editable);

    Ok(())
}

#[tokio::test]
async fn edit_authorization_follows_the_guard() -> anyhow::Result<()> {
    let h = harness();
    h.directory.sign_in(Some(user(1, "alice", false)));
    h.service.create(&h.repo, new_issue("T1", "B1")).await?;

    let rename = IssueRequest {
        title: Some("T1 renamed".to_owned()),
        ..Default::default()
    };

    // A non-author without elevated status may react, but not edit.
    h.directory.sign_in(Some(user(2, "bob", false)));
    assert!(matches!(
        h.service.edit(&h.repo, 1, rename.clone()).await,
        Err(Error::PermissionDenied)
    ));
    assert!(matches!(
        h.service
            .edit_comment(
                &h.repo,
                1,
                CommentRequest {
                    id: 0,
                    body: Some("hijacked".to_owned()),
                    ..Default::default()
                }
            )
            .await,
        Err(Error::PermissionDenied)
    ));
    let comment = h
        .service
        .edit_comment(&h.repo, 1, reaction_request(0, "+1"))
        .await?;
    assert_eq!(comment.reactions[0].users[0].login, "bob");

    // Collaborator status grants edit.
    h.directory.sign_in(Some(user(3, "carol", false)));
    h.directory.add_collaborator(&h.repo, &UserSpec::local(3));
    let (issue, events) = h.service.edit(&h.repo, 1, rename.clone()).await?;
    assert_eq!(issue.title, "T1 renamed");
    assert_eq!(events.len(), 1);

    // So does site admin.
    h.directory.sign_in(Some(user(4, "admin", true)));
    let (issue, _) = h
        .service
        .edit(
            &h.repo,
            1,
            IssueRequest {
                title: Some("T1 final".to_owned()),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(issue.title, "T1 final");

    Ok(())
}

#[tokio::test]
async fn renames_derive_a_single_event_with_details() -> anyhow::Result<()> {
    let h = harness();
    h.directory.sign_in(Some(user(1, "alice", false)));
    h.service.create(&h.repo, new_issue("old title", "B1")).await?;

    let (_, events) = h
        .service
        .edit(
            &h.repo,
            1,
            IssueRequest {
                title: Some("new title".to_owned()),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(events.len(), 1);
    match &events[0].kind {
        EventKind::Renamed(rename) => {
            assert_eq!(rename.from, "old title");
            assert_eq!(rename.to, "new title");
        }
        other => panic!("expected a rename event, got {other:?}"),
    }

    // A combined state+title edit emits only the state event.
    let (_, events) = h
        .service
        .edit(
            &h.repo,
            1,
            IssueRequest {
                state: Some(State::Closed),
                title: Some("another title".to_owned()),
            },
        )
        .await?;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, EventKind::Closed);

    // Both edits applied even though only one event was derived.
    let issue = h.service.get(&h.repo, 1).await?;
    assert_eq!(issue.state, State::Closed);
    assert_eq!(issue.title, "another title");

    Ok(())
}

#[tokio::test]
async fn body_edits_stamp_audit_metadata() -> anyhow::Result<()> {
    let h = harness();
    h.directory.sign_in(Some(user(1, "alice", false)));
    h.service.create(&h.repo, new_issue("T1", "B1")).await?;

    h.directory.sign_in(Some(user(4, "admin", true)));
    let comment = h
        .service
        .edit_comment(
            &h.repo,
            1,
            CommentRequest {
                id: 0,
                body: Some("B1, clarified".to_owned()),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(comment.body, "B1, clarified");
    let edited = comment.edited.expect("body edit must stamp audit metadata");
    assert_eq!(edited.by.login, "admin");

    // The author is unchanged; only the edit stamp names the editor.
    let comments = h
        .service
        .list_comments(&h.repo, 1, ListOptions::default())
        .await?;
    assert_eq!(comments[0].user.login, "alice");
    assert_eq!(comments[0].edited.as_ref().unwrap().by.login, "admin");

    Ok(())
}

#[tokio::test]
async fn comment_listing_paginates_over_ids() -> anyhow::Result<()> {
    let h = harness();
    h.directory.sign_in(Some(user(1, "alice", false)));
    h.service.create(&h.repo, new_issue("T1", "B1")).await?;
    for n in 1..=3 {
        h.service
            .create_comment(
                &h.repo,
                1,
                NewComment {
                    body: format!("C{n}"),
                },
            )
            .await?;
    }

    let page = h
        .service
        .list_comments(
            &h.repo,
            1,
            ListOptions {
                start: Some(1),
                length: Some(2),
            },
        )
        .await?;
    let ids: Vec<u64> = page.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![1, 2]);

    Ok(())
}

#[tokio::test]
async fn missing_entities_surface_not_found() -> anyhow::Result<()> {
    let h = harness();
    h.directory.sign_in(Some(user(1, "alice", false)));

    assert!(matches!(
        h.service.get(&h.repo, 42).await,
        Err(Error::NotFound)
    ));

    h.service.create(&h.repo, new_issue("T1", "B1")).await?;
    assert!(matches!(
        h.service
            .edit_comment(&h.repo, 1, reaction_request(7, "heart"))
            .await,
        Err(Error::NotFound)
    ));
    assert!(matches!(
        h.service
            .create_comment(
                &h.repo,
                42,
                NewComment {
                    body: "C1".to_owned()
                }
            )
            .await,
        Err(Error::NotFound)
    ));

    // Listing in an untouched namespace is empty, not an error.
    let empty = RepoSpec::from("example.org/empty");
    assert!(
        h.service
            .list(&empty, IssueListOptions::default())
            .await?
            .is_empty()
    );

    Ok(())
}

#[tokio::test]
async fn invalid_payloads_fail_validation_before_any_write() -> anyhow::Result<()> {
    let h = harness();
    h.directory.sign_in(Some(user(1, "alice", false)));

    assert!(matches!(
        h.service.create(&h.repo, new_issue("   ", "B1")).await,
        Err(Error::Validation(_))
    ));
    assert!(matches!(
        h.service
            .create(
                &h.repo,
                NewIssue {
                    title: "T1".to_owned(),
                    reference: Some(Reference {
                        repo: RepoSpec::from("example.org/other"),
                        path: "src/lib.rs".to_owned(),
                        commit_id: "abc123".to_owned(),
                        start_line: 1,
                        end_line: 2,
                    }),
                    ..Default::default()
                }
            )
            .await,
        Err(Error::Unsupported(_))
    ));
    assert!(matches!(
        h.service
            .create(&RepoSpec::from("../escape"), new_issue("T1", "B1"))
            .await,
        Err(Error::Validation(_))
    ));

    // Nothing was written.
    assert_eq!(
        h.service
            .count(&h.repo, IssueListOptions { state: StateFilter::All })
            .await?,
        0
    );

    h.service.create(&h.repo, new_issue("T1", "B1")).await?;
    assert!(matches!(
        h.service
            .create_comment(&h.repo, 1, NewComment { body: " ".to_owned() })
            .await,
        Err(Error::Validation(_))
    ));
    assert!(matches!(
        h.service
            .edit_comment(&h.repo, 1, CommentRequest::default())
            .await,
        Err(Error::Validation(_))
    ));

    Ok(())
}

#[tokio::test]
async fn notification_side_effects_fire_best_effort() -> anyhow::Result<()> {
    let h = harness();
    h.directory.sign_in(Some(user(1, "alice", false)));

    h.service.create(&h.repo, new_issue("T1", "B1")).await?;
    h.service
        .create_comment(
            &h.repo,
            1,
            NewComment {
                body: "C1".to_owned(),
            },
        )
        .await?;
    h.service.get(&h.repo, 1).await?;
    h.service
        .edit(
            &h.repo,
            1,
            IssueRequest {
                state: Some(State::Closed),
                ..Default::default()
            },
        )
        .await?;
    // A title-only edit changes no state and notifies no one.
    h.service
        .edit(
            &h.repo,
            1,
            IssueRequest {
                title: Some("T1 renamed".to_owned()),
                ..Default::default()
            },
        )
        .await?;

    let calls = h.notifications.calls();
    assert_eq!(
        calls,
        vec![
            "subscribe example.org/project 1 [1]".to_owned(),
            "notify example.org/project 1 \"T1\" fragment=\"\"".to_owned(),
            "subscribe example.org/project 1 [1]".to_owned(),
            "notify example.org/project 1 \"T1\" fragment=\"comment-1\"".to_owned(),
            "mark_read example.org/project 1 1".to_owned(),
            "subscribe example.org/project 1 [1]".to_owned(),
            "notify example.org/project 1 \"T1\" fragment=\"\"".to_owned(),
        ]
    );

    Ok(())
}

#[tokio::test]
async fn a_store_without_notifications_still_works() -> anyhow::Result<()> {
    let root = tempfile::tempdir()?;
    let directory = TestDirectory::new(vec![user(1, "alice", false)]);
    directory.sign_in(Some(user(1, "alice", false)));
    let service = FsService::new(root.path(), directory.clone(), None);
    let repo = RepoSpec::from("example.org/project");

    let issue = service.create(&repo, new_issue("T1", "B1")).await?;
    assert_eq!(issue.id, 1);
    service.get(&repo, 1).await?;

    Ok(())
}

#[tokio::test]
async fn copy_from_preserves_the_whole_namespace() -> anyhow::Result<()> {
    let src = harness();
    src.directory.sign_in(Some(user(1, "alice", false)));

    src.service.create(&src.repo, new_issue("T1", "B1")).await?;
    src.service
        .create_comment(
            &src.repo,
            1,
            NewComment {
                body: "C1".to_owned(),
            },
        )
        .await?;
    src.service
        .edit_comment(&src.repo, 1, reaction_request(1, "heart"))
        .await?;
    src.service
        .edit(
            &src.repo,
            1,
            IssueRequest {
                state: Some(State::Closed),
                ..Default::default()
            },
        )
        .await?;
    src.service.create(&src.repo, new_issue("T2", "B2")).await?;

    let dst = harness();
    dst.directory.sign_in(Some(user(1, "alice", false)));
    dst.service.copy_from(&src.service, &src.repo).await?;

    let all = IssueListOptions { state: StateFilter::All };
    let src_issues = src.service.list(&src.repo, all).await?;
    let dst_issues = dst.service.list(&src.repo, all).await?;
    assert_eq!(dst_issues, src_issues);

    let src_comments = src
        .service
        .list_comments(&src.repo, 1, ListOptions::default())
        .await?;
    let dst_comments = dst
        .service
        .list_comments(&src.repo, 1, ListOptions::default())
        .await?;
    assert_eq!(dst_comments, src_comments);

    let src_events = src
        .service
        .list_events(&src.repo, 1, ListOptions::default())
        .await?;
    let dst_events = dst
        .service
        .list_events(&src.repo, 1, ListOptions::default())
        .await?;
    assert_eq!(dst_events, src_events);

    Ok(())
}
