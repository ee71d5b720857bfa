//! Domain types for the issue tracker.
//!
//! These are the API-facing types exchanged with an [`IssueService`]
//! backend. Storage backends keep their own on-disk representations and
//! convert at the boundary.
//!
//! [`IssueService`]: crate::service::IssueService

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a repository whose issues are tracked.
///
/// The URI is an opaque, `/`-separated identifier (e.g.
/// `example.org/project`) that roots an isolated storage namespace. All
/// entity IDs are scoped within it; no cross-namespace references exist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoSpec {
    /// The repository URI.
    pub uri: String,
}

impl RepoSpec {
    /// Create a new repository spec.
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }
}

impl fmt::Display for RepoSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uri)
    }
}

impl From<&str> for RepoSpec {
    fn from(uri: &str) -> Self {
        Self::new(uri)
    }
}

/// A reference to a user account.
///
/// This is an opaque foreign key: the pair (`id`, `domain`) identifies a
/// user to the external user directory, and the core never resolves it to
/// display data itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserSpec {
    /// User ID, unique within the domain.
    pub id: u64,

    /// The domain the user belongs to (empty for the local site).
    pub domain: String,
}

impl UserSpec {
    /// Create a user spec for a local-site user.
    pub fn local(id: u64) -> Self {
        Self {
            id,
            domain: String::new(),
        }
    }
}

/// A resolved display user, as reported by the user directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Reference this user resolved from.
    pub spec: UserSpec,

    /// Login name.
    pub login: String,

    /// Avatar image URL.
    pub avatar_url: String,

    /// Profile page URL (may be empty).
    pub html_url: String,

    /// Whether the user is a site administrator.
    pub site_admin: bool,
}

/// State of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    /// Issue is open.
    Open,

    /// Issue has been closed.
    Closed,
}

/// Filter for issue list and count operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateFilter {
    /// Only open issues.
    #[default]
    Open,

    /// Only closed issues.
    Closed,

    /// Issues in any state.
    All,
}

impl StateFilter {
    /// Reports whether an issue in `state` passes this filter.
    #[must_use]
    pub fn matches(self, state: State) -> bool {
        match self {
            StateFilter::Open => state == State::Open,
            StateFilter::Closed => state == State::Closed,
            StateFilter::All => true,
        }
    }
}

/// Options for issue list and count operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct IssueListOptions {
    /// Filter by issue state.
    pub state: StateFilter,
}

/// Pagination window for comment and event listing.
///
/// Applies to the ascending ID sequence: `start` entries are skipped, then
/// at most `length` entries are returned. Both default to the full list.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListOptions {
    /// Index of the first entry to return.
    pub start: Option<usize>,

    /// Maximum number of entries to return.
    pub length: Option<usize>,
}

/// An RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    /// Red component.
    pub r: u8,
    /// Green component.
    pub g: u8,
    /// Blue component.
    pub b: u8,
}

/// A label that can be applied to an issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Label name.
    pub name: String,

    /// Label color.
    pub color: Rgb,
}

/// Identifier of a reaction emoji, e.g. `heart` or `+1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmojiId(pub String);

impl EmojiId {
    /// Create a new emoji ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The emoji ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmojiId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EmojiId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A reaction left on a comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    /// The reaction emoji.
    pub emoji: EmojiId,

    /// Users who reacted with this emoji, in first-reaction order.
    ///
    /// Semantically a set: no user appears twice. A reaction with no
    /// remaining users does not exist.
    pub users: Vec<User>,
}

/// Edit-audit metadata for a comment body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edited {
    /// Who edited the body last.
    pub by: User,

    /// When the body was last edited.
    pub at: DateTime<Utc>,
}

/// A comment on an issue.
///
/// Comment 0 is the issue's own description and is special-cased
/// throughout: it is edited through the issue record and is never deleted.
/// Replies have IDs starting at 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Comment ID within the issue (0 = issue description).
    pub id: u64,

    /// Comment author.
    pub user: User,

    /// Creation time.
    pub created_at: DateTime<Utc>,

    /// Present if the body has been edited.
    pub edited: Option<Edited>,

    /// Comment body.
    pub body: String,

    /// Reactions on this comment.
    pub reactions: Vec<Reaction>,

    /// Whether the acting identity may edit this comment.
    pub editable: bool,
}

/// An issue in the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Issue ID, unique within its repository, starting at 1.
    pub id: u64,

    /// Current state.
    pub state: State,

    /// Issue title.
    pub title: String,

    /// Labels applied to the issue.
    pub labels: Vec<Label>,

    /// The issue description (comment 0).
    ///
    /// List and get operations return summary metadata here (author,
    /// creation time, editability); bodies and reactions are served by
    /// comment listing.
    pub comment: Comment,

    /// Number of reply comments (excludes the description).
    pub replies: usize,
}

/// A reference to code, attached to an issue at creation on backends that
/// support it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// Repository the referenced code lives in.
    pub repo: RepoSpec,

    /// Relative, `/`-separated path to a file within the repo.
    pub path: String,

    /// Commit the reference is pinned to.
    pub commit_id: String,

    /// First referenced line.
    pub start_line: u32,

    /// Last referenced line.
    pub end_line: u32,
}

/// Data for creating a new issue.
#[derive(Debug, Clone, Default)]
pub struct NewIssue {
    /// Issue title.
    pub title: String,

    /// Issue description body.
    pub body: String,

    /// Labels to apply.
    pub labels: Vec<Label>,

    /// Cross-reference to code (not supported by every backend).
    pub reference: Option<Reference>,
}

impl NewIssue {
    /// Validates the creation payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the title is blank or all
    /// whitespace. Blank bodies are legal issue descriptions.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::Validation(
                "title can't be blank or all whitespace".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Data for creating a new reply comment.
#[derive(Debug, Clone, Default)]
pub struct NewComment {
    /// Comment body.
    pub body: String,
}

impl NewComment {
    /// Validates the creation payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the body is blank or all
    /// whitespace.
    pub fn validate(&self) -> Result<()> {
        if self.body.trim().is_empty() {
            return Err(Error::Validation(
                "comment body can't be blank or all whitespace".to_owned(),
            ));
        }
        Ok(())
    }
}

/// A request to edit an issue.
///
/// Only fields that are present are applied; the record is otherwise left
/// as is.
#[derive(Debug, Clone, Default)]
pub struct IssueRequest {
    /// New state (if updating).
    pub state: Option<State>,

    /// New title (if updating).
    pub title: Option<String>,
}

impl IssueRequest {
    /// Validates the edit request.
    ///
    /// Invalid states are unrepresentable in [`State`], so only the title
    /// needs checking.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if a present title is blank or all
    /// whitespace.
    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(Error::Validation(
                    "title can't be blank or all whitespace".to_owned(),
                ));
            }
        }
        Ok(())
    }
}

/// A request to edit a comment: replace the body, toggle a single
/// reaction, or both.
#[derive(Debug, Clone, Default)]
pub struct CommentRequest {
    /// ID of the comment to edit (0 = issue description).
    pub id: u64,

    /// New body (if updating).
    pub body: Option<String>,

    /// Reaction emoji to toggle for the acting user (if toggling).
    pub reaction: Option<EmojiId>,
}

impl CommentRequest {
    /// Validates the edit request and reports whether it requires full
    /// edit authorization.
    ///
    /// A body edit requires edit authorization; a reaction-only request
    /// needs only react authorization.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if neither field is set, or if a
    /// present body is blank or all whitespace.
    pub fn validate(&self) -> Result<bool> {
        if let Some(body) = &self.body {
            if body.trim().is_empty() {
                return Err(Error::Validation(
                    "comment body can't be blank or all whitespace".to_owned(),
                ));
            }
        }
        if self.body.is_none() && self.reaction.is_none() {
            return Err(Error::Validation(
                "comment edit request needs at least one field set".to_owned(),
            ));
        }
        Ok(self.body.is_some())
    }
}

/// Details for a [`EventKind::Renamed`] event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rename {
    /// Title before the rename.
    pub from: String,

    /// Title after the rename.
    pub to: String,
}

/// The kind of an issue event.
///
/// Events are derived from edits, never authored directly. Only
/// `Reopened`, `Closed`, and `Renamed` are produced by this crate's
/// backend; the remaining kinds are recognized when reading records
/// written by other implementations. Unrecognized on-disk kinds map to
/// `Unknown` instead of passing raw strings through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// The issue was reopened.
    Reopened,

    /// The issue was closed.
    Closed,

    /// The issue was renamed.
    Renamed(Rename),

    /// A label was added to the issue.
    Labeled(Label),

    /// A label was removed from the issue.
    Unlabeled(Label),

    /// A comment on the issue was deleted.
    CommentDeleted,

    /// An event kind this implementation does not recognize.
    Unknown,
}

/// An event that occurred around an issue.
///
/// Events are append-only per issue, with IDs starting at 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event ID within the issue.
    pub id: u64,

    /// Who caused the event.
    pub actor: User,

    /// When the event occurred.
    pub created_at: DateTime<Utc>,

    /// What happened.
    #[serde(flatten)]
    pub kind: EventKind,
}
