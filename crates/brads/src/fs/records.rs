//! On-disk record representations.
//!
//! Records keep a stable wire format independent of the API types:
//! PascalCase keys, optional fields omitted when empty, and the issue
//! record flattening its description comment. Reading a comment record
//! from an issue file (comment 0) works because unknown keys (`State`,
//! `Title`, `Labels`) are ignored on decode.

use crate::domain::{
    EmojiId, EventKind, Label, Rename, Rgb, State, UserSpec,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// On-disk representation of a user reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(super) struct UserSpecRecord {
    #[serde(rename = "ID")]
    pub id: u64,
    #[serde(rename = "Domain", default, skip_serializing_if = "String::is_empty")]
    pub domain: String,
}

impl UserSpecRecord {
    pub(super) fn user_spec(&self) -> UserSpec {
        UserSpec {
            id: self.id,
            domain: self.domain.clone(),
        }
    }

    /// Reports whether this record references the same user as `spec`.
    pub(super) fn matches(&self, spec: &UserSpec) -> bool {
        self.id == spec.id && self.domain == spec.domain
    }
}

impl From<&UserSpec> for UserSpecRecord {
    fn from(spec: &UserSpec) -> Self {
        Self {
            id: spec.id,
            domain: spec.domain.clone(),
        }
    }
}

/// On-disk representation of an RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(super) struct RgbRecord {
    #[serde(rename = "R")]
    pub r: u8,
    #[serde(rename = "G")]
    pub g: u8,
    #[serde(rename = "B")]
    pub b: u8,
}

/// On-disk representation of a label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(super) struct LabelRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Color")]
    pub color: RgbRecord,
}

impl LabelRecord {
    pub(super) fn label(&self) -> Label {
        Label {
            name: self.name.clone(),
            color: Rgb {
                r: self.color.r,
                g: self.color.g,
                b: self.color.b,
            },
        }
    }
}

impl From<&Label> for LabelRecord {
    fn from(label: &Label) -> Self {
        Self {
            name: label.name.clone(),
            color: RgbRecord {
                r: label.color.r,
                g: label.color.g,
                b: label.color.b,
            },
        }
    }
}

/// On-disk edit-audit metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(super) struct EditedRecord {
    #[serde(rename = "By")]
    pub by: UserSpecRecord,
    #[serde(rename = "At")]
    pub at: DateTime<Utc>,
}

/// On-disk representation of a reaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(super) struct ReactionRecord {
    #[serde(rename = "EmojiID")]
    pub emoji: EmojiId,
    /// First entry is the first person who reacted.
    #[serde(rename = "Authors")]
    pub authors: Vec<UserSpecRecord>,
}

/// On-disk representation of a comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(super) struct CommentRecord {
    #[serde(rename = "Author")]
    pub author: UserSpecRecord,
    #[serde(rename = "CreatedAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "Edited", default, skip_serializing_if = "Option::is_none")]
    pub edited: Option<EditedRecord>,
    #[serde(rename = "Body")]
    pub body: String,
    #[serde(rename = "Reactions", default, skip_serializing_if = "Vec::is_empty")]
    pub reactions: Vec<ReactionRecord>,
}

/// On-disk representation of an issue: its own fields plus the flattened
/// description comment (comment 0 shares the file).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(super) struct IssueRecord {
    #[serde(rename = "State")]
    pub state: State,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Labels", default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<LabelRecord>,
    #[serde(flatten)]
    pub comment: CommentRecord,
}

/// On-disk representation of an issue rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(super) struct RenameRecord {
    #[serde(rename = "From")]
    pub from: String,
    #[serde(rename = "To")]
    pub to: String,
}

/// On-disk representation of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(super) struct EventRecord {
    #[serde(rename = "Actor")]
    pub actor: UserSpecRecord,
    #[serde(rename = "CreatedAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(rename = "Rename", default, skip_serializing_if = "Option::is_none")]
    pub rename: Option<RenameRecord>,
    #[serde(rename = "Label", default, skip_serializing_if = "Option::is_none")]
    pub label: Option<LabelRecord>,
}

impl EventRecord {
    /// Builds the record for a derived event.
    pub(super) fn new(actor: UserSpecRecord, created_at: DateTime<Utc>, kind: &EventKind) -> Self {
        let (tag, rename, label) = match kind {
            EventKind::Reopened => ("reopened", None, None),
            EventKind::Closed => ("closed", None, None),
            EventKind::Renamed(rename) => (
                "renamed",
                Some(RenameRecord {
                    from: rename.from.clone(),
                    to: rename.to.clone(),
                }),
                None,
            ),
            EventKind::Labeled(l) => ("labeled", None, Some(LabelRecord::from(l))),
            EventKind::Unlabeled(l) => ("unlabeled", None, Some(LabelRecord::from(l))),
            EventKind::CommentDeleted => ("comment_deleted", None, None),
            EventKind::Unknown => ("unknown", None, None),
        };
        Self {
            actor,
            created_at,
            kind: tag.to_owned(),
            rename,
            label,
        }
    }

    /// Maps the stored type tag back to the closed event kind.
    ///
    /// Tags this implementation does not recognize, and recognized tags
    /// missing their required detail fields, map to
    /// [`EventKind::Unknown`].
    pub(super) fn event_kind(&self) -> EventKind {
        match self.kind.as_str() {
            "reopened" => EventKind::Reopened,
            "closed" => EventKind::Closed,
            "renamed" => match &self.rename {
                Some(rename) => EventKind::Renamed(Rename {
                    from: rename.from.clone(),
                    to: rename.to.clone(),
                }),
                None => EventKind::Unknown,
            },
            "labeled" => match &self.label {
                Some(label) => EventKind::Labeled(label.label()),
                None => EventKind::Unknown,
            },
            "unlabeled" => match &self.label {
                Some(label) => EventKind::Unlabeled(label.label()),
                None => EventKind::Unknown,
            },
            "comment_deleted" => EventKind::CommentDeleted,
            _ => EventKind::Unknown,
        }
    }
}
