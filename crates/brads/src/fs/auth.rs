//! Authorization policy for edits and reactions.

use super::records::UserSpecRecord;
use crate::domain::{RepoSpec, User};
use crate::error::{Error, Result};
use crate::users::UserDirectory;

/// Checks that `acting` is authorized to edit an entry created by
/// `author`.
///
/// The author may always edit their own entries. Anyone else needs
/// elevated status: site admin, or repository collaborator as reported by
/// the external authority.
///
/// # Errors
///
/// Returns [`Error::PermissionDenied`] if there is no acting identity or
/// it holds no elevated status; authority lookup failures propagate.
pub(super) async fn can_edit(
    users: &dyn UserDirectory,
    repo: &RepoSpec,
    acting: Option<&User>,
    author: &UserSpecRecord,
) -> Result<()> {
    let Some(acting) = acting else {
        // Not logged in, cannot edit anything.
        return Err(Error::PermissionDenied);
    };
    if author.matches(&acting.spec) {
        // The author can always edit their own entry.
        return Ok(());
    }
    if acting.site_admin {
        return Ok(());
    }
    if users.is_collaborator(repo, &acting.spec).await? {
        return Ok(());
    }
    Err(Error::PermissionDenied)
}

/// Like [`can_edit`], collapsed to the boolean the read paths report.
///
/// Authority failures render as not-editable rather than failing the
/// read.
pub(super) async fn editable(
    users: &dyn UserDirectory,
    repo: &RepoSpec,
    acting: Option<&User>,
    author: &UserSpecRecord,
) -> bool {
    can_edit(users, repo, acting, author).await.is_ok()
}

/// Checks that `acting` is authorized to react to an entry.
///
/// Any authenticated identity may react.
///
/// # Errors
///
/// Returns [`Error::PermissionDenied`] if there is no acting identity.
pub(super) fn can_react(acting: Option<&User>) -> Result<()> {
    if acting.is_none() {
        // Not logged in, cannot react to anything.
        return Err(Error::PermissionDenied);
    }
    Ok(())
}
