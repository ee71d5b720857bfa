//! Reaction toggling on comment records.

use super::records::{CommentRecord, ReactionRecord, UserSpecRecord};
use crate::domain::{EmojiId, UserSpec};
use crate::error::{Error, Result};

/// Most distinct emoji one user may have active reactions on per comment.
pub(super) const REACTION_LIMIT: usize = 20;

/// Toggles `actor`'s reaction `emoji` on `comment`.
///
/// Adds the reaction if the actor doesn't have it, removes it if they do.
/// A user creating a new reaction is appended to the end of the reaction's
/// author list; a reaction whose author list empties is removed entirely,
/// preserving the relative order of the remaining reactions. Author
/// removal swaps with the last entry - author order within one reaction
/// carries no meaning beyond who reacted first.
///
/// # Errors
///
/// Returns [`Error::TooManyReactions`] if adding would put the actor over
/// [`REACTION_LIMIT`] distinct emoji on this comment. The comment is left
/// unchanged.
pub(super) fn toggle_reaction(
    comment: &mut CommentRecord,
    actor: &UserSpec,
    emoji: &EmojiId,
) -> Result<()> {
    let from_actor = comment
        .reactions
        .iter()
        .filter(|r| r.authors.iter().any(|a| a.matches(actor)))
        .count();

    for i in 0..comment.reactions.len() {
        if comment.reactions[i].emoji != *emoji {
            continue;
        }
        match comment.reactions[i]
            .authors
            .iter()
            .position(|a| a.matches(actor))
        {
            None => {
                // Add this reaction.
                if from_actor >= REACTION_LIMIT {
                    return Err(Error::TooManyReactions {
                        limit: REACTION_LIMIT,
                    });
                }
                comment.reactions[i].authors.push(UserSpecRecord::from(actor));
            }
            Some(pos) => {
                // Remove this reaction. Delete without preserving order.
                comment.reactions[i].authors.swap_remove(pos);

                // With no more authors backing it, the reaction goes away.
                if comment.reactions[i].authors.is_empty() {
                    comment.reactions.remove(i);
                }
            }
        }
        return Ok(());
    }

    // First reaction of its kind; add it to the end of the list.
    if from_actor >= REACTION_LIMIT {
        return Err(Error::TooManyReactions {
            limit: REACTION_LIMIT,
        });
    }
    comment.reactions.push(ReactionRecord {
        emoji: emoji.clone(),
        authors: vec![UserSpecRecord::from(actor)],
    });
    Ok(())
}
