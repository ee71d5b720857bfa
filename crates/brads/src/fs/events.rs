//! Derivation of audit events from issue edits.

use crate::domain::{EventKind, IssueRequest, Rename, State};

/// Maps an edit request's delta onto at most one audit event.
///
/// A state transition wins over a rename: when one request changes both
/// state and title, only the state event is emitted. (Known limitation
/// carried over from the original behavior; widening an edit to multiple
/// events is a deliberate semantic change, not a bug fix.)
pub(super) fn derive_event(
    request: &IssueRequest,
    prev_state: State,
    prev_title: &str,
) -> Option<EventKind> {
    if let Some(state) = request.state {
        if state != prev_state {
            return Some(match state {
                State::Open => EventKind::Reopened,
                State::Closed => EventKind::Closed,
            });
        }
    }
    match &request.title {
        Some(title) if title != prev_title => Some(EventKind::Renamed(Rename {
            from: prev_title.to_owned(),
            to: title.clone(),
        })),
        _ => None,
    }
}
