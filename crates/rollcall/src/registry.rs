//! Participant and attendance operations on a [`WorkshopState`].
//!
//! These functions only touch the in-memory state. Persisting the result is
//! the caller's job; [`crate::Workshop`] does it after every mutation.

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::ids::IdAllocator;
use crate::model::{AttendanceResult, Participant, SessionSet, WorkshopState};

/// Register a new participant and give them an empty attendance set.
///
/// All three fields are trimmed before storage.
///
/// # Errors
///
/// Returns [`Error::Validation`] naming the first field that is empty after
/// trimming.
pub fn register_participant(
    state: &mut WorkshopState,
    allocator: &IdAllocator,
    name: &str,
    email: &str,
    institute: &str,
    registration_date: impl Into<String>,
) -> Result<Participant> {
    let name = required("name", name)?;
    let email = required("email", email)?;
    let institute = required("institute", institute)?;

    let sequence = allocator.next_sequence(state);
    let participant = Participant {
        id: allocator.format_id(sequence),
        name,
        email,
        institute,
        registration_date: registration_date.into(),
    };

    state.participants.push(participant.clone());
    state
        .attendance
        .insert(participant.id.clone(), SessionSet::new());
    state.last_sequence = Some(sequence);

    info!(id = %participant.id, "Registered participant");
    Ok(participant)
}

fn required(field: &'static str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(field, "must not be empty"));
    }
    Ok(trimmed.to_string())
}

/// Remove a participant together with their attendance entry.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if no participant has this id.
pub fn delete_participant(state: &mut WorkshopState, id: &str) -> Result<Participant> {
    let index = state.position(id).ok_or_else(|| Error::not_found(id))?;
    let removed = state.participants.remove(index);
    state.attendance.remove(id);

    info!(id = %removed.id, "Deleted participant");
    Ok(removed)
}

/// Look up a participant by exact id.
#[must_use]
pub fn find_participant<'a>(state: &'a WorkshopState, id: &str) -> Option<&'a Participant> {
    state.participant(id)
}

/// Participants whose name or id contains `query`, ignoring case.
///
/// A blank query returns every participant in registration order.
#[must_use]
pub fn search_participants<'a>(state: &'a WorkshopState, query: &str) -> Vec<&'a Participant> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return state.participants.iter().collect();
    }

    let hits: Vec<&Participant> = state
        .participants
        .iter()
        .filter(|p| p.matches(&needle))
        .collect();
    debug!(query = %needle, hits = hits.len(), "Searched participants");
    hits
}

/// Record a participant as present for a session.
///
/// Marking an already recorded session is a no-op reported as
/// [`AttendanceResult::AlreadyMarked`].
///
/// # Errors
///
/// Returns [`Error::Validation`] if `session` is blank and
/// [`Error::NotFound`] if the participant does not exist.
pub fn mark_attendance(
    state: &mut WorkshopState,
    participant_id: &str,
    session: &str,
) -> Result<AttendanceResult> {
    let session = session.trim();
    if session.is_empty() {
        return Err(Error::validation("session", "must not be empty"));
    }
    if !state.contains(participant_id) {
        return Err(Error::not_found(participant_id));
    }

    let sessions = state
        .attendance
        .entry(participant_id.to_string())
        .or_default();
    if sessions.insert(session.to_string()) {
        info!(id = %participant_id, session, "Marked attendance");
        Ok(AttendanceResult::Marked)
    } else {
        debug!(id = %participant_id, session, "Attendance already marked");
        Ok(AttendanceResult::AlreadyMarked)
    }
}

/// Remove a session from a participant's attendance.
///
/// Returns whether the session had been recorded.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the participant does not exist.
pub fn unmark_attendance(
    state: &mut WorkshopState,
    participant_id: &str,
    session: &str,
) -> Result<bool> {
    if !state.contains(participant_id) {
        return Err(Error::not_found(participant_id));
    }

    let removed = state
        .attendance
        .get_mut(participant_id)
        .is_some_and(|sessions| sessions.remove(session.trim()));
    if removed {
        info!(id = %participant_id, session, "Unmarked attendance");
    }
    Ok(removed)
}

/// Sessions recorded for a participant.
#[must_use]
pub fn attendance_for<'a>(state: &'a WorkshopState, id: &str) -> Option<&'a SessionSet> {
    state.sessions_of(id)
}
