//! The workshop root state and attendance log.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::Participant;

/// Sessions a single participant attended.
pub type SessionSet = BTreeSet<String>;

/// Participant id to attended sessions.
///
/// Serializes as a JSON object of arrays, the shape stored blobs and backups
/// have always used.
pub type AttendanceLog = BTreeMap<String, SessionSet>;

/// Outcome of marking a participant present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttendanceResult {
    /// The session was newly recorded.
    Marked,
    /// The participant was already recorded for this session; nothing changed.
    AlreadyMarked,
}

impl AttendanceResult {
    /// Whether this result changed the state.
    #[must_use]
    pub fn is_marked(self) -> bool {
        matches!(self, Self::Marked)
    }
}

/// All participants and attendance for one workshop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkshopState {
    /// Participants in registration order.
    #[serde(default)]
    pub participants: Vec<Participant>,

    /// Attendance keyed by participant id.
    #[serde(default)]
    pub attendance: AttendanceLog,

    /// Highest identifier sequence number ever issued.
    ///
    /// Absent in data written before the counter existed; the allocator then
    /// falls back to the ids already present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sequence: Option<u32>,
}

impl WorkshopState {
    /// Create an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered participants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// Whether no participants are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Look up a participant by exact id.
    #[must_use]
    pub fn participant(&self, id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    /// Position of a participant in registration order.
    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.participants.iter().position(|p| p.id == id)
    }

    /// Whether a participant with this id exists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    /// Sessions recorded for a participant, if any entry exists.
    #[must_use]
    pub fn sessions_of(&self, id: &str) -> Option<&SessionSet> {
        self.attendance.get(id)
    }

    /// Whether the participant attended at least one session.
    #[must_use]
    pub fn has_attended(&self, id: &str) -> bool {
        self.sessions_of(id).is_some_and(|s| !s.is_empty())
    }

    /// Drop attendance entries whose participant no longer exists.
    ///
    /// Returns the ids that were removed.
    pub fn prune_dangling_attendance(&mut self) -> Vec<String> {
        let dangling: Vec<String> = self
            .attendance
            .keys()
            .filter(|id| !self.contains(id))
            .cloned()
            .collect();
        for id in &dangling {
            self.attendance.remove(id);
        }
        dangling
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(id: &str, name: &str) -> Participant {
        Participant {
            id: id.to_string(),
            name: name.to_string(),
            email: format!("{}@example.org", name.to_lowercase()),
            institute: "APU".to_string(),
            registration_date: "29/1/2026".to_string(),
        }
    }

    fn sample_state() -> WorkshopState {
        let mut state = WorkshopState::new();
        state.participants.push(participant("BINDS-01", "Asha"));
        state.participants.push(participant("BINDS-02", "Ravi"));
        state
            .attendance
            .insert("BINDS-01".to_string(), SessionSet::from(["Day1-Morning".to_string()]));
        state.attendance.insert("BINDS-02".to_string(), SessionSet::new());
        state
    }

    #[test]
    fn test_lookup_helpers() {
        let state = sample_state();
        assert_eq!(state.len(), 2);
        assert!(!state.is_empty());
        assert_eq!(state.participant("BINDS-02").unwrap().name, "Ravi");
        assert_eq!(state.position("BINDS-02"), Some(1));
        assert!(state.participant("BINDS-03").is_none());
        assert!(state.has_attended("BINDS-01"));
        assert!(!state.has_attended("BINDS-02"));
        assert!(!state.has_attended("BINDS-99"));
    }

    #[test]
    fn test_prune_dangling_attendance() {
        let mut state = sample_state();
        state
            .attendance
            .insert("BINDS-07".to_string(), SessionSet::from(["Day2-Morning".to_string()]));

        let pruned = state.prune_dangling_attendance();
        assert_eq!(pruned, vec!["BINDS-07".to_string()]);
        assert_eq!(state.attendance.len(), 2);
        assert!(state.prune_dangling_attendance().is_empty());
    }

    #[test]
    fn test_serialized_shape() {
        let state = sample_state();
        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["attendance"]["BINDS-01"][0], "Day1-Morning");
        assert!(value["attendance"]["BINDS-02"].as_array().unwrap().is_empty());
        // Counter is only written once it has been set.
        assert!(value.get("lastSequence").is_none());
    }

    #[test]
    fn test_duplicate_sessions_collapse_on_deserialize() {
        let json = r#"{
            "participants": [{"id":"BINDS-01","name":"Asha"}],
            "attendance": {"BINDS-01": ["Day1-Morning", "Day1-Morning"]}
        }"#;
        let state: WorkshopState = serde_json::from_str(json).unwrap();
        assert_eq!(state.sessions_of("BINDS-01").unwrap().len(), 1);
    }

    #[test]
    fn test_attendance_result_is_marked() {
        assert!(AttendanceResult::Marked.is_marked());
        assert!(!AttendanceResult::AlreadyMarked.is_marked());
    }
}
