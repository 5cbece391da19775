//! Full-state backup documents and validated restore.
//!
//! A backup is an indented JSON document:
//!
//! ```json
//! {
//!   "exportDate": "29/1/2026, 9:41:07 am",
//!   "workshopName": "BINDS – Chapter 2",
//!   "participants": [ ... ],
//!   "attendance": { "BINDS-01": ["Day1-Morning"] }
//! }
//! ```
//!
//! Import is a pure transform from text to a [`WorkshopState`]; confirming
//! the replacement with the user is left to the caller.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ImportError, Result};
use crate::model::{AttendanceLog, Participant, WorkshopState};

/// A complete exported snapshot of a workshop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    /// When the backup was taken, in the configured locale format.
    pub export_date: String,
    /// Display name of the workshop.
    pub workshop_name: String,
    /// Participants in registration order.
    pub participants: Vec<Participant>,
    /// Attendance keyed by participant id.
    pub attendance: AttendanceLog,
    /// Identifier counter, so a restore keeps deleted ids retired.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sequence: Option<u32>,
}

impl BackupDocument {
    /// Render the document as two-space indented JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Snapshot `state` into a backup document.
#[must_use]
pub fn export_backup(
    state: &WorkshopState,
    workshop_name: impl Into<String>,
    export_date: impl Into<String>,
) -> BackupDocument {
    BackupDocument {
        export_date: export_date.into(),
        workshop_name: workshop_name.into(),
        participants: state.participants.clone(),
        attendance: state.attendance.clone(),
        last_sequence: state.last_sequence,
    }
}

/// Parse and validate a backup document.
///
/// Unknown top-level fields are ignored and a missing `attendance` field is
/// treated as empty. Attendance entries for ids that are not in
/// `participants` are dropped. Repeated participant ids, which older
/// exports can contain, are kept as they are and logged.
///
/// # Errors
///
/// Returns an [`ImportError`] of kind `MalformedJson` if the text is not a
/// JSON object or a field has the wrong shape, and of kind
/// `MissingParticipants` if `participants` is absent or null.
pub fn import_backup(raw: &str) -> std::result::Result<WorkshopState, ImportError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| ImportError::malformed(e.to_string()))?;
    let Value::Object(mut fields) = value else {
        return Err(ImportError::malformed("expected a JSON object at the top level"));
    };

    let participants = match fields.remove("participants") {
        None | Some(Value::Null) => return Err(ImportError::missing_participants()),
        Some(raw) => serde_json::from_value::<Vec<Participant>>(raw)
            .map_err(|e| ImportError::malformed(format!("participants: {e}")))?,
    };

    let mut seen = HashSet::new();
    let repeated: Vec<&str> = participants
        .iter()
        .filter(|p| !seen.insert(p.id.as_str()))
        .map(|p| p.id.as_str())
        .collect();
    if !repeated.is_empty() {
        warn!(ids = ?repeated, "Backup repeats participant ids, keeping every entry");
    }

    let attendance = match fields.remove("attendance") {
        None | Some(Value::Null) => AttendanceLog::new(),
        Some(raw) => serde_json::from_value::<AttendanceLog>(raw)
            .map_err(|e| ImportError::malformed(format!("attendance: {e}")))?,
    };

    let last_sequence = fields
        .get("lastSequence")
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok());

    let mut state = WorkshopState {
        participants,
        attendance,
        last_sequence,
    };

    let dangling = state.prune_dangling_attendance();
    if !dangling.is_empty() {
        warn!(ids = ?dangling, "Dropped attendance for unknown participants");
    }

    debug!(
        participants = state.len(),
        attendance = state.attendance.len(),
        "Parsed backup"
    );
    Ok(state)
}

/// File name for a backup taken on `date`.
#[must_use]
pub fn backup_file_name(date: NaiveDate) -> String {
    format!("BINDS_Backup_{}.json", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ImportErrorKind;
    use crate::ids::IdAllocator;
    use crate::registry::{delete_participant, mark_attendance, register_participant};

    fn sample_state() -> WorkshopState {
        let alloc = IdAllocator::new("BINDS-", 2).unwrap();
        let mut state = WorkshopState::new();
        for name in ["Asha", "Ravi", "Meera"] {
            register_participant(&mut state, &alloc, name, "e@x.com", "APU", "29/1/2026").unwrap();
        }
        mark_attendance(&mut state, "BINDS-01", "Day1-Morning").unwrap();
        mark_attendance(&mut state, "BINDS-01", "Day3-Afternoon").unwrap();
        mark_attendance(&mut state, "BINDS-03", "Day2-Morning").unwrap();
        state
    }

    #[test]
    fn test_export_import_round_trip() {
        let state = sample_state();
        let doc = export_backup(&state, "BINDS – Chapter 2", "29/1/2026, 9:41:07 am");
        let json = doc.to_pretty_json().unwrap();

        let restored = import_backup(&json).unwrap();
        assert_eq!(restored.participants, state.participants);
        assert_eq!(restored.attendance, state.attendance);
        assert_eq!(restored.last_sequence, Some(3));
    }

    #[test]
    fn test_export_document_shape() {
        let doc = export_backup(&sample_state(), "BINDS – Chapter 2", "29/1/2026, 9:41:07 am");
        let json = doc.to_pretty_json().unwrap();

        assert!(json.contains("\n  \"exportDate\": \"29/1/2026, 9:41:07 am\""));
        assert!(json.contains("\"workshopName\": \"BINDS – Chapter 2\""));
        assert!(json.contains("\"registrationDate\": \"29/1/2026\""));

        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["participants"].as_array().unwrap().len(), 3);
        assert_eq!(value["attendance"]["BINDS-02"], serde_json::json!([]));
    }

    #[test]
    fn test_import_malformed_json() {
        let err = import_backup("{not json").unwrap_err();
        assert_eq!(err.kind, ImportErrorKind::MalformedJson);

        let err = import_backup("[1, 2, 3]").unwrap_err();
        assert_eq!(err.kind, ImportErrorKind::MalformedJson);
    }

    #[test]
    fn test_import_missing_participants() {
        let err = import_backup(r#"{"attendance":{}}"#).unwrap_err();
        assert_eq!(err.kind, ImportErrorKind::MissingParticipants);

        let err = import_backup(r#"{"participants": null}"#).unwrap_err();
        assert_eq!(err.kind, ImportErrorKind::MissingParticipants);
    }

    #[test]
    fn test_import_wrong_shapes_are_malformed() {
        let err = import_backup(r#"{"participants": "everyone"}"#).unwrap_err();
        assert_eq!(err.kind, ImportErrorKind::MalformedJson);

        let err = import_backup(r#"{"participants": [], "attendance": [1]}"#).unwrap_err();
        assert_eq!(err.kind, ImportErrorKind::MalformedJson);
    }

    #[test]
    fn test_import_defaults_attendance() {
        let raw = r#"{"participants": [{"id":"BINDS-01","name":"Asha","email":"a@x.com","institute":"XYZ","registrationDate":"1/1/2026"}]}"#;
        let state = import_backup(raw).unwrap();
        assert_eq!(state.len(), 1);
        assert!(state.attendance.is_empty());
        assert_eq!(state.last_sequence, None);
    }

    #[test]
    fn test_import_ignores_unknown_fields_and_prunes_dangling() {
        let raw = r#"{
            "exportDate": "whenever",
            "workshopName": "Other",
            "version": 7,
            "participants": [{"id":"BINDS-01","name":"Asha"}],
            "attendance": {"BINDS-01": ["Day1-Morning"], "BINDS-09": ["Day1-Morning"]}
        }"#;
        let state = import_backup(raw).unwrap();
        assert!(state.has_attended("BINDS-01"));
        assert!(state.sessions_of("BINDS-09").is_none());
    }

    #[test]
    fn test_import_keeps_repeated_ids_from_older_exports() {
        // Older exports numbered by count, so delete-then-register repeated ids.
        let raw = r#"{
            "exportDate": "30/1/2026, 5:12:40 pm",
            "workshopName": "BINDS – Chapter 2",
            "participants": [
                {"id":"BINDS-01","name":"Asha","email":"a@x.com","institute":"XYZ","registrationDate":"29/1/2026"},
                {"id":"BINDS-03","name":"Meera","email":"m@x.com","institute":"IISER","registrationDate":"29/1/2026"},
                {"id":"BINDS-03","name":"Kiran","email":"k@x.com","institute":"APU","registrationDate":"30/1/2026"}
            ],
            "attendance": {"BINDS-03": ["Day1-Morning"]}
        }"#;

        let state = import_backup(raw).unwrap();
        assert_eq!(state.len(), 3);
        assert_eq!(state.participants[2].name, "Kiran");
        assert!(state.has_attended("BINDS-03"));

        let alloc = IdAllocator::new("BINDS-", 2).unwrap();
        assert_eq!(alloc.next_id(&state), "BINDS-04");
    }

    #[test]
    fn test_counter_survives_round_trip() {
        let mut state = sample_state();
        delete_participant(&mut state, "BINDS-03").unwrap();

        let json = export_backup(&state, "w", "d").to_pretty_json().unwrap();
        let restored = import_backup(&json).unwrap();

        let alloc = IdAllocator::new("BINDS-", 2).unwrap();
        assert_eq!(alloc.next_id(&restored), "BINDS-04");
    }

    #[test]
    fn test_backup_file_name() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        assert_eq!(backup_file_name(date), "BINDS_Backup_2026-01-31.json");
    }
}
