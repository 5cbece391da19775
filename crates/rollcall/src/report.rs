//! Statistics and attendance reports.
//!
//! The attendance sheet shown on screen and the CSV export are both built
//! from [`attendance_grid`], so the two can never disagree.

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::{Participant, WorkshopState};

/// Fixed leading CSV columns, before the session columns.
const CSV_LEADING_COLUMNS: [&str; 4] = ["Participant ID", "Name", "Email", "Institute"];

/// Trailing CSV column.
const CSV_TOTAL_COLUMN: &str = "Total Sessions";

/// Headline numbers for the workshop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct HomeStats {
    /// Registered participants.
    pub total_participants: usize,
    /// Participants present for at least one session.
    pub total_attended_at_least_once: usize,
}

/// One participant's row of the attendance sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridRow<'a> {
    /// The participant this row describes.
    pub participant: &'a Participant,
    /// Presence per session, in the order the sessions were given.
    pub per_session: Vec<bool>,
    /// Number of `true` entries in `per_session`.
    pub total_attended: usize,
}

/// Count participants, and participants with any attendance.
#[must_use]
pub fn home_stats(state: &WorkshopState) -> HomeStats {
    HomeStats {
        total_participants: state.len(),
        total_attended_at_least_once: state
            .participants
            .iter()
            .filter(|p| state.has_attended(&p.id))
            .count(),
    }
}

/// Number of registered participants present for each session.
#[must_use]
pub fn session_totals<'s, S: AsRef<str>>(
    state: &WorkshopState,
    sessions: &'s [S],
) -> Vec<(&'s str, usize)> {
    sessions
        .iter()
        .map(|session| {
            let session = session.as_ref();
            let count = state
                .participants
                .iter()
                .filter(|p| {
                    state
                        .sessions_of(&p.id)
                        .is_some_and(|attended| attended.contains(session))
                })
                .count();
            (session, count)
        })
        .collect()
}

/// Build the attendance sheet for `sessions`, in registration order.
///
/// Sessions recorded in the state but absent from `sessions` are ignored.
#[must_use]
pub fn attendance_grid<'a, S: AsRef<str>>(
    state: &'a WorkshopState,
    sessions: &[S],
) -> Vec<GridRow<'a>> {
    state
        .participants
        .iter()
        .map(|participant| {
            let attended = state.sessions_of(&participant.id);
            let per_session: Vec<bool> = sessions
                .iter()
                .map(|s| attended.is_some_and(|set| set.contains(s.as_ref())))
                .collect();
            let total_attended = per_session.iter().filter(|present| **present).count();
            GridRow {
                participant,
                per_session,
                total_attended,
            }
        })
        .collect()
}

/// Encode an attendance grid as CSV.
///
/// The header is unquoted; participant fields are double-quoted with
/// embedded quotes doubled; presence is `1`/`0`; every line ends in `\n`.
#[must_use]
pub fn to_csv<S: AsRef<str>>(grid: &[GridRow<'_>], sessions: &[S]) -> String {
    let mut out = String::new();

    let header: Vec<&str> = CSV_LEADING_COLUMNS
        .iter()
        .copied()
        .chain(sessions.iter().map(AsRef::<str>::as_ref))
        .chain(std::iter::once(CSV_TOTAL_COLUMN))
        .collect();
    out.push_str(&header.join(","));
    out.push('\n');

    for row in grid {
        let p = row.participant;
        let mut fields: Vec<String> = [&p.id, &p.name, &p.email, &p.institute]
            .iter()
            .map(|field| quote(field))
            .collect();
        fields.extend(
            row.per_session
                .iter()
                .map(|present| String::from(if *present { "1" } else { "0" })),
        );
        fields.push(row.total_attended.to_string());

        out.push_str(&fields.join(","));
        out.push('\n');
    }

    out
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// File name for a CSV export taken on `date`.
#[must_use]
pub fn csv_file_name(date: NaiveDate) -> String {
    format!("BINDS_Attendance_{}.csv", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::IdAllocator;
    use crate::model::DEFAULT_SESSIONS;
    use crate::registry::{mark_attendance, register_participant};

    fn workshop() -> WorkshopState {
        let alloc = IdAllocator::new("BINDS-", 2).unwrap();
        let mut state = WorkshopState::new();
        register_participant(&mut state, &alloc, "Asha Rao", "a@x.com", "XYZ University", "1/1/2026")
            .unwrap();
        register_participant(&mut state, &alloc, "Ravi", "r@x.com", "APU", "1/1/2026").unwrap();
        register_participant(&mut state, &alloc, "Meera", "m@x.com", "IISER", "1/1/2026").unwrap();

        mark_attendance(&mut state, "BINDS-01", "Day1-Morning").unwrap();
        mark_attendance(&mut state, "BINDS-01", "Day2-Afternoon").unwrap();
        mark_attendance(&mut state, "BINDS-02", "Day1-Morning").unwrap();
        // Not one of the configured sessions.
        mark_attendance(&mut state, "BINDS-02", "Bonus-Session").unwrap();
        state
    }

    #[test]
    fn test_home_stats() {
        let stats = home_stats(&workshop());
        assert_eq!(stats.total_participants, 3);
        assert_eq!(stats.total_attended_at_least_once, 2);
        assert_eq!(home_stats(&WorkshopState::new()), HomeStats::default());
    }

    #[test]
    fn test_session_totals() {
        let state = workshop();
        let totals = session_totals(&state, &DEFAULT_SESSIONS);
        assert_eq!(totals[0], ("Day1-Morning", 2));
        assert_eq!(totals[3], ("Day2-Afternoon", 1));
        assert_eq!(totals[5], ("Day3-Afternoon", 0));
    }

    #[test]
    fn test_attendance_grid_rows() {
        let state = workshop();
        let grid = attendance_grid(&state, &DEFAULT_SESSIONS);

        assert_eq!(grid.len(), 3);
        assert_eq!(grid[0].participant.id, "BINDS-01");
        assert_eq!(
            grid[0].per_session,
            vec![true, false, false, true, false, false]
        );
        assert_eq!(grid[0].total_attended, 2);

        // Unknown sessions are not counted.
        assert_eq!(grid[1].total_attended, 1);
        assert_eq!(grid[2].total_attended, 0);
    }

    #[test]
    fn test_grid_total_matches_intersection() {
        let state = workshop();
        let sessions = ["Day2-Afternoon", "Bonus-Session"];
        let grid = attendance_grid(&state, &sessions);

        for row in &grid {
            let set = state.sessions_of(&row.participant.id).unwrap();
            let expected = sessions.iter().filter(|s| set.contains(**s)).count();
            assert_eq!(row.total_attended, expected);
        }
    }

    #[test]
    fn test_grid_respects_session_order() {
        let state = workshop();
        let grid = attendance_grid(&state, &["Day2-Afternoon", "Day1-Morning"]);
        assert_eq!(grid[0].per_session, vec![true, true]);
        assert_eq!(grid[1].per_session, vec![false, true]);
    }

    #[test]
    fn test_to_csv_format() {
        let state = workshop();
        let grid = attendance_grid(&state, &DEFAULT_SESSIONS);
        let csv = to_csv(&grid, &DEFAULT_SESSIONS);

        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "Participant ID,Name,Email,Institute,Day1-Morning,Day1-Afternoon,Day2-Morning,\
             Day2-Afternoon,Day3-Morning,Day3-Afternoon,Total Sessions"
        );
        assert_eq!(
            lines[1],
            "\"BINDS-01\",\"Asha Rao\",\"a@x.com\",\"XYZ University\",1,0,0,1,0,0,2"
        );
        assert_eq!(lines[3], "\"BINDS-03\",\"Meera\",\"m@x.com\",\"IISER\",0,0,0,0,0,0,0");
        assert_eq!(lines.len(), 4);
        assert!(csv.ends_with('\n'));
        assert_eq!(csv.matches('\n').count(), 4);
        assert!(!csv.contains(",\n"));
    }

    #[test]
    fn test_to_csv_is_deterministic() {
        let state = workshop();
        let first = to_csv(&attendance_grid(&state, &DEFAULT_SESSIONS), &DEFAULT_SESSIONS);
        let second = to_csv(&attendance_grid(&state, &DEFAULT_SESSIONS), &DEFAULT_SESSIONS);
        assert_eq!(first, second);
    }

    #[test]
    fn test_to_csv_escapes_quotes() {
        let alloc = IdAllocator::new("BINDS-", 2).unwrap();
        let mut state = WorkshopState::new();
        register_participant(&mut state, &alloc, "Asha \"Ash\" Rao", "a@x.com", "Lab, North", "d")
            .unwrap();

        let csv = to_csv(&attendance_grid(&state, &["S1"]), &["S1"]);
        assert!(csv.contains("\"Asha \"\"Ash\"\" Rao\""));
        assert!(csv.contains("\"Lab, North\""));
    }

    #[test]
    fn test_to_csv_empty_grid_is_header_only() {
        let csv = to_csv(&[], &["S1", "S2"]);
        assert_eq!(csv, "Participant ID,Name,Email,Institute,S1,S2,Total Sessions\n");
    }

    #[test]
    fn test_csv_file_name() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 29).unwrap();
        assert_eq!(csv_file_name(date), "BINDS_Attendance_2026-01-29.csv");
    }
}
