//! Core data types for rollcall.
//!
//! [`WorkshopState`] is the single root object: an ordered list of
//! [`Participant`]s plus the [`AttendanceLog`] mapping each participant id to
//! the set of sessions they were present for.

mod participant;
mod state;

pub use participant::Participant;
pub use state::{AttendanceLog, AttendanceResult, SessionSet, WorkshopState};

/// Session names used when no configuration overrides them.
pub const DEFAULT_SESSIONS: [&str; 6] = [
    "Day1-Morning",
    "Day1-Afternoon",
    "Day2-Morning",
    "Day2-Afternoon",
    "Day3-Morning",
    "Day3-Afternoon",
];
