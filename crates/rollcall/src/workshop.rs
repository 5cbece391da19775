//! A workshop bound to its store.
//!
//! [`Workshop`] owns one [`WorkshopState`] and one [`Store`]. Every mutating
//! call runs the pure operation from [`crate::registry`] and then saves the
//! whole state. If the save is rejected the in-memory state is put back the
//! way it was, so callers never see numbers derived from data that was not
//! persisted.

use chrono::{DateTime, Local, NaiveDate};
use tracing::{debug, info};

use crate::backup::{self, BackupDocument};
use crate::config::WorkshopConfig;
use crate::error::Result;
use crate::ids::{normalize_token, IdAllocator};
use crate::model::{AttendanceResult, Participant, SessionSet, WorkshopState};
use crate::registry;
use crate::report::{self, GridRow, HomeStats};
use crate::storage::Store;

/// Workshop state plus the store it is persisted to.
#[derive(Debug)]
pub struct Workshop<S: Store> {
    state: WorkshopState,
    store: S,
    allocator: IdAllocator,
    config: WorkshopConfig,
}

impl<S: Store> Workshop<S> {
    /// Load the workshop from `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid. Unreadable stored data is not
    /// an error; it yields an empty workshop.
    pub fn open(store: S, config: WorkshopConfig) -> Result<Self> {
        config.validate()?;
        let allocator = IdAllocator::new(config.id_prefix.clone(), config.id_width)?;
        let state = store.load();
        info!(participants = state.len(), "Workshop loaded");

        Ok(Self {
            state,
            store,
            allocator,
            config,
        })
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &WorkshopState {
        &self.state
    }

    /// Workshop configuration.
    #[must_use]
    pub fn config(&self) -> &WorkshopConfig {
        &self.config
    }

    /// The configured sessions, in sheet order.
    #[must_use]
    pub fn sessions(&self) -> &[String] {
        &self.config.sessions
    }

    /// The backing store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consume the workshop, returning its store.
    #[must_use]
    pub fn into_store(self) -> S {
        self.store
    }

    /// The id the next registration will receive.
    #[must_use]
    pub fn next_id(&self) -> String {
        self.allocator.next_id(&self.state)
    }

    /// Register a participant, stamped with today's local date.
    ///
    /// # Errors
    ///
    /// Returns a validation error for blank fields, or a storage error if
    /// the new state could not be saved.
    pub fn register(&mut self, name: &str, email: &str, institute: &str) -> Result<Participant> {
        self.register_on(name, email, institute, Local::now().date_naive())
    }

    /// Register a participant with an explicit registration date.
    ///
    /// # Errors
    ///
    /// Same as [`Workshop::register`].
    pub fn register_on(
        &mut self,
        name: &str,
        email: &str,
        institute: &str,
        date: NaiveDate,
    ) -> Result<Participant> {
        let snapshot = self.state.clone();
        let stamp = self.config.render_date(date)?;
        let participant = registry::register_participant(
            &mut self.state,
            &self.allocator,
            name,
            email,
            institute,
            stamp,
        )?;
        self.persist(snapshot)?;
        Ok(participant)
    }

    /// Delete a participant and their attendance.
    ///
    /// # Errors
    ///
    /// Returns a not-found error for unknown ids, or a storage error.
    pub fn delete(&mut self, id: &str) -> Result<Participant> {
        let snapshot = self.state.clone();
        let removed = registry::delete_participant(&mut self.state, id)?;
        self.persist(snapshot)?;
        Ok(removed)
    }

    /// Look up a participant by exact id.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Participant> {
        registry::find_participant(&self.state, id)
    }

    /// Participants whose name or id contains `query`, ignoring case.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&Participant> {
        registry::search_participants(&self.state, query)
    }

    /// Sessions recorded for a participant.
    #[must_use]
    pub fn attendance_for(&self, id: &str) -> Option<&SessionSet> {
        registry::attendance_for(&self.state, id)
    }

    /// Mark a participant present. Already-marked sessions are not re-saved.
    ///
    /// # Errors
    ///
    /// Returns validation, not-found or storage errors.
    pub fn mark_attendance(&mut self, participant_id: &str, session: &str) -> Result<AttendanceResult> {
        let snapshot = self.state.clone();
        let result = registry::mark_attendance(&mut self.state, participant_id, session)?;
        if result.is_marked() {
            self.persist(snapshot)?;
        }
        Ok(result)
    }

    /// Mark attendance from a scanned or typed token.
    ///
    /// The token is trimmed and uppercased before lookup, so a scanner and a
    /// keyboard reach the same participant.
    ///
    /// # Errors
    ///
    /// Same as [`Workshop::mark_attendance`].
    pub fn record_scan(&mut self, token: &str, session: &str) -> Result<AttendanceResult> {
        let id = normalize_token(token);
        debug!(token, id = %id, "Recording scan");
        self.mark_attendance(&id, session)
    }

    /// Remove a session from a participant's attendance.
    ///
    /// # Errors
    ///
    /// Returns not-found or storage errors.
    pub fn unmark_attendance(&mut self, participant_id: &str, session: &str) -> Result<bool> {
        let snapshot = self.state.clone();
        let removed = registry::unmark_attendance(&mut self.state, participant_id, session)?;
        if removed {
            self.persist(snapshot)?;
        }
        Ok(removed)
    }

    /// Headline counts.
    #[must_use]
    pub fn stats(&self) -> HomeStats {
        report::home_stats(&self.state)
    }

    /// Participants present per configured session.
    #[must_use]
    pub fn session_totals(&self) -> Vec<(&str, usize)> {
        report::session_totals(&self.state, &self.config.sessions)
    }

    /// Attendance sheet over the configured sessions.
    #[must_use]
    pub fn grid(&self) -> Vec<GridRow<'_>> {
        report::attendance_grid(&self.state, &self.config.sessions)
    }

    /// Attendance sheet as CSV.
    #[must_use]
    pub fn csv(&self) -> String {
        report::to_csv(&self.grid(), &self.config.sessions)
    }

    /// Snapshot the workshop as a backup document dated now.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the timestamp format cannot be
    /// rendered.
    pub fn export_backup(&self) -> Result<BackupDocument> {
        self.export_backup_at(Local::now())
    }

    /// Snapshot the workshop as a backup document dated `at`.
    ///
    /// # Errors
    ///
    /// Same as [`Workshop::export_backup`].
    pub fn export_backup_at(&self, at: DateTime<Local>) -> Result<BackupDocument> {
        let export_date = self.config.render_timestamp(at)?;
        Ok(backup::export_backup(
            &self.state,
            self.config.name.clone(),
            export_date,
        ))
    }

    /// Replace the whole state, e.g. with an imported backup.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the new state could not be saved; the
    /// previous state is kept.
    pub fn replace_state(&mut self, state: WorkshopState) -> Result<()> {
        let snapshot = std::mem::replace(&mut self.state, state);
        self.persist(snapshot)?;
        info!(participants = self.state.len(), "Workshop state replaced");
        Ok(())
    }

    /// Parse a backup document and replace the state with it.
    ///
    /// Returns the number of participants restored.
    ///
    /// # Errors
    ///
    /// Returns an import error for invalid documents (state unchanged) or a
    /// storage error.
    pub fn import_backup(&mut self, raw: &str) -> Result<usize> {
        let state = backup::import_backup(raw)?;
        let count = state.len();
        self.replace_state(state)?;
        Ok(count)
    }

    /// Save the current state, restoring `snapshot` if the save fails.
    fn persist(&mut self, snapshot: WorkshopState) -> Result<()> {
        if let Err(e) = self.store.save(&self.state) {
            self.state = snapshot;
            return Err(e);
        }
        Ok(())
    }
}
