//! Scan intake.
//!
//! A [`ScanSource`] produces decoded tokens (from a barcode scanner acting as
//! a keyboard, a camera decoder, or a file) and pushes them into a bounded
//! channel. A [`ScanSession`] consumes the channel and applies each token to
//! the workshop for one attendance session, one token at a time.

use std::fmt;

use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::ids::normalize_token;
use crate::model::AttendanceResult;
use crate::storage::Store;
use crate::workshop::Workshop;

/// Capacity of the channel between a source and its session.
pub const SCAN_CHANNEL_CAPACITY: usize = 64;

/// Something that yields scanned tokens.
#[async_trait::async_trait]
pub trait ScanSource: Send {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Push tokens into `tx` until the source is exhausted.
    ///
    /// Returning drops `tx`, which ends the consuming session.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying input fails.
    async fn run(&mut self, tx: mpsc::Sender<String>) -> Result<()>;
}

/// Reads one token per line. Blank lines are skipped.
#[derive(Debug)]
pub struct LineScanner<R> {
    lines: Lines<R>,
}

impl<R: AsyncBufRead + Unpin + Send> LineScanner<R> {
    /// Read tokens from `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }
}

impl LineScanner<tokio::io::BufReader<tokio::io::Stdin>> {
    /// Read tokens from standard input.
    #[must_use]
    pub fn stdin() -> Self {
        Self::new(tokio::io::BufReader::new(tokio::io::stdin()))
    }
}

#[async_trait::async_trait]
impl<R: AsyncBufRead + Unpin + Send> ScanSource for LineScanner<R> {
    fn name(&self) -> &'static str {
        "lines"
    }

    async fn run(&mut self, tx: mpsc::Sender<String>) -> Result<()> {
        while let Some(line) = self.lines.next_line().await? {
            let token = line.trim();
            if token.is_empty() {
                continue;
            }
            if tx.send(token.to_string()).await.is_err() {
                debug!("Scan consumer went away");
                break;
            }
        }
        Ok(())
    }
}

/// What happened to one scanned token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScanOutcome {
    /// Attendance was recorded.
    Marked {
        /// Participant id.
        id: String,
        /// Participant name.
        name: String,
    },
    /// The participant already had this session.
    AlreadyMarked {
        /// Participant id.
        id: String,
        /// Participant name.
        name: String,
    },
    /// No participant has this id.
    Unknown {
        /// Normalized token.
        id: String,
    },
    /// The token was valid but could not be recorded.
    Failed {
        /// Normalized token.
        id: String,
        /// Why.
        reason: String,
    },
}

impl ScanOutcome {
    /// Whether the scan changed the stored attendance.
    #[must_use]
    pub fn is_marked(&self) -> bool {
        matches!(self, Self::Marked { .. })
    }
}

impl fmt::Display for ScanOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Marked { id, name } => write!(f, "{id}: {name} marked present"),
            Self::AlreadyMarked { id, name } => {
                write!(f, "{id}: {name} already marked for this session")
            }
            Self::Unknown { id } => write!(f, "{id}: participant not found"),
            Self::Failed { id, reason } => write!(f, "{id}: {reason}"),
        }
    }
}

/// Running tally of a scan session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    /// Tokens that recorded attendance.
    pub marked: usize,
    /// Tokens for participants already present.
    pub already_marked: usize,
    /// Unknown or failed tokens.
    pub rejected: usize,
}

/// Applies scanned tokens to one attendance session.
#[derive(Debug)]
pub struct ScanSession<'w, S: Store> {
    workshop: &'w mut Workshop<S>,
    session: String,
    summary: ScanSummary,
}

impl<'w, S: Store> ScanSession<'w, S> {
    /// Start scanning for `session`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `session` is not a configured session.
    pub fn new(workshop: &'w mut Workshop<S>, session: &str) -> Result<Self> {
        if !workshop.config().is_known_session(session) {
            return Err(Error::validation(
                "session",
                format!("unknown session {session:?}"),
            ));
        }
        Ok(Self {
            workshop,
            session: session.to_string(),
            summary: ScanSummary::default(),
        })
    }

    /// The session being recorded.
    #[must_use]
    pub fn session(&self) -> &str {
        &self.session
    }

    /// Tally so far.
    #[must_use]
    pub fn summary(&self) -> ScanSummary {
        self.summary
    }

    /// Apply one token.
    pub fn apply(&mut self, token: &str) -> ScanOutcome {
        let id = normalize_token(token);
        let outcome = match self.workshop.record_scan(&id, &self.session) {
            Ok(result) => {
                let name = self
                    .workshop
                    .find(&id)
                    .map(|p| p.name.clone())
                    .unwrap_or_default();
                match result {
                    AttendanceResult::Marked => ScanOutcome::Marked { id, name },
                    AttendanceResult::AlreadyMarked => ScanOutcome::AlreadyMarked { id, name },
                }
            }
            Err(e) if e.is_not_found() => ScanOutcome::Unknown { id },
            Err(e) => {
                warn!(error = %e, id = %id, "Scan could not be recorded");
                ScanOutcome::Failed {
                    id,
                    reason: e.to_string(),
                }
            }
        };

        match outcome {
            ScanOutcome::Marked { .. } => self.summary.marked += 1,
            ScanOutcome::AlreadyMarked { .. } => self.summary.already_marked += 1,
            ScanOutcome::Unknown { .. } | ScanOutcome::Failed { .. } => self.summary.rejected += 1,
        }
        outcome
    }
}

/// Drive `source` to completion, applying every token to `session`.
///
/// `on_outcome` sees each outcome as soon as it is recorded.
///
/// # Errors
///
/// Returns the source's error, if any. Tokens received before the error
/// stay recorded.
pub async fn run_scan<S, Src>(
    source: &mut Src,
    session: &mut ScanSession<'_, S>,
    mut on_outcome: impl FnMut(&ScanOutcome),
) -> Result<ScanSummary>
where
    S: Store,
    Src: ScanSource + ?Sized,
{
    info!(source = source.name(), session = session.session(), "Scanning");
    let (tx, mut rx) = mpsc::channel(SCAN_CHANNEL_CAPACITY);

    let produce = source.run(tx);
    let consume = async {
        while let Some(token) = rx.recv().await {
            let outcome = session.apply(&token);
            on_outcome(&outcome);
        }
    };
    let (produced, ()) = tokio::join!(produce, consume);
    produced?;

    let summary = session.summary();
    info!(
        marked = summary.marked,
        already_marked = summary.already_marked,
        rejected = summary.rejected,
        "Scan finished"
    );
    Ok(summary)
}
