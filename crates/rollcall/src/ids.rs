//! Participant identifier allocation.
//!
//! Identifiers are a fixed prefix followed by a zero-padded sequence number
//! (`BINDS-01`). The next number is one past the largest of the persisted
//! counter, the highest number found among existing ids, and the participant
//! count, so an id freed by a deletion is never handed out again.

use regex::Regex;

use crate::error::{Error, Result};
use crate::model::WorkshopState;

/// Widest zero padding accepted for sequence numbers.
pub const MAX_ID_WIDTH: usize = 9;

/// Issues sequential participant identifiers.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    prefix: String,
    width: usize,
    sequence: Regex,
}

impl IdAllocator {
    /// Create an allocator for `prefix` with `width`-digit zero padding.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigValidation`] if the prefix is empty or contains
    /// characters other than uppercase ASCII letters, digits, `-` or `_`
    /// (scanned tokens are uppercased before lookup), or if the
    /// width is outside `1..=9`.
    pub fn new(prefix: impl Into<String>, width: usize) -> Result<Self> {
        let prefix = prefix.into();
        validate_prefix(&prefix)?;
        if width == 0 || width > MAX_ID_WIDTH {
            return Err(Error::ConfigValidation {
                message: format!("id_width must be between 1 and {MAX_ID_WIDTH}, got {width}"),
            });
        }

        let sequence = Regex::new(&format!("^{}([0-9]+)$", regex::escape(&prefix)))
            .map_err(|e| Error::internal(format!("id pattern: {e}")))?;

        Ok(Self {
            prefix,
            width,
            sequence,
        })
    }

    /// The configured prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The configured padding width.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Render a sequence number as an identifier.
    ///
    /// Numbers wider than the padding are rendered in full.
    #[must_use]
    pub fn format_id(&self, sequence: u32) -> String {
        format!("{}{:0width$}", self.prefix, sequence, width = self.width)
    }

    /// Parse the sequence number out of an identifier with this prefix.
    #[must_use]
    pub fn sequence_of(&self, id: &str) -> Option<u32> {
        self.sequence
            .captures(id)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    /// The sequence number the next registration will receive.
    #[must_use]
    pub fn next_sequence(&self, state: &WorkshopState) -> u32 {
        let highest_existing = state
            .participants
            .iter()
            .filter_map(|p| self.sequence_of(&p.id))
            .max()
            .unwrap_or(0);
        let count = u32::try_from(state.len()).unwrap_or(u32::MAX);

        state
            .last_sequence
            .unwrap_or(0)
            .max(highest_existing)
            .max(count)
            .saturating_add(1)
    }

    /// The identifier the next registration will receive.
    #[must_use]
    pub fn next_id(&self, state: &WorkshopState) -> String {
        self.format_id(self.next_sequence(state))
    }
}

/// Check that an identifier prefix is safe to embed in scannable codes and CSV.
///
/// # Errors
///
/// Returns [`Error::ConfigValidation`] describing the offending prefix.
pub fn validate_prefix(prefix: &str) -> Result<()> {
    let valid = !prefix.is_empty()
        && prefix
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(Error::ConfigValidation {
            message: format!(
                "id_prefix {prefix:?} must be non-empty and use only uppercase ASCII letters, digits, '-' or '_'"
            ),
        })
    }
}

/// Normalize a scanned or typed identifier token before lookup.
#[must_use]
pub fn normalize_token(raw: &str) -> String {
    raw.trim().to_uppercase()
}
