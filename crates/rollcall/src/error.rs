//! Error types for rollcall.
//!
//! This module defines all error types used throughout the rollcall crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for rollcall operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Model Errors ===
    /// A required input field was missing or blank.
    #[error("invalid {field}: {message}")]
    Validation {
        /// Name of the offending field.
        field: &'static str,
        /// Description of the validation failure.
        message: String,
    },

    /// No participant is registered under the given id.
    #[error("participant not found: {id}")]
    NotFound {
        /// The id that was looked up.
        id: String,
    },

    // === Storage Errors ===
    /// The store rejected a write.
    #[error("failed to save workshop data: {message}")]
    Storage {
        /// Description of what went wrong.
        message: String,
    },

    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    // === Backup Errors ===
    /// A backup document could not be imported.
    #[error(transparent)]
    Import(#[from] ImportError),

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for rollcall operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a validation error for the named field.
    #[must_use]
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Create a not-found error for a participant id.
    #[must_use]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Create a storage error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error is an unknown participant.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error is an input validation failure.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Check if this error came from the persistence layer.
    #[must_use]
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Self::Storage { .. } | Self::DatabaseOpen { .. } | Self::DatabaseQuery(_)
        )
    }

    /// The import failure kind, if this is an import error.
    #[must_use]
    pub fn import_kind(&self) -> Option<ImportErrorKind> {
        match self {
            Self::Import(err) => Some(err.kind),
            _ => None,
        }
    }
}

/// Why a backup document was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportErrorKind {
    /// The document is not valid JSON, or a field has the wrong shape.
    MalformedJson,
    /// The document has no `participants` field.
    MissingParticipants,
}

impl fmt::Display for ImportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedJson => write!(f, "malformed JSON"),
            Self::MissingParticipants => write!(f, "missing participants"),
        }
    }
}

/// A rejected backup import.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid backup file ({kind}): {detail}")]
pub struct ImportError {
    /// The failure category.
    pub kind: ImportErrorKind,
    /// Human-readable detail, usually from the JSON parser.
    pub detail: String,
}

impl ImportError {
    /// Create a malformed-document error.
    #[must_use]
    pub fn malformed(detail: impl Into<String>) -> Self {
        Self {
            kind: ImportErrorKind::MalformedJson,
            detail: detail.into(),
        }
    }

    /// Create a missing-participants error.
    #[must_use]
    pub fn missing_participants() -> Self {
        Self {
            kind: ImportErrorKind::MissingParticipants,
            detail: "the `participants` field is absent".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = Error::validation("name", "must not be empty");
        assert_eq!(err.to_string(), "invalid name: must not be empty");
        assert!(err.is_validation());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_not_found_error_display() {
        let err = Error::not_found("BINDS-07");
        assert_eq!(err.to_string(), "participant not found: BINDS-07");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_storage_error_display() {
        let err = Error::storage("quota exceeded");
        assert!(err.to_string().contains("quota exceeded"));
        assert!(err.is_storage());
        assert!(!Error::not_found("x").is_storage());
    }

    #[test]
    fn test_internal_error() {
        let err = Error::internal("something went wrong");
        assert_eq!(err.to_string(), "internal error: something went wrong");
    }

    #[test]
    fn test_import_error_kinds() {
        let err: Error = ImportError::malformed("expected value at line 1").into();
        assert_eq!(err.import_kind(), Some(ImportErrorKind::MalformedJson));
        assert!(err.to_string().contains("malformed JSON"));

        let err: Error = ImportError::missing_participants().into();
        assert_eq!(err.import_kind(), Some(ImportErrorKind::MissingParticipants));
        assert!(err.to_string().contains("participants"));

        assert_eq!(Error::internal("x").import_kind(), None);
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
            assert!(err.is_storage());
        }
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "sessions must not be empty".to_string(),
        };
        assert!(err.to_string().contains("sessions must not be empty"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }
}
