//! Configuration management for rollcall.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::PathBuf;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, NaiveDate};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ids::{validate_prefix, IdAllocator, MAX_ID_WIDTH};
use crate::model::DEFAULT_SESSIONS;
use crate::storage::DEFAULT_STORE_KEY;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "rollcall";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "workshop.db";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `ROLLCALL_`, sections split on `__`)
/// 2. TOML config file at `~/.config/rollcall/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Workshop identity, identifiers and sessions.
    pub workshop: WorkshopConfig,
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Export configuration.
    pub export: ExportConfig,
}

/// Workshop-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkshopConfig {
    /// Display name, written into backups and credentials.
    pub name: String,
    /// Venue line printed on credentials.
    pub venue: String,
    /// Date line printed on credentials.
    pub dates: String,
    /// Prefix of every participant id.
    pub id_prefix: String,
    /// Zero-padding width of the id sequence number.
    pub id_width: usize,
    /// Attendance sessions, in sheet column order.
    pub sessions: Vec<String>,
    /// `chrono` format for registration dates.
    pub date_format: String,
    /// `chrono` format for backup export timestamps.
    pub timestamp_format: String,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/rollcall/workshop.db`
    pub database_path: Option<PathBuf>,
    /// Key the workshop blob is stored under.
    pub key: String,
}

/// Export-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory CSV sheets and backups are written to.
    /// Defaults to the current directory.
    pub output_dir: Option<PathBuf>,
}

impl Default for WorkshopConfig {
    fn default() -> Self {
        Self {
            name: "BINDS – Chapter 2".to_string(),
            venue: "Azim Premji University, Bhopal".to_string(),
            dates: "29-31 January 2026".to_string(),
            id_prefix: "BINDS-".to_string(),
            id_width: 2,
            sessions: DEFAULT_SESSIONS.iter().map(ToString::to_string).collect(),
            // en-IN short forms, e.g. "29/1/2026" and "29/1/2026, 9:41:07 am"
            date_format: "%-d/%-m/%Y".to_string(),
            timestamp_format: "%-d/%-m/%Y, %-I:%M:%S %P".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None, // Will be resolved to default at runtime
            key: DEFAULT_STORE_KEY.to_string(),
        }
    }
}

impl WorkshopConfig {
    /// Validate identifiers, sessions and date formats.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigValidation`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        validate_prefix(&self.id_prefix)?;
        if self.id_width == 0 || self.id_width > MAX_ID_WIDTH {
            return Err(Error::ConfigValidation {
                message: format!(
                    "id_width must be between 1 and {MAX_ID_WIDTH}, got {}",
                    self.id_width
                ),
            });
        }

        if self.sessions.is_empty() {
            return Err(Error::ConfigValidation {
                message: "sessions must not be empty".to_string(),
            });
        }
        let mut seen = HashSet::new();
        for session in &self.sessions {
            if session.trim().is_empty() || session.trim() != session {
                return Err(Error::ConfigValidation {
                    message: format!("session name {session:?} must be non-blank and trimmed"),
                });
            }
            if !seen.insert(session.as_str()) {
                return Err(Error::ConfigValidation {
                    message: format!("session {session:?} is listed more than once"),
                });
            }
        }

        for (field, format) in [
            ("date_format", &self.date_format),
            ("timestamp_format", &self.timestamp_format),
        ] {
            if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
                return Err(Error::ConfigValidation {
                    message: format!("{field} {format:?} is not a valid strftime format"),
                });
            }
        }
        // A date has no time of day, so time specifiers only fail when rendered.
        self.render_date(NaiveDate::default())?;
        self.render_timestamp(Local::now())?;

        Ok(())
    }

    /// Render a registration date with `date_format`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigValidation`] if the format needs fields a
    /// plain date does not have, such as `%H`.
    pub fn render_date(&self, date: NaiveDate) -> Result<String> {
        let mut out = String::new();
        write!(out, "{}", date.format(&self.date_format)).map_err(|_| Error::ConfigValidation {
            message: format!(
                "date_format {:?} cannot render a date without a time",
                self.date_format
            ),
        })?;
        Ok(out)
    }

    /// Render an export timestamp with `timestamp_format`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigValidation`] if the format cannot be rendered.
    pub fn render_timestamp(&self, at: DateTime<Local>) -> Result<String> {
        let mut out = String::new();
        write!(out, "{}", at.format(&self.timestamp_format)).map_err(|_| {
            Error::ConfigValidation {
                message: format!(
                    "timestamp_format {:?} cannot be rendered",
                    self.timestamp_format
                ),
            }
        })?;
        Ok(out)
    }

    /// Whether `session` is one of the configured sessions.
    #[must_use]
    pub fn is_known_session(&self, session: &str) -> bool {
        self.sessions.iter().any(|s| s == session)
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("ROLLCALL_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        self.workshop.validate()?;

        if self.storage.key.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "storage key must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Build the identifier allocator described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the prefix or width is invalid.
    pub fn allocator(&self) -> Result<IdAllocator> {
        IdAllocator::new(self.workshop.id_prefix.clone(), self.workshop.id_width)
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the export directory, resolving defaults if not set.
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.export
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
