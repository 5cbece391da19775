//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

/// Register command arguments.
#[derive(Debug, Args)]
pub struct RegisterCommand {
    /// Full name
    #[arg(short, long)]
    pub name: String,

    /// Email address
    #[arg(short, long)]
    pub email: String,

    /// Institute or affiliation
    #[arg(short, long)]
    pub institute: String,

    /// Output the new participant as JSON
    #[arg(long)]
    pub json: bool,
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Only show participants whose name or id contains this text
    pub query: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments naming a single participant.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Participant id (case-insensitive)
    pub id: String,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Delete command arguments.
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Participant id (case-insensitive)
    pub id: String,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for marking or unmarking one session.
#[derive(Debug, Args)]
pub struct AttendanceCommand {
    /// Participant id (case-insensitive)
    pub id: String,

    /// Session name, e.g. Day1-Morning
    pub session: String,
}

/// Scan command arguments.
#[derive(Debug, Args)]
pub struct ScanCommand {
    /// Session to record attendance for
    pub session: String,

    /// Print one JSON object per scan instead of a message
    #[arg(short, long)]
    pub json: bool,
}

/// Stats command arguments.
#[derive(Debug, Args)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Attendance sheet arguments.
#[derive(Debug, Args)]
pub struct SheetCommand {
    /// Write CSV instead of a table
    #[arg(long)]
    pub csv: bool,

    /// Output file (`-` for stdout; defaults to a dated file in the export directory)
    #[arg(short, long, value_name = "FILE", requires = "csv")]
    pub output: Option<PathBuf>,
}

/// Backup commands.
#[derive(Debug, Subcommand)]
pub enum BackupCommand {
    /// Write the whole workshop to a JSON backup
    Export {
        /// Output file (`-` for stdout; defaults to a dated file in the export directory)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Replace the whole workshop with a JSON backup
    Import {
        /// Backup file to read
        file: PathBuf,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show configuration file path
    Path,

    /// Validate configuration file
    Validate {
        /// Path to config file to validate (uses default if not specified)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One id per line
    #[default]
    Plain,
    /// Aligned columns
    Table,
    /// JSON array
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Plain);
    }

    #[test]
    fn test_register_command_debug() {
        let cmd = RegisterCommand {
            name: "Asha".to_string(),
            email: "a@x.com".to_string(),
            institute: "XYZ".to_string(),
            json: false,
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("institute"));
        assert!(debug_str.contains("Asha"));
    }

    #[test]
    fn test_backup_command_debug() {
        let cmd = BackupCommand::Import {
            file: PathBuf::from("backup.json"),
            yes: true,
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Import"));
        assert!(debug_str.contains("backup.json"));
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Show"));
    }

    #[test]
    fn test_output_format_debug() {
        let format = OutputFormat::Json;
        let debug_str = format!("{format:?}");
        assert_eq!(debug_str, "Json");
    }
}
