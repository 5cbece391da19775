//! Command-line interface for rollcall.
//!
//! This module provides the CLI structure for the `rollcall` binary. The
//! handlers live in `main.rs`.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::logging::Verbosity;

pub use commands::{
    AttendanceCommand, BackupCommand, ConfigCommand, DeleteCommand, ListCommand, OutputFormat,
    RegisterCommand, ScanCommand, SheetCommand, ShowCommand, StatsCommand,
};

/// rollcall - Workshop registration and attendance
///
/// Registers participants, issues scannable ids, records attendance per
/// session and exports attendance sheets and backups.
#[derive(Debug, Parser)]
#[command(name = "rollcall")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Register a participant and print their id
    Register(RegisterCommand),

    /// List or search participants
    List(ListCommand),

    /// Show one participant and their attendance
    Show(ShowCommand),

    /// Delete a participant and their attendance
    Delete(DeleteCommand),

    /// Mark a participant present for a session
    Mark(AttendanceCommand),

    /// Remove a session from a participant's attendance
    Unmark(AttendanceCommand),

    /// Record attendance from scanned ids read from stdin, one per line
    Scan(ScanCommand),

    /// Show headline counts
    Stats(StatsCommand),

    /// Show or export the attendance sheet
    Sheet(SheetCommand),

    /// Print the credential for a participant
    Card(ShowCommand),

    /// Export or import backups
    #[command(subcommand)]
    Backup(BackupCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::Trace,
            }
        }
    }
}
