//! `rollcall` - CLI for workshop registration and attendance
//!
//! This binary opens the configured workshop database and runs one command
//! against it.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use clap::Parser;

use rollcall::backup::{backup_file_name, import_backup};
use rollcall::cli::{
    AttendanceCommand, BackupCommand, Cli, Command, ConfigCommand, DeleteCommand, ListCommand,
    OutputFormat, RegisterCommand, ScanCommand, SheetCommand, ShowCommand,
};
use rollcall::ids::normalize_token;
use rollcall::report::csv_file_name;
use rollcall::scan::{run_scan, LineScanner, ScanSession};
use rollcall::{
    init_logging, AttendanceResult, Config, CredentialPayload, Error, SqliteStore, Workshop,
};

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() -> CliResult {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    // Execute the command
    match cli.command {
        Command::Register(cmd) => handle_register(&mut open_workshop(&config)?, &cmd),
        Command::List(cmd) => handle_list(&open_workshop(&config)?, &cmd),
        Command::Show(cmd) => handle_show(&open_workshop(&config)?, &cmd),
        Command::Delete(cmd) => handle_delete(&mut open_workshop(&config)?, &cmd),
        Command::Mark(cmd) => handle_mark(&mut open_workshop(&config)?, &cmd),
        Command::Unmark(cmd) => handle_unmark(&mut open_workshop(&config)?, &cmd),
        Command::Scan(cmd) => handle_scan(&mut open_workshop(&config)?, &cmd),
        Command::Stats(cmd) => handle_stats(&open_workshop(&config)?, cmd.json),
        Command::Sheet(cmd) => handle_sheet(&config, &open_workshop(&config)?, &cmd),
        Command::Card(cmd) => handle_card(&open_workshop(&config)?, &cmd),
        Command::Backup(cmd) => handle_backup(&config, &mut open_workshop(&config)?, cmd),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

type Db = Workshop<SqliteStore>;

fn open_workshop(config: &Config) -> Result<Db, Error> {
    let store = SqliteStore::open(config.database_path(), config.storage.key.clone())?;
    Workshop::open(store, config.workshop.clone())
}

fn handle_register(workshop: &mut Db, cmd: &RegisterCommand) -> CliResult {
    let participant = workshop.register(&cmd.name, &cmd.email, &cmd.institute)?;
    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&participant)?);
    } else {
        println!("Registered {} as {}", participant.name, participant.id);
    }
    Ok(())
}

fn handle_list(workshop: &Db, cmd: &ListCommand) -> CliResult {
    let hits = workshop.search(cmd.query.as_deref().unwrap_or(""));

    match cmd.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&hits)?),
        OutputFormat::Plain => {
            for p in &hits {
                println!("{}", p.id);
            }
        }
        OutputFormat::Table => {
            if hits.is_empty() {
                println!("No participants found.");
                return Ok(());
            }
            let id_width = hits.iter().map(|p| p.id.len()).max().unwrap_or(2);
            let name_width = hits.iter().map(|p| p.name.chars().count()).max().unwrap_or(4);
            println!("{:id_width$}  {:name_width$}  INSTITUTE", "ID", "NAME");
            for p in &hits {
                println!("{:id_width$}  {:name_width$}  {}", p.id, p.name, p.institute);
            }
        }
    }
    Ok(())
}

fn handle_show(workshop: &Db, cmd: &ShowCommand) -> CliResult {
    let id = normalize_token(&cmd.id);
    let participant = workshop.find(&id).ok_or_else(|| Error::not_found(&id))?;
    let attended: Vec<&str> = workshop
        .sessions()
        .iter()
        .filter(|s| {
            workshop
                .attendance_for(&id)
                .is_some_and(|set| set.contains(s.as_str()))
        })
        .map(String::as_str)
        .collect();

    if cmd.json {
        let value = serde_json::json!({
            "participant": participant,
            "sessions": attended,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{} ({})", participant.name, participant.id);
        println!("  Email:       {}", participant.email);
        println!("  Institute:   {}", participant.institute);
        println!("  Registered:  {}", participant.registration_date);
        println!(
            "  Attended:    {}/{} {}",
            attended.len(),
            workshop.sessions().len(),
            attended.join(", ")
        );
    }
    Ok(())
}

fn handle_delete(workshop: &mut Db, cmd: &DeleteCommand) -> CliResult {
    let id = normalize_token(&cmd.id);
    let name = workshop
        .find(&id)
        .map(|p| p.name.clone())
        .ok_or_else(|| Error::not_found(&id))?;

    if !cmd.yes && !confirm(&format!("Delete {name} ({id}) and their attendance?"))? {
        println!("Cancelled.");
        return Ok(());
    }

    workshop.delete(&id)?;
    println!("Deleted {name} ({id})");
    Ok(())
}

fn handle_mark(workshop: &mut Db, cmd: &AttendanceCommand) -> CliResult {
    check_session(workshop, &cmd.session)?;
    let result = workshop.record_scan(&cmd.id, &cmd.session)?;
    let id = normalize_token(&cmd.id);
    let name = workshop.find(&id).map_or("", |p| p.name.as_str());

    match result {
        AttendanceResult::Marked => println!("{name} marked present for {}", cmd.session),
        AttendanceResult::AlreadyMarked => println!("Already marked for this session"),
    }
    Ok(())
}

fn handle_unmark(workshop: &mut Db, cmd: &AttendanceCommand) -> CliResult {
    check_session(workshop, &cmd.session)?;
    let id = normalize_token(&cmd.id);
    if workshop.unmark_attendance(&id, &cmd.session)? {
        println!("Removed {} from {id}", cmd.session);
    } else {
        println!("{id} was not marked for {}", cmd.session);
    }
    Ok(())
}

fn handle_scan(workshop: &mut Db, cmd: &ScanCommand) -> CliResult {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let mut session = ScanSession::new(workshop, &cmd.session)?;
    let mut scanner = LineScanner::stdin();
    let json = cmd.json;

    if !json {
        eprintln!(
            "Scanning for {}. One id per line, end with Ctrl-D.",
            cmd.session
        );
    }

    let summary = runtime.block_on(run_scan(&mut scanner, &mut session, |outcome| {
        if json {
            match serde_json::to_string(outcome) {
                Ok(line) => println!("{line}"),
                Err(e) => eprintln!("Failed to encode scan result: {e}"),
            }
        } else {
            println!("{outcome}");
        }
    }))?;

    if !json {
        println!(
            "Marked {}, already marked {}, rejected {}",
            summary.marked, summary.already_marked, summary.rejected
        );
    }
    Ok(())
}

fn handle_stats(workshop: &Db, json: bool) -> CliResult {
    let stats = workshop.stats();
    let totals = workshop.session_totals();

    if json {
        let sessions: serde_json::Map<String, serde_json::Value> = totals
            .iter()
            .map(|(session, count)| ((*session).to_string(), serde_json::Value::from(*count)))
            .collect();
        let value = serde_json::json!({
            "totalParticipants": stats.total_participants,
            "totalAttendedAtLeastOnce": stats.total_attended_at_least_once,
            "sessions": sessions,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{}", workshop.config().name);
        println!("Registered:        {}", stats.total_participants);
        println!("Attended (any):    {}", stats.total_attended_at_least_once);
        println!();
        let width = totals.iter().map(|(s, _)| s.len()).max().unwrap_or(0);
        for (session, count) in totals {
            println!("  {session:width$}  {count}");
        }
    }
    Ok(())
}

fn handle_sheet(config: &Config, workshop: &Db, cmd: &SheetCommand) -> CliResult {
    if cmd.csv {
        if workshop.state().is_empty() {
            println!("No participants to export.");
            return Ok(());
        }
        let name = csv_file_name(Local::now().date_naive());
        if let Some(path) = write_output(cmd.output.as_deref(), config, &name, &workshop.csv())? {
            println!("Wrote {}", path.display());
        }
        return Ok(());
    }

    let grid = workshop.grid();
    if grid.is_empty() {
        println!("No participants registered.");
        return Ok(());
    }

    let sessions = workshop.sessions();
    let id_width = grid.iter().map(|r| r.participant.id.len()).max().unwrap_or(2);
    let name_width = grid
        .iter()
        .map(|r| r.participant.name.chars().count())
        .max()
        .unwrap_or(4);

    print!("{:id_width$}  {:name_width$}", "ID", "NAME");
    for session in sessions {
        print!("  {session}");
    }
    println!("  TOTAL");

    for row in &grid {
        print!(
            "{:id_width$}  {:name_width$}",
            row.participant.id, row.participant.name
        );
        for (session, present) in sessions.iter().zip(&row.per_session) {
            let mark = if *present { "x" } else { "-" };
            print!("  {mark:^width$}", width = session.len());
        }
        println!("  {}", row.total_attended);
    }
    Ok(())
}

fn handle_card(workshop: &Db, cmd: &ShowCommand) -> CliResult {
    let id = normalize_token(&cmd.id);
    let participant = workshop.find(&id).ok_or_else(|| Error::not_found(&id))?;
    let card = CredentialPayload::new(participant, workshop.config());

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&card)?);
    } else {
        println!("{}", card.workshop);
        println!("{}", card.venue);
        println!("{}", card.dates);
        println!();
        println!("  {}", card.name);
        println!("  {}", card.id);
        println!();
        println!("Code text:  {}", card.qr_text);
        println!("Image file: {}", card.file_name);
    }
    Ok(())
}

fn handle_backup(config: &Config, workshop: &mut Db, cmd: BackupCommand) -> CliResult {
    match cmd {
        BackupCommand::Export { output } => {
            let json = workshop.export_backup()?.to_pretty_json()?;
            let name = backup_file_name(Local::now().date_naive());
            if let Some(path) = write_output(output.as_deref(), config, &name, &json)? {
                println!(
                    "Backed up {} participants to {}",
                    workshop.state().len(),
                    path.display()
                );
            }
        }
        BackupCommand::Import { file, yes } => {
            let raw = std::fs::read_to_string(&file)?;
            let state = import_backup(&raw).map_err(Error::from)?;
            let incoming = state.len();
            if !yes
                && !confirm(&format!(
                    "Import {incoming} participants from {}? This replaces all {} current participants.",
                    file.display(),
                    workshop.state().len()
                ))?
            {
                println!("Cancelled.");
                return Ok(());
            }

            workshop.replace_state(state)?;
            println!("Restored {incoming} participants from {}", file.display());
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> CliResult {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Workshop]");
                println!("  Name:               {}", config.workshop.name);
                println!("  Venue:              {}", config.workshop.venue);
                println!("  Dates:              {}", config.workshop.dates);
                println!(
                    "  Id format:          {}",
                    config.allocator()?.format_id(1)
                );
                println!(
                    "  Sessions:           {}",
                    config.workshop.sessions.join(", ")
                );
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  Key:                {}", config.storage.key);
                println!();
                println!("[Export]");
                println!("  Output directory:   {}", config.output_dir().display());
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            Config::load_from(Some(path))?;
            println!("Configuration is valid.");
        }
    }
    Ok(())
}

fn check_session(workshop: &Db, session: &str) -> Result<(), Error> {
    if workshop.config().is_known_session(session) {
        Ok(())
    } else {
        Err(Error::validation(
            "session",
            format!(
                "unknown session {session:?}; expected one of {}",
                workshop.sessions().join(", ")
            ),
        ))
    }
}

/// Write `contents` to the requested target.
///
/// `-` means stdout; a directory gets `default_name` inside it; no target
/// means `default_name` in the configured export directory. Returns the
/// file written, if any.
fn write_output(
    target: Option<&Path>,
    config: &Config,
    default_name: &str,
    contents: &str,
) -> Result<Option<PathBuf>, Error> {
    let path = match target {
        Some(p) if p == Path::new("-") => {
            print!("{contents}");
            io::stdout().flush()?;
            return Ok(None);
        }
        Some(p) if p.is_dir() => p.join(default_name),
        Some(p) => p.to_path_buf(),
        None => config.output_dir().join(default_name),
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    std::fs::write(&path, contents)?;
    Ok(Some(path))
}

fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
