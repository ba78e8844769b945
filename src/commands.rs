//! Non-interactive subcommands for scripting against the same state file

use std::io::Write;

use clap::{Subcommand, ValueEnum};
use serde::Serialize;

use crate::clock::Clock;
use crate::error::CommandError;
use crate::session::{local_datetime, SessionId};
use crate::storage::KeyValueStore;
use crate::tracker::Tracker;

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// print whether the timer runs and for how long
    Status {
        #[clap(long)]
        json: bool,
    },
    /// start the timer (no-op when already running)
    Start,
    /// stop the timer and record the session
    Stop,
    /// list recorded sessions, newest first
    History {
        #[clap(long, value_enum, default_value_t = HistoryFormat::Table)]
        format: HistoryFormat,
    },
    /// delete one session by id
    Remove { id: SessionId },
    /// delete every recorded session
    Clear,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum HistoryFormat {
    Table,
    Json,
    Csv,
}

#[derive(Serialize)]
struct StatusReport {
    running: bool,
    started_at: Option<u64>,
    elapsed_ms: u64,
    display: String,
    hours_decimal: String,
}

/// Run `command` against `tracker`, writing human-readable output to `out`.
/// Storage failures that the interactive UI would only warn about are errors here.
pub fn run<S, C, W>(tracker: &mut Tracker<S, C>, command: &Command, out: &mut W) -> Result<(), CommandError>
where
    S: KeyValueStore,
    C: Clock,
    W: Write,
{
    match command {
        Command::Status { json } => print_status(tracker, *json, out)?,
        Command::Start => {
            if tracker.start() {
                writeln!(out, "started")?;
            } else {
                writeln!(out, "already running ({})", tracker.elapsed().display)?;
            }
        }
        Command::Stop => match tracker.stop() {
            Some(session) => writeln!(
                out,
                "stopped {} ({} h) id={}",
                session.duration_display, session.duration_hours, session.id
            )?,
            None => writeln!(out, "not running")?,
        },
        Command::History { format } => print_history(tracker, *format, out)?,
        Command::Remove { id } => {
            if !tracker.remove(*id) {
                return Err(CommandError::UnknownSession(*id));
            }
            writeln!(out, "removed {id}")?;
        }
        Command::Clear => {
            let count = tracker.history().len();
            tracker.clear();
            writeln!(out, "cleared {count} sessions")?;
        }
    }

    match tracker.take_warning() {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

fn print_status<S: KeyValueStore, C: Clock, W: Write>(
    tracker: &Tracker<S, C>,
    json: bool,
    out: &mut W,
) -> Result<(), CommandError> {
    let engine = tracker.engine();
    let elapsed = engine.elapsed();
    let report = StatusReport {
        running: engine.is_running(),
        started_at: engine.started_at_ms(),
        elapsed_ms: engine.elapsed_ms(),
        display: elapsed.display,
        hours_decimal: elapsed.hours_decimal,
    };

    if json {
        serde_json::to_writer(&mut *out, &report)?;
        writeln!(out)?;
        return Ok(());
    }

    match report.started_at.and_then(local_datetime) {
        Some(since) => writeln!(
            out,
            "running {} ({} h) since {}",
            report.display,
            report.hours_decimal,
            since.format("%Y-%m-%d %H:%M:%S")
        )?,
        None => writeln!(out, "idle")?,
    }
    Ok(())
}

fn print_history<S: KeyValueStore, C: Clock, W: Write>(
    tracker: &Tracker<S, C>,
    format: HistoryFormat,
    out: &mut W,
) -> Result<(), CommandError> {
    let history = tracker.history();
    match format {
        HistoryFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, history.sessions())?;
            writeln!(out)?;
        }
        HistoryFormat::Csv => {
            let mut writer = csv::Writer::from_writer(&mut *out);
            for session in history.sessions() {
                writer.serialize(session)?;
            }
            writer.flush()?;
        }
        HistoryFormat::Table => {
            if history.is_empty() {
                writeln!(out, "No sessions yet")?;
                return Ok(());
            }
            for session in history.sessions() {
                let started = session
                    .started_at_local()
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                writeln!(
                    out,
                    "{:<16} {:<18} {:>10} {:>8}",
                    session.id, started, session.duration_display, session.duration_hours
                )?;
            }
            writeln!(out, "total {} h", history.total_hours())?;
        }
    }
    Ok(())
}
