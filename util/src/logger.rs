//! Logging set up for executables
//!
//! Every line is prefixed with the seconds elapsed since the session started and a short level
//! tag. Debug and trace lines also name the module they come from.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use log::{info, Level, Record};
use std::fmt::Arguments;
use thiserror::Error;

// Internal imports
use crate::session::{self, Session};

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Log level must be at least `INFO` so phases are recorded, found `{0}`")]
    LevelTooQuiet(LevelFilter),

    #[error("Cannot open the session log file: {0}")]
    LogFile(std::io::Error),

    #[error("A logger is already installed: {0}")]
    AlreadyInstalled(log::SetLoggerError),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Send log records to stdout and to the session's log file.
///
/// Can only succeed once per process.
pub fn logger_init(min_level: LevelFilter, session: &Session) -> Result<(), LoggerInitError> {
    if min_level < Level::Info {
        return Err(LoggerInitError::LevelTooQuiet(min_level));
    }

    let log_file = fern::log_file(&session.log_file_path).map_err(LoggerInitError::LogFile)?;

    fern::Dispatch::new()
        .format(|out, message, record| out.finish(format_args!("{}", Line(message, record))))
        .level(min_level)
        .chain(std::io::stdout())
        .chain(log_file)
        .apply()
        .map_err(LoggerInitError::AlreadyInstalled)?;

    info!(
        "Logging at {:?} to {:?} (session epoch {})",
        min_level,
        session.log_file_path,
        session::get_epoch()
            .map(|e| e.to_rfc3339())
            .unwrap_or_default()
    );

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE ITEMS
// ---------------------------------------------------------------------------

/// A formatted log line.
struct Line<'a, 'b>(&'a Arguments<'b>, &'a Record<'b>);

impl std::fmt::Display for Line<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Line(message, record) = self;

        write!(
            f,
            "[{:10.3} {}] ",
            session::get_elapsed_seconds(),
            tag(record.level())
        )?;

        if record.level() > Level::Info {
            write!(f, "{}: ", record.target())?;
        }

        write!(f, "{}", message)
    }
}

fn tag(level: Level) -> ColoredString {
    match level {
        Level::Trace => "TRC".dimmed(),
        Level::Debug => "DBG".cyan(),
        Level::Info => "INF".green(),
        Level::Warn => "WRN".yellow().bold(),
        Level::Error => "ERR".red().bold(),
    }
}
