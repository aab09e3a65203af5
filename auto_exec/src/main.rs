//! # Autonomous Routine Executable
//!
//! Runs the timed sequence routine once against the simulated hardware runtime, then archives the
//! commands the hardware received and the routine report in the session directory.
//!
//! # Usage
//!
//! ```text
//! auto_exec [--params auto_exec.toml] [--hardware hardware.toml] [--log-level info]
//!           [--stop-after-ms 1500]
//! ```
//!
//! Parameter files are looked up in `$AUTO_SW_ROOT/params` unless given as a path to an existing
//! file. With `--stop-after-ms` a stop is requested once that much time has passed since the
//! routine started, ending the running action early.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Result};
use log::{info, warn};
use std::{path::Path, sync::Arc, thread, time::Duration};
use structopt::StructOpt;

// Internal
use auto_lib::{
    context::{RoutineContext, StopSignal},
    params::AutoExecParams,
    routine::{Routine, TimedSequence},
};
use hw_if::{sim::SimHardwareMap, HardwareConfig};
use util::{
    archive::Archiver,
    logger::{logger_init, LevelFilter},
    params,
    session::Session,
    time::SystemClock,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "auto_exec", about = "Run the autonomous timed sequence routine")]
struct Opts {
    /// Routine parameter file
    #[structopt(long, default_value = "auto_exec.toml")]
    params: String,

    /// Hardware configuration file
    #[structopt(long, default_value = "hardware.toml")]
    hardware: String,

    /// Minimum log level (info, debug or trace)
    #[structopt(long, default_value = "trace")]
    log_level: LevelFilter,

    /// Request a stop after this many milliseconds
    #[structopt(long)]
    stop_after_ms: Option<u64>,
}

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    color_eyre::install()?;

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("auto_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(opts.log_level, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Autonomous Routine Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: AutoExecParams =
        load_params(&opts.params).wrap_err("Could not load routine params")?;
    exec_params
        .routine
        .validate()
        .wrap_err("Routine params are invalid")?;

    let hw_config: HardwareConfig =
        load_params(&opts.hardware).wrap_err("Could not load hardware config")?;

    info!("Parameters loaded");

    // ---- HARDWARE INITIALISATION ----

    let clock = SystemClock::new();
    let hardware = SimHardwareMap::new(&hw_config, Arc::new(clock))
        .wrap_err("Failed to initialise the hardware")?;

    info!("Hardware initialised");

    // ---- RUN ----

    let stop = StopSignal::new();

    if let Some(stop_after_ms) = opts.stop_after_ms {
        let bg_stop = stop.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(stop_after_ms));
            warn!("Stop requested after {} ms", stop_after_ms);
            bg_stop.request();
        });
    }

    let ctx = RoutineContext::new(&hardware, &clock, stop)
        .with_poll_period(Duration::from_millis(exec_params.poll_period_ms));

    let mut routine = TimedSequence::new(exec_params.routine);

    info!("Initialisation complete, running \"{}\"", routine.name());

    let result = routine.run(&ctx);

    // ---- ARCHIVE ----

    // Archive before checking the result so failed runs keep their command log
    archive_commands(&session, &hardware).wrap_err("Failed to archive actuator commands")?;

    let report = result.wrap_err("Routine failed")?;

    if report.stopped {
        warn!("Routine was stopped before completing");
    }

    session
        .save("auto_report.json", &report)
        .wrap_err("Failed to save the routine report")?;

    session.exit();

    Ok(())
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Load a parameter file, either from an explicit path or from the params directory.
fn load_params<P: serde::de::DeserializeOwned>(file: &str) -> Result<P, params::LoadError> {
    if Path::new(file).is_file() {
        params::load_from_path(file)
    } else {
        params::load(file)
    }
}

/// Write every command received by the hardware into the session archive.
fn archive_commands(session: &Session, hardware: &SimHardwareMap) -> Result<()> {
    let mut archiver = Archiver::from_path(session, "actuator_commands.csv")?;

    let log = hardware.command_log();
    for record in log.iter() {
        archiver.serialise(record.to_row())?;
    }

    info!("Archived {} actuator commands", log.len());

    Ok(())
}
