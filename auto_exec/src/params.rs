//! # Autonomous Executable Parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

use crate::{context::DEFAULT_POLL_PERIOD_MS, routine::TimedSequenceParams};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AutoExecParams {
    /// Period between two samples of the clock while an action is held.
    ///
    /// Units: milliseconds
    pub poll_period_ms: u64,

    /// Parameters of the routine to run, the drive-to-button plan if the file has no `[routine]`
    pub routine: TimedSequenceParams,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for AutoExecParams {
    fn default() -> Self {
        Self {
            poll_period_ms: DEFAULT_POLL_PERIOD_MS,
            routine: TimedSequenceParams::default(),
        }
    }
}
