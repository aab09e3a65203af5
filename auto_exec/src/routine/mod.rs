//! # Routines
//!
//! A routine is one autonomous behaviour of the robot. The host builds a [`RoutineContext`] and
//! calls [`Routine::run`] once. The routine resolves the actuators it needs, commands them and
//! returns when it is done.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod actuators;
mod timed_action;
mod timed_sequence;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use hw_if::{ActuatorError, ResolutionError};
use serde::Serialize;

use crate::context::RoutineContext;

pub use actuators::*;
pub use timed_action::*;
pub use timed_sequence::*;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A unit of autonomous behaviour.
pub trait Routine {
    /// Name of the routine, used in logs and reports.
    fn name(&self) -> &str;

    /// Run the routine to completion.
    ///
    /// Errors are not retried, they end the routine and are returned to the host.
    fn run(&mut self, ctx: &RoutineContext) -> Result<RoutineReport, RoutineError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Summary of a routine execution.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RoutineReport {
    /// Name of the routine
    pub routine: String,

    /// Clock time at which the routine was started
    pub start_ms: u64,

    /// Clock time at which the routine ended
    pub end_ms: u64,

    /// Reports of the actions that were executed, in order
    pub actions: Vec<ActionReport>,

    /// True if the routine ended because a stop was requested
    pub stopped: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Possible errors that can occur while running a routine.
#[derive(Debug, thiserror::Error)]
pub enum RoutineError {
    #[error("Could not resolve an actuator: {0}")]
    Resolution(ResolutionError),

    #[error("Actuator command failed: {0}")]
    Actuator(ActuatorError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl From<ResolutionError> for RoutineError {
    fn from(e: ResolutionError) -> Self {
        RoutineError::Resolution(e)
    }
}

impl From<ActuatorError> for RoutineError {
    fn from(e: ActuatorError) -> Self {
        RoutineError::Actuator(e)
    }
}
