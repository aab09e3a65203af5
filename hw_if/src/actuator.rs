//! # Actuators
//!
//! Motors and servos are owned by the hardware runtime. Routines only ever see them through the
//! [`Motor`] and [`Servo`] traits, as boxed handles given out by a
//! [`HardwareMap`](crate::HardwareMap).

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Lowest power a motor accepts
pub const MIN_POWER: f64 = -1.0;

/// Highest power a motor accepts
pub const MAX_POWER: f64 = 1.0;

/// Lowest position a servo accepts
pub const MIN_POSITION: f64 = 0.0;

/// Highest position a servo accepts
pub const MAX_POSITION: f64 = 1.0;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A DC motor driven by a normalised power.
pub trait Motor {
    /// Name of the motor in the hardware configuration.
    fn name(&self) -> &str;

    /// Set the power of the motor.
    ///
    /// ## Arguments
    /// - `power` - Normalised power between -1.0 and 1.0, the sign being interpreted according to
    ///   the motor's direction. Values outside this range are rejected.
    fn set_power(&mut self, power: f64) -> Result<(), ActuatorError>;

    /// The last power commanded to the motor.
    fn power(&self) -> f64;

    /// Set the direction (polarity) of the motor.
    ///
    /// Setting the direction the motor already has is not an error and changes nothing.
    fn set_direction(&mut self, direction: Direction) -> Result<(), ActuatorError>;

    /// The current direction of the motor.
    fn direction(&self) -> Direction;
}

/// A positional servo.
pub trait Servo {
    /// Name of the servo in the hardware configuration.
    fn name(&self) -> &str;

    /// Set the position of the servo.
    ///
    /// ## Arguments
    /// - `position` - Normalised position between 0.0 and 1.0. Values outside this range are
    ///   rejected.
    fn set_position(&mut self, position: f64) -> Result<(), ActuatorError>;

    /// The last position commanded to the servo, `None` until the servo has been commanded.
    fn position(&self) -> Option<f64>;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Polarity of a motor.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Reverse,
}

/// The kinds of actuator a hardware map can hold.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ActuatorKind {
    Motor,
    Servo,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ActuatorError {
    #[error("Power of {power} for motor \"{name}\" must be between -1.0 and 1.0")]
    PowerOutOfRange { name: String, power: f64 },

    #[error("Position of {position} for servo \"{name}\" must be between 0.0 and 1.0")]
    PositionOutOfRange { name: String, position: f64 },

    #[error("The hardware runtime backing \"{0}\" is no longer available")]
    RuntimeUnavailable(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Direction {
    /// Sign applied to commanded power when it reaches the motor.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Forward => 1.0,
            Direction::Reverse => -1.0,
        }
    }
}

impl Default for Direction {
    fn default() -> Self {
        Direction::Forward
    }
}

impl fmt::Display for ActuatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActuatorKind::Motor => write!(f, "motor"),
            ActuatorKind::Servo => write!(f, "servo"),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Check a power demand against the motor limits.
pub fn check_power(name: &str, power: f64) -> Result<(), ActuatorError> {
    // NaN is out of range
    if (MIN_POWER..=MAX_POWER).contains(&power) {
        Ok(())
    } else {
        Err(ActuatorError::PowerOutOfRange {
            name: name.to_string(),
            power,
        })
    }
}

/// Check a position demand against the servo limits.
pub fn check_position(name: &str, position: f64) -> Result<(), ActuatorError> {
    if (MIN_POSITION..=MAX_POSITION).contains(&position) {
        Ok(())
    } else {
        Err(ActuatorError::PositionOutOfRange {
            name: name.to_string(),
            position,
        })
    }
}
