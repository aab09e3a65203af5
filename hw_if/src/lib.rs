//! # Hardware interface crate.
//!
//! Provides the actuator abstractions the routines command, the hardware map through which
//! routines resolve named actuators, and a simulated hardware runtime.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Motor and servo traits and the commands they accept
pub mod actuator;

/// Configuration of the actuators present on the robot
pub mod config;

/// Named actuator resolution
pub mod hardware_map;

/// Simulated hardware runtime
pub mod sim;

// ------------------------------------------------------------------------------------------------
// REEXPORTS
// ------------------------------------------------------------------------------------------------

pub use actuator::{ActuatorError, ActuatorKind, Direction, Motor, Servo};
pub use config::{ConfigError, HardwareConfig};
pub use hardware_map::{HardwareMap, ResolutionError};
