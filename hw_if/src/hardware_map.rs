//! # Hardware Map
//!
//! The capability through which a routine turns actuator names from the hardware configuration
//! into handles it can command.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use crate::actuator::{ActuatorKind, Motor, Servo};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Resolves named actuators into handles.
///
/// The hardware runtime keeps ownership of the devices. Handles returned by the map share the
/// device state with the runtime, so commands made through one handle are visible through any
/// other handle to the same actuator.
pub trait HardwareMap {
    /// Resolve the motor with the given name.
    fn motor(&self, name: &str) -> Result<Box<dyn Motor>, ResolutionError>;

    /// Resolve the servo with the given name.
    fn servo(&self, name: &str) -> Result<Box<dyn Servo>, ResolutionError>;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors raised while resolving a named actuator.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ResolutionError {
    #[error("No {kind} named \"{name}\" in the hardware configuration")]
    NotFound { name: String, kind: ActuatorKind },

    #[error("\"{name}\" is configured as a {found}, not a {expected}")]
    WrongKind {
        name: String,
        expected: ActuatorKind,
        found: ActuatorKind,
    },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ResolutionError {
    /// Name of the actuator which could not be resolved.
    pub fn name(&self) -> &str {
        match self {
            ResolutionError::NotFound { name, .. } => name,
            ResolutionError::WrongKind { name, .. } => name,
        }
    }
}
