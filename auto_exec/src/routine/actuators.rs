//! Set of resolved actuator handles used by a routine

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use hw_if::{HardwareMap, Motor, ResolutionError, Servo};
use log::debug;
use std::collections::BTreeMap;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Handles resolved from a [`HardwareMap`], looked up by name.
#[derive(Default)]
pub struct Actuators {
    motors: BTreeMap<String, Box<dyn Motor>>,
    servos: BTreeMap<String, Box<dyn Servo>>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Actuators {
    /// Resolve every named motor and servo.
    ///
    /// Names are resolved in order, motors first, and the first failure is returned. Names given
    /// more than once are only resolved once.
    pub fn resolve<M, S>(
        hardware: &dyn HardwareMap,
        motor_names: M,
        servo_names: S,
    ) -> Result<Self, ResolutionError>
    where
        M: IntoIterator,
        M::Item: AsRef<str>,
        S: IntoIterator,
        S::Item: AsRef<str>,
    {
        let mut actuators = Self::default();

        for name in motor_names {
            let name = name.as_ref();
            if !actuators.motors.contains_key(name) {
                let motor = hardware.motor(name)?;
                debug!("Motor \"{}\" resolved", name);
                actuators.motors.insert(name.to_string(), motor);
            }
        }

        for name in servo_names {
            let name = name.as_ref();
            if !actuators.servos.contains_key(name) {
                let servo = hardware.servo(name)?;
                debug!("Servo \"{}\" resolved", name);
                actuators.servos.insert(name.to_string(), servo);
            }
        }

        Ok(actuators)
    }

    pub fn motor_mut(&mut self, name: &str) -> Option<&mut Box<dyn Motor>> {
        self.motors.get_mut(name)
    }

    pub fn servo_mut(&mut self, name: &str) -> Option<&mut Box<dyn Servo>> {
        self.servos.get_mut(name)
    }

    pub fn num_motors(&self) -> usize {
        self.motors.len()
    }

    pub fn num_servos(&self) -> usize {
        self.servos.len()
    }
}
