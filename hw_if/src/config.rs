//! # Hardware Configuration
//!
//! Lists the actuators a hardware runtime provides, usually loaded from `hardware.toml`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::actuator::ActuatorKind;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct HardwareConfig {
    /// Names of the DC motors
    #[serde(default)]
    pub motors: Vec<String>,

    /// Names of the positional servos
    #[serde(default)]
    pub servos: Vec<String>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Actuator name \"{0}\" is used more than once")]
    DuplicateName(String),

    #[error("Actuator names must not be empty")]
    EmptyName,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl HardwareConfig {
    /// Check that every actuator has a unique, non-empty name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();

        for name in self.motors.iter().chain(self.servos.iter()) {
            if name.is_empty() {
                return Err(ConfigError::EmptyName);
            }
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::DuplicateName(name.clone()));
            }
        }

        Ok(())
    }

    /// The kind of the actuator with the given name, if it is configured.
    pub fn kind_of(&self, name: &str) -> Option<ActuatorKind> {
        if self.motors.iter().any(|m| m == name) {
            Some(ActuatorKind::Motor)
        } else if self.servos.iter().any(|s| s == name) {
            Some(ActuatorKind::Servo)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_and_validate() {
        let config: HardwareConfig = toml::from_str(
            r#"
            motors = ["mRight", "mLeft"]
            servos = ["lservo"]
            "#,
        )
        .unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.kind_of("mLeft"), Some(ActuatorKind::Motor));
        assert_eq!(config.kind_of("lservo"), Some(ActuatorKind::Servo));
        assert_eq!(config.kind_of("mMid"), None);
    }

    #[test]
    fn test_shipped_config() {
        let config: HardwareConfig =
            toml::from_str(include_str!("../../params/hardware.toml")).unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.motors.len(), 5);
        assert_eq!(config.kind_of("tapeServo"), Some(ActuatorKind::Servo));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let config = HardwareConfig {
            motors: vec![String::from("mRight")],
            servos: vec![String::from("mRight")],
        };

        assert_eq!(
            config.validate(),
            Err(ConfigError::DuplicateName(String::from("mRight")))
        );
    }
}
