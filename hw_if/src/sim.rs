//! # Simulated Hardware Runtime
//!
//! [`SimHardwareMap`] stands in for the robot controller's hardware runtime. It holds the state of
//! every configured actuator and records each command it receives, stamped with the time of the
//! clock it was built with. Tests drive it with a [`SimClock`](util::time::SimClock) and then
//! inspect the state and the command log.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, trace};
use serde::Serialize;
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use util::time::Clock;

use crate::{
    actuator::{check_position, check_power, ActuatorError, ActuatorKind, Direction, Motor, Servo},
    config::{ConfigError, HardwareConfig},
    hardware_map::{HardwareMap, ResolutionError},
};

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// Clock shared between the map and the handles it gives out.
pub type SharedClock = Arc<dyn Clock + Send + Sync>;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Simulated hardware runtime.
#[derive(Clone)]
pub struct SimHardwareMap {
    config: HardwareConfig,
    state: Arc<Mutex<SimState>>,
    clock: SharedClock,
}

/// A command received by the simulated runtime.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CommandRecord {
    /// Clock time at which the command was received
    pub time_ms: u64,

    /// Name of the commanded actuator
    pub actuator: String,

    pub command: Command,
}

/// Flat form of a [`CommandRecord`] for CSV archives.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CommandRow<'a> {
    pub time_ms: u64,
    pub actuator: &'a str,
    pub command: &'static str,
    pub value: f64,
}

#[derive(Debug, Clone, Copy)]
struct MotorState {
    power: f64,
    direction: Direction,
}

#[derive(Debug, Default)]
struct SimState {
    motors: BTreeMap<String, MotorState>,
    servos: BTreeMap<String, Option<f64>>,
    log: Vec<CommandRecord>,
}

/// Handle to a simulated motor.
struct SimMotor {
    name: String,
    state: Arc<Mutex<SimState>>,
    clock: SharedClock,
}

/// Handle to a simulated servo.
struct SimServo {
    name: String,
    state: Arc<Mutex<SimState>>,
    clock: SharedClock,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub enum Command {
    SetPower(f64),
    SetDirection(Direction),
    SetPosition(f64),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimHardwareMap {
    /// Create a new simulated runtime holding the actuators in `config`.
    ///
    /// Motors start stopped and facing forwards, servos start with no position.
    pub fn new(config: &HardwareConfig, clock: SharedClock) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut state = SimState::default();

        for name in config.motors.iter() {
            state.motors.insert(
                name.clone(),
                MotorState {
                    power: 0.0,
                    direction: Direction::Forward,
                },
            );
        }

        for name in config.servos.iter() {
            state.servos.insert(name.clone(), None);
        }

        debug!(
            "Simulated hardware created with {} motors and {} servos",
            state.motors.len(),
            state.servos.len()
        );

        Ok(Self {
            config: config.clone(),
            state: Arc::new(Mutex::new(state)),
            clock,
        })
    }

    /// Current power of a motor, `None` if there is no such motor.
    pub fn motor_power(&self, name: &str) -> Option<f64> {
        lock(&self.state).motors.get(name).map(|m| m.power)
    }

    /// Current direction of a motor, `None` if there is no such motor.
    pub fn motor_direction(&self, name: &str) -> Option<Direction> {
        lock(&self.state).motors.get(name).map(|m| m.direction)
    }

    /// Current position of a servo, `None` if there is no such servo or it was never commanded.
    pub fn servo_position(&self, name: &str) -> Option<f64> {
        lock(&self.state).servos.get(name).copied().flatten()
    }

    /// Copy of every command received so far, in the order received.
    pub fn command_log(&self) -> Vec<CommandRecord> {
        lock(&self.state).log.clone()
    }

    /// Commands received for a single actuator.
    pub fn commands_for(&self, name: &str) -> Vec<CommandRecord> {
        lock(&self.state)
            .log
            .iter()
            .filter(|r| r.actuator == name)
            .cloned()
            .collect()
    }

    fn resolve(&self, name: &str, expected: ActuatorKind) -> Result<(), ResolutionError> {
        match self.config.kind_of(name) {
            Some(k) if k == expected => {
                trace!("Resolved {} \"{}\"", expected, name);
                Ok(())
            }
            Some(found) => Err(ResolutionError::WrongKind {
                name: name.to_string(),
                expected,
                found,
            }),
            None => Err(ResolutionError::NotFound {
                name: name.to_string(),
                kind: expected,
            }),
        }
    }
}

impl HardwareMap for SimHardwareMap {
    fn motor(&self, name: &str) -> Result<Box<dyn Motor>, ResolutionError> {
        self.resolve(name, ActuatorKind::Motor)?;

        Ok(Box::new(SimMotor {
            name: name.to_string(),
            state: self.state.clone(),
            clock: self.clock.clone(),
        }))
    }

    fn servo(&self, name: &str) -> Result<Box<dyn Servo>, ResolutionError> {
        self.resolve(name, ActuatorKind::Servo)?;

        Ok(Box::new(SimServo {
            name: name.to_string(),
            state: self.state.clone(),
            clock: self.clock.clone(),
        }))
    }
}

impl Motor for SimMotor {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_power(&mut self, power: f64) -> Result<(), ActuatorError> {
        check_power(&self.name, power)?;

        let time_ms = self.clock.now_ms();
        let mut state = try_lock(&self.state, &self.name)?;

        match state.motors.get_mut(&self.name) {
            Some(m) => m.power = power,
            None => return Err(ActuatorError::RuntimeUnavailable(self.name.clone())),
        }
        state.record(time_ms, &self.name, Command::SetPower(power));

        Ok(())
    }

    fn power(&self) -> f64 {
        lock(&self.state)
            .motors
            .get(&self.name)
            .map(|m| m.power)
            .unwrap_or(0.0)
    }

    fn set_direction(&mut self, direction: Direction) -> Result<(), ActuatorError> {
        let time_ms = self.clock.now_ms();
        let mut state = try_lock(&self.state, &self.name)?;

        match state.motors.get_mut(&self.name) {
            Some(m) => m.direction = direction,
            None => return Err(ActuatorError::RuntimeUnavailable(self.name.clone())),
        }
        state.record(time_ms, &self.name, Command::SetDirection(direction));

        Ok(())
    }

    fn direction(&self) -> Direction {
        lock(&self.state)
            .motors
            .get(&self.name)
            .map(|m| m.direction)
            .unwrap_or_default()
    }
}

impl Servo for SimServo {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_position(&mut self, position: f64) -> Result<(), ActuatorError> {
        check_position(&self.name, position)?;

        let time_ms = self.clock.now_ms();
        let mut state = try_lock(&self.state, &self.name)?;

        match state.servos.get_mut(&self.name) {
            Some(p) => *p = Some(position),
            None => return Err(ActuatorError::RuntimeUnavailable(self.name.clone())),
        }
        state.record(time_ms, &self.name, Command::SetPosition(position));

        Ok(())
    }

    fn position(&self) -> Option<f64> {
        lock(&self.state).servos.get(&self.name).copied().flatten()
    }
}

impl SimState {
    fn record(&mut self, time_ms: u64, actuator: &str, command: Command) {
        trace!("[{} ms] {} <- {:?}", time_ms, actuator, command);

        self.log.push(CommandRecord {
            time_ms,
            actuator: actuator.to_string(),
            command,
        });
    }
}

impl CommandRecord {
    /// Flatten the record into a row for CSV archiving.
    pub fn to_row(&self) -> CommandRow<'_> {
        let (command, value) = match self.command {
            Command::SetPower(p) => ("set_power", p),
            Command::SetDirection(d) => ("set_direction", d.sign()),
            Command::SetPosition(p) => ("set_position", p),
        };

        CommandRow {
            time_ms: self.time_ms,
            actuator: &self.actuator,
            command,
            value,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Lock the state for reading. A poisoned lock still holds valid actuator values.
fn lock(state: &Mutex<SimState>) -> MutexGuard<'_, SimState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Lock the state for commanding an actuator.
fn try_lock<'a>(
    state: &'a Mutex<SimState>,
    name: &str,
) -> Result<MutexGuard<'a, SimState>, ActuatorError> {
    state
        .lock()
        .map_err(|_| ActuatorError::RuntimeUnavailable(name.to_string()))
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use util::time::SimClock;

    fn sim(clock: &SimClock) -> SimHardwareMap {
        let config = HardwareConfig {
            motors: vec![String::from("mRight"), String::from("mLeft")],
            servos: vec![String::from("lservo")],
        };
        SimHardwareMap::new(&config, Arc::new(clock.clone())).unwrap()
    }

    #[test]
    fn test_resolve() {
        let clock = SimClock::default();
        let hw = sim(&clock);

        assert!(hw.motor("mRight").is_ok());
        assert!(hw.servo("lservo").is_ok());

        assert_eq!(
            hw.motor("mMid").err(),
            Some(ResolutionError::NotFound {
                name: String::from("mMid"),
                kind: ActuatorKind::Motor
            })
        );
        assert_eq!(
            hw.servo("mLeft").err(),
            Some(ResolutionError::WrongKind {
                name: String::from("mLeft"),
                expected: ActuatorKind::Servo,
                found: ActuatorKind::Motor
            })
        );

        // Failed lookups don't command anything
        assert!(hw.command_log().is_empty());
    }

    #[test]
    fn test_handles_share_state() {
        let clock = SimClock::starting_at(10);
        let hw = sim(&clock);

        let mut right = hw.motor("mRight").unwrap();
        let other = hw.motor("mRight").unwrap();

        right.set_power(0.9).unwrap();
        assert_eq!(other.power(), 0.9);
        assert_eq!(hw.motor_power("mRight"), Some(0.9));

        clock.advance(5);
        right.set_direction(Direction::Reverse).unwrap();
        assert_eq!(other.direction(), Direction::Reverse);

        assert_eq!(
            hw.command_log(),
            vec![
                CommandRecord {
                    time_ms: 10,
                    actuator: String::from("mRight"),
                    command: Command::SetPower(0.9)
                },
                CommandRecord {
                    time_ms: 15,
                    actuator: String::from("mRight"),
                    command: Command::SetDirection(Direction::Reverse)
                },
            ]
        );
    }

    #[test]
    fn test_out_of_range_not_applied() {
        let clock = SimClock::default();
        let hw = sim(&clock);

        let mut left = hw.motor("mLeft").unwrap();
        let mut servo = hw.servo("lservo").unwrap();

        assert!(left.set_power(1.5).is_err());
        assert!(servo.set_position(1.2).is_err());

        assert_eq!(hw.motor_power("mLeft"), Some(0.0));
        assert_eq!(servo.position(), None);
        assert!(hw.command_log().is_empty());
    }

    #[test]
    fn test_servo_position() {
        let clock = SimClock::default();
        let hw = sim(&clock);

        assert_eq!(hw.servo_position("lservo"), None);

        let mut servo = hw.servo("lservo").unwrap();
        servo.set_position(0.8).unwrap();

        assert_eq!(hw.servo_position("lservo"), Some(0.8));
        assert_eq!(hw.commands_for("lservo").len(), 1);
        assert_eq!(
            hw.command_log()[0].to_row(),
            CommandRow {
                time_ms: 0,
                actuator: "lservo",
                command: "set_position",
                value: 0.8
            }
        );
    }
}
