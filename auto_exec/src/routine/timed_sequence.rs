//! # Timed Sequence Routine
//!
//! Resolves the robot's actuators, applies the static configuration (reversed motors, initial
//! servo positions) and then runs a list of [`TimedAction`]s one after the other.
//!
//! With default parameters the sequence is a single action driving forwards for 3 seconds, right
//! motor at 0.9 and left motor at 1.0.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use hw_if::{
    actuator::{check_position, check_power},
    ActuatorError, Direction,
};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::{Actuators, Routine, RoutineError, RoutineReport, ServoPosition, TimedAction};
use crate::context::RoutineContext;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Right drive motor
pub const MOTOR_RIGHT: &str = "mRight";

/// Left drive motor
pub const MOTOR_LEFT: &str = "mLeft";

/// Middle turbo motor
pub const MOTOR_MID: &str = "mMid";

/// Lifts and lowers the middle motor
pub const MOTOR_MID_RELEASE: &str = "mRelease";

/// Tape measure motor
pub const MOTOR_TAPE: &str = "tapeRelease";

/// Lifts and lowers the metal bar
pub const SERVO_LEFT: &str = "lservo";

/// Lifts and lowers the tape measure
pub const SERVO_TAPE: &str = "tapeServo";

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of the timed sequence routine.
///
/// [`Default`] gives the drive-to-button plan. A plan loaded from a file only contains what the
/// file lists: any list it leaves out is empty.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TimedSequenceParams {
    /// Name of the routine in logs and reports
    #[serde(default = "default_name")]
    pub name: String,

    /// Motors to resolve at activation, whether or not an action uses them
    #[serde(default)]
    pub motors: Vec<String>,

    /// Servos to resolve at activation, whether or not an action uses them
    #[serde(default)]
    pub servos: Vec<String>,

    /// Motors whose direction is reversed during configuration
    #[serde(default)]
    pub reversed_motors: Vec<String>,

    /// Servo positions set during configuration
    #[serde(default)]
    pub initial_servo_positions: Vec<ServoPosition>,

    /// Actions executed in order after configuration
    #[serde(default)]
    pub actions: Vec<TimedAction>,
}

/// Timed sequence routine.
#[derive(Debug, Clone)]
pub struct TimedSequence {
    params: TimedSequenceParams,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for TimedSequenceParams {
    fn default() -> Self {
        Self {
            name: default_name(),
            motors: [
                MOTOR_RIGHT,
                MOTOR_LEFT,
                MOTOR_MID,
                MOTOR_MID_RELEASE,
                MOTOR_TAPE,
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            servos: [SERVO_LEFT, SERVO_TAPE]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            reversed_motors: vec![MOTOR_LEFT.to_string(), MOTOR_TAPE.to_string()],
            initial_servo_positions: vec![ServoPosition {
                servo: SERVO_LEFT.to_string(),
                position: 0.8,
            }],
            actions: vec![TimedAction::new("drive_to_button", 3000)
                .with_power(MOTOR_RIGHT, 0.9)
                .with_power(MOTOR_LEFT, 1.0)],
        }
    }
}

impl TimedSequenceParams {
    /// Check every demand in the parameters is within the actuator limits.
    pub fn validate(&self) -> Result<(), ActuatorError> {
        for p in self.initial_servo_positions.iter() {
            check_position(&p.servo, p.position)?;
        }

        for action in self.actions.iter() {
            for m in action.motor_powers.iter() {
                check_power(&m.motor, m.power)?;
            }
            for s in action.servo_positions.iter() {
                check_position(&s.servo, s.position)?;
            }
        }

        Ok(())
    }

    /// Every motor named anywhere in the parameters, in order of first appearance.
    pub fn all_motor_names(&self) -> Vec<&str> {
        let names = self
            .motors
            .iter()
            .map(String::as_str)
            .chain(self.reversed_motors.iter().map(String::as_str))
            .chain(self.actions.iter().flat_map(|a| a.motor_names()));

        dedup(names)
    }

    /// Every servo named anywhere in the parameters, in order of first appearance.
    pub fn all_servo_names(&self) -> Vec<&str> {
        let names = self
            .servos
            .iter()
            .map(String::as_str)
            .chain(self.initial_servo_positions.iter().map(|p| p.servo.as_str()))
            .chain(self.actions.iter().flat_map(|a| a.servo_names()));

        dedup(names)
    }
}

impl TimedSequence {
    pub fn new(params: TimedSequenceParams) -> Self {
        Self { params }
    }

    /// Resolve every actuator the routine uses.
    pub fn resolve(&self, ctx: &RoutineContext) -> Result<Actuators, RoutineError> {
        let actuators = Actuators::resolve(
            ctx.hardware(),
            self.params.all_motor_names(),
            self.params.all_servo_names(),
        )?;

        info!(
            "Resolved {} motors and {} servos",
            actuators.num_motors(),
            actuators.num_servos()
        );

        Ok(actuators)
    }

    /// Apply the static configuration.
    ///
    /// Directions and positions are set rather than toggled, so configuring twice leaves the
    /// actuators as configuring once does.
    pub fn configure(&self, actuators: &mut Actuators) -> Result<(), RoutineError> {
        for name in self.params.reversed_motors.iter() {
            if let Some(motor) = actuators.motor_mut(name) {
                motor.set_direction(Direction::Reverse)?;
                info!("Motor \"{}\" reversed", name);
            }
        }

        for p in self.params.initial_servo_positions.iter() {
            if let Some(servo) = actuators.servo_mut(&p.servo) {
                servo.set_position(p.position)?;
                info!("Servo \"{}\" set to {}", p.servo, p.position);
            }
        }

        Ok(())
    }
}

impl Routine for TimedSequence {
    fn name(&self) -> &str {
        &self.params.name
    }

    fn run(&mut self, ctx: &RoutineContext) -> Result<RoutineReport, RoutineError> {
        let start_ms = ctx.clock().now_ms();

        info!("Routine \"{}\" activated", self.params.name);

        let mut actuators = self.resolve(ctx)?;

        self.configure(&mut actuators)?;

        let mut actions = Vec::with_capacity(self.params.actions.len());
        let mut stopped = false;

        for action in self.params.actions.iter() {
            if ctx.stop_requested() {
                stopped = true;
                break;
            }

            let report = action.execute(&mut actuators, ctx)?;
            stopped = report.outcome == super::ActionOutcome::Stopped;
            actions.push(report);

            if stopped {
                break;
            }
        }

        let end_ms = ctx.clock().now_ms();

        if stopped {
            warn!(
                "Routine \"{}\" stopped after {} of {} actions",
                self.params.name,
                actions.len(),
                self.params.actions.len()
            );
        } else {
            info!(
                "Routine \"{}\" done in {} ms",
                self.params.name,
                end_ms.saturating_sub(start_ms)
            );
        }

        Ok(RoutineReport {
            routine: self.params.name.clone(),
            start_ms,
            end_ms,
            actions,
            stopped,
        })
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn default_name() -> String {
    String::from("drive_to_button")
}

/// Keep the first occurence of each name.
fn dedup<'a, I: Iterator<Item = &'a str>>(names: I) -> Vec<&'a str> {
    let mut out: Vec<&str> = Vec::new();
    for name in names {
        if !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{context::StopSignal, routine::ActionOutcome};
    use hw_if::{
        sim::{Command, CommandRecord, SimHardwareMap},
        ActuatorKind, HardwareConfig, ResolutionError,
    };
    use std::sync::Arc;
    use util::time::{Clock, SimClock};

    fn robot_config() -> HardwareConfig {
        HardwareConfig {
            motors: vec![
                String::from("mRight"),
                String::from("mLeft"),
                String::from("mMid"),
                String::from("mRelease"),
                String::from("tapeRelease"),
            ],
            servos: vec![String::from("lservo"), String::from("tapeServo")],
        }
    }

    fn record(time_ms: u64, actuator: &str, command: Command) -> CommandRecord {
        CommandRecord {
            time_ms,
            actuator: actuator.to_string(),
            command,
        }
    }

    #[test]
    fn test_default_routine() {
        let clock = SimClock::default();
        let hw = SimHardwareMap::new(&robot_config(), Arc::new(clock.clone())).unwrap();
        let ctx = RoutineContext::new(&hw, &clock, StopSignal::new());

        let mut routine = TimedSequence::new(TimedSequenceParams::default());
        let report = routine.run(&ctx).unwrap();

        assert_eq!(
            hw.command_log(),
            vec![
                record(0, "mLeft", Command::SetDirection(Direction::Reverse)),
                record(0, "tapeRelease", Command::SetDirection(Direction::Reverse)),
                record(0, "lservo", Command::SetPosition(0.8)),
                record(0, "mRight", Command::SetPower(0.9)),
                record(0, "mLeft", Command::SetPower(1.0)),
                record(3000, "mRight", Command::SetPower(0.0)),
                record(3000, "mLeft", Command::SetPower(0.0)),
            ]
        );

        assert_eq!(report.actions.len(), 1);
        assert_eq!(report.actions[0].outcome, ActionOutcome::Completed);
        assert!(!report.stopped);
        assert_eq!(report.end_ms, 3000);

        assert_eq!(hw.motor_direction("mLeft"), Some(Direction::Reverse));
        assert_eq!(hw.motor_direction("tapeRelease"), Some(Direction::Reverse));
        assert_eq!(hw.motor_direction("mRight"), Some(Direction::Forward));
        assert_eq!(hw.servo_position("lservo"), Some(0.8));
        assert_eq!(hw.servo_position("tapeServo"), None);
    }

    #[test]
    fn test_drive_motors_only() {
        let config = HardwareConfig {
            motors: vec![String::from("mRight"), String::from("mLeft")],
            servos: vec![],
        };
        let clock = SimClock::starting_at(500);
        let hw = SimHardwareMap::new(&config, Arc::new(clock.clone())).unwrap();
        let ctx = RoutineContext::new(&hw, &clock, StopSignal::new());

        let params = TimedSequenceParams {
            motors: vec![String::from("mRight"), String::from("mLeft")],
            servos: vec![],
            reversed_motors: vec![String::from("mLeft")],
            initial_servo_positions: vec![],
            ..Default::default()
        };

        TimedSequence::new(params).run(&ctx).unwrap();

        let powers: Vec<(u64, &str, f64)> = hw
            .command_log()
            .iter()
            .filter_map(|r| match r.command {
                Command::SetPower(p) => {
                    let side = if r.actuator == "mRight" { "R" } else { "L" };
                    Some((r.time_ms, side, p))
                }
                _ => None,
            })
            .collect();

        assert_eq!(
            powers,
            vec![
                (500, "R", 0.9),
                (500, "L", 1.0),
                (3500, "R", 0.0),
                (3500, "L", 0.0),
            ]
        );

        // Nothing is commanded after the motors are stopped
        let last = hw.command_log().last().cloned().unwrap();
        assert_eq!(last, record(3500, "mLeft", Command::SetPower(0.0)));
    }

    #[test]
    fn test_unresolved_name_aborts() {
        let config = HardwareConfig {
            motors: vec![String::from("mRight"), String::from("mLeft")],
            servos: vec![String::from("lservo")],
        };
        let clock = SimClock::default();
        let hw = SimHardwareMap::new(&config, Arc::new(clock.clone())).unwrap();
        let ctx = RoutineContext::new(&hw, &clock, StopSignal::new());

        let result = TimedSequence::new(TimedSequenceParams::default()).run(&ctx);

        match result {
            Err(RoutineError::Resolution(e)) => assert_eq!(
                e,
                ResolutionError::NotFound {
                    name: String::from("mMid"),
                    kind: ActuatorKind::Motor
                }
            ),
            r => panic!("Expected a resolution error, got {:?}", r),
        }

        // Neither configuration nor the action happened
        assert!(hw.command_log().is_empty());
        assert_eq!(hw.motor_direction("mLeft"), Some(Direction::Forward));
        assert_eq!(clock.now_ms(), 0);
    }

    #[test]
    fn test_configure_idempotent() {
        let clock = SimClock::default();
        let hw = SimHardwareMap::new(&robot_config(), Arc::new(clock.clone())).unwrap();
        let ctx = RoutineContext::new(&hw, &clock, StopSignal::new());

        let routine = TimedSequence::new(TimedSequenceParams::default());
        let mut actuators = routine.resolve(&ctx).unwrap();

        routine.configure(&mut actuators).unwrap();
        assert_eq!(hw.commands_for("mLeft").len(), 1);
        assert_eq!(hw.commands_for("tapeRelease").len(), 1);
        assert_eq!(hw.commands_for("mRight").len(), 0);

        routine.configure(&mut actuators).unwrap();
        assert_eq!(hw.motor_direction("mLeft"), Some(Direction::Reverse));
        assert_eq!(hw.motor_direction("tapeRelease"), Some(Direction::Reverse));
        assert_eq!(hw.servo_position("lservo"), Some(0.8));
    }

    #[test]
    fn test_stop_before_actions() {
        let clock = SimClock::default();
        let hw = SimHardwareMap::new(&robot_config(), Arc::new(clock.clone())).unwrap();
        let stop = StopSignal::new();
        stop.request();
        let ctx = RoutineContext::new(&hw, &clock, stop);

        let report = TimedSequence::new(TimedSequenceParams::default())
            .run(&ctx)
            .unwrap();

        assert!(report.stopped);
        assert!(report.actions.is_empty());
        assert_eq!(hw.motor_power("mRight"), Some(0.0));
        assert!(hw.commands_for("mRight").is_empty());
    }

    #[test]
    fn test_sequence_from_params() {
        let params: TimedSequenceParams = util::params::from_str(
            r#"
            name = "turn_and_tape"
            motors = ["mRight", "mLeft", "tapeRelease"]
            servos = ["tapeServo"]

            [[actions]]
            label = "turn"
            motor_powers = [
                { motor = "mRight", power = 1.0 },
                { motor = "mLeft", power = -1.0 },
            ]
            duration_ms = 300

            [[actions]]
            label = "tape"
            motor_powers = [{ motor = "tapeRelease", power = 1.0 }]
            servo_positions = [{ servo = "tapeServo", position = 0.3 }]
            duration_ms = 1800
            "#,
        )
        .unwrap();

        // Lists left out of the file are empty, not the drive-to-button ones
        assert!(params.validate().is_ok());
        assert!(params.reversed_motors.is_empty());
        assert!(params.initial_servo_positions.is_empty());
        assert_eq!(params.all_servo_names(), vec!["tapeServo"]);

        // Hardware without lservo, mMid or mRelease can run this plan
        let config = HardwareConfig {
            motors: vec![
                String::from("mRight"),
                String::from("mLeft"),
                String::from("tapeRelease"),
            ],
            servos: vec![String::from("tapeServo")],
        };
        let clock = SimClock::default();
        let hw = SimHardwareMap::new(&config, Arc::new(clock.clone())).unwrap();
        let ctx = RoutineContext::new(&hw, &clock, StopSignal::new());

        let mut routine = TimedSequence::new(params);
        assert_eq!(routine.name(), "turn_and_tape");

        let report = routine.run(&ctx).unwrap();

        assert_eq!(report.actions.len(), 2);
        assert_eq!(report.actions[0].start_ms, 0);
        assert_eq!(report.actions[0].end_ms, 300);
        assert_eq!(report.actions[1].start_ms, 300);
        assert_eq!(report.actions[1].end_ms, 2100);

        assert_eq!(hw.motor_direction("mLeft"), Some(Direction::Forward));
        assert!(hw
            .command_log()
            .iter()
            .all(|r| !matches!(r.command, Command::SetDirection(_))));
        assert_eq!(hw.motor_power("tapeRelease"), Some(0.0));
        assert_eq!(hw.servo_position("tapeServo"), Some(0.3));
    }

    #[test]
    fn test_unnamed_plan_takes_default_name() {
        let params: TimedSequenceParams = util::params::from_str("").unwrap();

        assert_eq!(params.name, "drive_to_button");
        assert!(params.motors.is_empty());
        assert!(params.actions.is_empty());
    }

    #[test]
    fn test_all_names_deduplicated() {
        let params = TimedSequenceParams {
            motors: vec![String::from("mRight")],
            servos: vec![],
            reversed_motors: vec![String::from("mLeft"), String::from("mRight")],
            initial_servo_positions: vec![],
            actions: vec![TimedAction::new("a", 1)
                .with_power("mLeft", 0.5)
                .with_power("mMid", 0.5)
                .with_position("lservo", 0.1)],
            ..Default::default()
        };

        assert_eq!(params.all_motor_names(), vec!["mRight", "mLeft", "mMid"]);
        assert_eq!(params.all_servo_names(), vec!["lservo"]);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut params = TimedSequenceParams::default();
        params.actions.push(TimedAction::new("too_fast", 10).with_power("mRight", 1.5));

        assert_eq!(
            params.validate(),
            Err(ActuatorError::PowerOutOfRange {
                name: String::from("mRight"),
                power: 1.5
            })
        );
    }
}
