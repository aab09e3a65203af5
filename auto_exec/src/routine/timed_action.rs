//! # Timed Actions
//!
//! A timed action commands a set of motor powers and servo positions, holds them for a duration
//! and then commands every motor of the action back to zero power.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use hw_if::{ActuatorKind, ResolutionError};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use util::time::elapsed_ms;

use super::{Actuators, RoutineError};
use crate::{
    context::RoutineContext,
    wait::{wait_until, WaitOutcome},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Power demand for a single motor.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MotorPower {
    pub motor: String,
    pub power: f64,
}

/// Position demand for a single servo.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ServoPosition {
    pub servo: String,
    pub position: f64,
}

/// Actuator demands held for a fixed duration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TimedAction {
    /// Name of the action in logs and reports
    pub label: String,

    /// Motor powers to command at the start of the action, in order
    #[serde(default)]
    pub motor_powers: Vec<MotorPower>,

    /// Servo positions to command at the start of the action, after the motor powers
    #[serde(default)]
    pub servo_positions: Vec<ServoPosition>,

    /// How long the demands are held for.
    ///
    /// Units: milliseconds
    pub duration_ms: u64,
}

/// Tracks the state of an action against the clock.
#[derive(Debug, Clone, Copy)]
pub struct ActionTimer {
    start_ms: u64,
    duration_ms: u64,
    state: ActionState,
}

/// Report on one executed action.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ActionReport {
    pub label: String,
    pub start_ms: u64,
    pub end_ms: u64,
    pub outcome: ActionOutcome,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionState {
    /// Demands are applied and the duration has not elapsed yet
    Running,

    /// Terminal state
    Done,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The full duration elapsed
    Completed,

    /// A stop was requested before the duration elapsed
    Stopped,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TimedAction {
    /// Create an action with no demands.
    pub fn new<S: Into<String>>(label: S, duration_ms: u64) -> Self {
        Self {
            label: label.into(),
            motor_powers: Vec::new(),
            servo_positions: Vec::new(),
            duration_ms,
        }
    }

    /// Add a motor power demand to the action.
    pub fn with_power<S: Into<String>>(mut self, motor: S, power: f64) -> Self {
        self.motor_powers.push(MotorPower {
            motor: motor.into(),
            power,
        });
        self
    }

    /// Add a servo position demand to the action.
    pub fn with_position<S: Into<String>>(mut self, servo: S, position: f64) -> Self {
        self.servo_positions.push(ServoPosition {
            servo: servo.into(),
            position,
        });
        self
    }

    /// Names of the motors commanded by this action.
    pub fn motor_names(&self) -> impl Iterator<Item = &str> {
        self.motor_powers.iter().map(|m| m.motor.as_str())
    }

    /// Names of the servos commanded by this action.
    pub fn servo_names(&self) -> impl Iterator<Item = &str> {
        self.servo_positions.iter().map(|s| s.servo.as_str())
    }

    /// Execute the action, blocking until it is done.
    ///
    /// The start time is sampled before any demand is sent. Once at least `duration_ms` has
    /// elapsed, or a stop is requested, every motor of the action is set to zero power.
    pub fn execute(
        &self,
        actuators: &mut Actuators,
        ctx: &RoutineContext,
    ) -> Result<ActionReport, RoutineError> {
        let start_ms = ctx.clock().now_ms();
        let mut timer = ActionTimer::start(start_ms, self.duration_ms);

        info!(
            "Action \"{}\" started at {} ms for {} ms",
            self.label, start_ms, self.duration_ms
        );

        if let Err(e) = self.apply(actuators) {
            // Don't leave anything that did get commanded running
            if let Err(stop_err) = self.stop_motors(actuators) {
                warn!(
                    "Could not stop the motors of \"{}\" after a failed demand: {}",
                    self.label, stop_err
                );
            }
            return Err(e);
        }

        let outcome = wait_until(ctx, |now_ms| timer.update(now_ms) == ActionState::Done);
        timer.finish();

        self.stop_motors(actuators)?;

        let report = ActionReport {
            label: self.label.clone(),
            start_ms,
            end_ms: outcome.at_ms(),
            outcome: match outcome {
                WaitOutcome::Satisfied { .. } => ActionOutcome::Completed,
                WaitOutcome::Stopped { .. } => ActionOutcome::Stopped,
            },
        };

        info!(
            "Action \"{}\" {:?} after {} ms",
            self.label,
            report.outcome,
            elapsed_ms(start_ms, report.end_ms)
        );

        Ok(report)
    }

    /// Send the motor and servo demands of the action.
    fn apply(&self, actuators: &mut Actuators) -> Result<(), RoutineError> {
        for demand in self.motor_powers.iter() {
            let motor = actuators
                .motor_mut(&demand.motor)
                .ok_or_else(|| not_resolved(&demand.motor, ActuatorKind::Motor))?;
            motor.set_power(demand.power)?;
            debug!("{} power {}", demand.motor, demand.power);
        }

        for demand in self.servo_positions.iter() {
            let servo = actuators
                .servo_mut(&demand.servo)
                .ok_or_else(|| not_resolved(&demand.servo, ActuatorKind::Servo))?;
            servo.set_position(demand.position)?;
            debug!("{} position {}", demand.servo, demand.position);
        }

        Ok(())
    }

    /// Set every motor of the action to zero power.
    ///
    /// A motor which fails to stop does not prevent the others from being stopped. The first
    /// failure is returned once every motor has been tried.
    fn stop_motors(&self, actuators: &mut Actuators) -> Result<(), RoutineError> {
        let mut first_err = None;

        for demand in self.motor_powers.iter() {
            if let Some(motor) = actuators.motor_mut(&demand.motor) {
                if let Err(e) = motor.set_power(0.0) {
                    warn!("Could not stop motor \"{}\": {}", demand.motor, e);
                    first_err.get_or_insert(e);
                }
            }
        }

        match first_err {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

impl ActionTimer {
    /// Start timing an action at `start_ms`.
    pub fn start(start_ms: u64, duration_ms: u64) -> Self {
        Self {
            start_ms,
            duration_ms,
            state: ActionState::Running,
        }
    }

    /// Update the state for the current time and return it.
    ///
    /// `Running` becomes `Done` once `now_ms - start_ms >= duration_ms`. `Done` never changes.
    pub fn update(&mut self, now_ms: u64) -> ActionState {
        if self.state == ActionState::Running
            && elapsed_ms(self.start_ms, now_ms) >= self.duration_ms
        {
            self.state = ActionState::Done;
        }

        self.state
    }

    /// End the action regardless of the time.
    pub fn finish(&mut self) {
        self.state = ActionState::Done;
    }

    pub fn state(&self) -> ActionState {
        self.state
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn not_resolved(name: &str, kind: ActuatorKind) -> RoutineError {
    RoutineError::Resolution(ResolutionError::NotFound {
        name: name.to_string(),
        kind,
    })
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
