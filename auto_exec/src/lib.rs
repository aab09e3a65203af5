//! # Autonomous routine library.
//!
//! Everything the autonomous executable runs, kept in a library so that routines can be driven by
//! a simulated clock and hardware in tests.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Routine context - hardware map, clock and stop signal handed to a routine
pub mod context;

/// Waiting primitive - polls a condition against a clock until it holds or a stop is requested
pub mod wait;

/// Routines - the routine interface and the timed sequence routine
pub mod routine;

/// Parameters of the autonomous executable
pub mod params;
