//! # Teleoperation library.
//!
//! This library exposes the teleoperation executable's modules so that they
//! can be exercised from tests and other crates in the workspace.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Analysis worker - runs the pluggable detector over incoming frames in its own thread
pub mod analysis;

/// Command mapper module - turns target signals into vehicle movement commands
pub mod cmd_mapper;

/// Control loop - the fixed-period driver dispatching commands to the vehicle
pub mod control_loop;

/// Global data store for the executable
pub mod data_store;

/// Display sinks for operator monitoring frames
pub mod display;

/// Operator input snapshots and sources
pub mod operator;

/// Executable parameters
pub mod params;

/// Shared state between the control loop and the analysis worker
pub mod shared_state;

/// Simulated vehicle link - development stand-in for a real transport
pub mod sim_link;
