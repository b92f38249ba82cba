//! # Vehicle interface crate.
//!
//! Provides the data model and trait seams between the teleoperation
//! executable and the vehicle itself: video frames, movement and mode
//! commands, operator commands, and the `VehicleLink` transport contract.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Video frame types produced by the vehicle's camera feed
pub mod frame;

/// Command and response definitions for the vehicle and the operator
pub mod cmds;

/// The transport contract a concrete vehicle link must satisfy
pub mod link;
