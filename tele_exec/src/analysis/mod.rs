//! Frame analysis module
//!
//! Analysis runs in its own worker thread so that a slow or failing detector
//! never stalls command dispatch. The worker is purely reactive: it wakes
//! when the control loop publishes a frame, runs the pluggable detector, and
//! publishes the resulting target signal back through the shared state.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod detect;
mod worker;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use detect::*;
pub use worker::*;

// External
use serde::Serialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The normalised 4-axis movement recommendation derived from frame
/// analysis.
///
/// Each axis is in [-1, 1]. Absence of a signal is represented by
/// `Option<TargetSignal>` so that "no signal yet" can be distinguished from
/// "signal says hold position".
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct TargetSignal {
    /// Clockwise yaw rate recommendation
    pub yaw_rate: f64,

    /// Vertical velocity recommendation (positive up)
    pub vertical: f64,

    /// Lateral velocity recommendation (positive right)
    pub lateral: f64,

    /// Forward velocity recommendation (positive forward)
    pub forward: f64,
}

impl TargetSignal {
    /// The identity signal - hold position on all axes.
    pub const IDENTITY: TargetSignal = TargetSignal {
        yaw_rate: 0.0,
        vertical: 0.0,
        lateral: 0.0,
        forward: 0.0,
    };
}
