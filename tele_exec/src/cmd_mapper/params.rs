//! Parameters structure for the command mapper

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for command mapping.
#[derive(Debug, Deserialize)]
pub struct Params {
    // ---- SCALING ----
    /// Scaling coefficient applied to the translational axes (vertical,
    /// lateral, forward).
    ///
    /// Units: vehicle velocity units per unit of normalised signal
    pub move_coeff: f64,

    /// Scaling coefficient applied to the yaw rate axis.
    ///
    /// Units: vehicle rotation units per unit of normalised signal
    pub rotate_coeff: f64,

    // ---- CAPABILITIES ----
    /// Maximum absolute yaw rate demand accepted by the vehicle
    pub max_abs_yaw_rate: f64,

    /// Maximum absolute vertical velocity demand accepted by the vehicle
    pub max_abs_vertical: f64,

    /// Maximum absolute lateral velocity demand accepted by the vehicle
    pub max_abs_lateral: f64,

    /// Maximum absolute forward velocity demand accepted by the vehicle
    pub max_abs_forward: f64,
}

impl Default for Params {
    fn default() -> Self {
        // Matches params/cmd_mapper.toml
        Self {
            move_coeff: 0.03,
            rotate_coeff: 0.15,
            max_abs_yaw_rate: 1.0,
            max_abs_vertical: 1.0,
            max_abs_lateral: 1.0,
            max_abs_forward: 1.0,
        }
    }
}
