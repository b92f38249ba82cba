//! # Teleoperation Executable Parameters
//!
//! This module provides parameters for the teleoperation executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Clone)]
pub struct TeleExecParams {
    /// Address of the vehicle (MSDK bridge device) to connect to
    pub vehicle_addr: String,

    /// Target period of one control cycle in seconds
    pub cycle_period_s: f64,

    /// Downscale factor applied to monitoring frames before they are written
    pub display_scale_factor: f64,

    /// Maximum rate at which monitoring frames are written, in Hz
    pub display_max_rate_hz: f64,

    /// Period between synthetic frames produced by the simulated vehicle
    /// link, in seconds
    pub sim_frame_period_s: f64,
}

impl Default for TeleExecParams {
    fn default() -> Self {
        // Matches params/tele_exec.toml
        Self {
            vehicle_addr: String::from("192.168.1.102"),
            cycle_period_s: 0.1,
            display_scale_factor: 0.25,
            display_max_rate_hz: 5.0,
            sim_frame_period_s: 0.04,
        }
    }
}
