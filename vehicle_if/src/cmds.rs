//! # Vehicle and Operator Command Definitions

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A movement demand sent to the vehicle, in vehicle units.
///
/// Each field is a velocity or rotation-rate demand already scaled and
/// clamped to the vehicle's accepted range by the command mapper.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct MoveCommand {
    /// Clockwise yaw rate demand
    pub yaw_rate: f64,

    /// Vertical velocity demand (positive up)
    pub vertical: f64,

    /// Lateral velocity demand (positive right)
    pub lateral: f64,

    /// Forward velocity demand (positive forward)
    pub forward: f64,
}

/// The manual movement axes sampled from the operator each tick.
///
/// Each axis is normalised to [-1, 1]. Opposing key pairs (e.g. up/down)
/// collapse into one signed axis.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct ManualAxes {
    /// Up (+) / down (-)
    pub up_down: f64,

    /// Yaw right (+) / left (-)
    pub yaw: f64,

    /// Forward (+) / back (-)
    pub forward_back: f64,

    /// Strafe right (+) / left (-)
    pub lateral: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Discrete mode/action requests the operator can make of the vehicle.
///
/// These are expected to be idempotent on the vehicle side (a takeoff while
/// airborne is a no-op), however the control loop dispatches them
/// edge-triggered to avoid chatter on the link.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq)]
pub enum VehicleAction {
    Takeoff,
    Land,
    EnableManualControl,
    DisableManualControl,
}

/// Response from the vehicle to a dispatched command.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum VehicleResponse {
    /// Command accepted and will be executed
    Ok,

    /// Command rejected by the vehicle, with the reason given
    Rejected(String),
}

/// An operator command, i.e. one entry of a flight script or one event from
/// a live input device.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub enum OpCmd {
    Takeoff,
    Land,
    EnableManualControl,
    DisableManualControl,
    Shutdown,
    ManualMove(ManualAxes),
}

/// Possible operator command parsing errors.
#[derive(Debug, Error)]
pub enum OpCmdParseError {
    #[error("Op command contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl OpCmd {
    /// Parse a new op command from a JSON packet
    pub fn from_json(json_str: &str) -> Result<Self, OpCmdParseError> {
        serde_json::from_str(json_str).map_err(OpCmdParseError::InvalidJson)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_op_cmd_from_json() {
        assert_eq!(OpCmd::from_json("\"Takeoff\"").unwrap(), OpCmd::Takeoff);
        assert_eq!(OpCmd::from_json("\"Shutdown\"").unwrap(), OpCmd::Shutdown);

        let mv = OpCmd::from_json(
            r#"{"ManualMove": {"up_down": 0.1, "yaw": -0.5, "forward_back": 1.0, "lateral": 0.0}}"#,
        )
        .unwrap();
        match mv {
            OpCmd::ManualMove(axes) => {
                assert_eq!(axes.up_down, 0.1);
                assert_eq!(axes.yaw, -0.5);
            }
            _ => panic!("expected a ManualMove"),
        }

        assert!(OpCmd::from_json("\"Backflip\"").is_err());
    }
}
