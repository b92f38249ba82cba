//! # Vehicle Link Contract
//!
//! The `VehicleLink` trait is the seam between the teleoperation executable
//! and whatever transport actually talks to the vehicle (an MSDK bridge, a
//! simulator, a test mock). The executable only ever sees this trait.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use thiserror::Error;

use crate::cmds::{MoveCommand, VehicleAction, VehicleResponse};
use crate::frame::Frame;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Transport errors a vehicle link call may fail with.
///
/// All variants except `ConnectionFailed` are recoverable from the control
/// loop's point of view - a single dropped command does not abort
/// teleoperation.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("Could not establish a connection to the vehicle at {0}: {1}")]
    ConnectionFailed(String, String),

    #[error("The link is not connected to the vehicle")]
    NotConnected,

    #[error("Could not send the command to the vehicle: {0}")]
    SendError(String),

    #[error("Could not recieve a response from the vehicle: {0}")]
    RecvError(String),
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// The contract a concrete vehicle transport must satisfy.
///
/// All command calls take `wait_for_ack`: when true the call blocks (for the
/// transport's own short timeout) until the vehicle acknowledges, when false
/// it returns as soon as the command is on the wire. `get_frame` is a
/// non-blocking poll for the newest available video frame.
pub trait VehicleLink {
    /// Command the vehicle to take off.
    fn takeoff(&mut self, wait_for_ack: bool) -> Result<VehicleResponse, LinkError>;

    /// Command the vehicle to land.
    fn land(&mut self, wait_for_ack: bool) -> Result<VehicleResponse, LinkError>;

    /// Enable manual (operator stick) control on the vehicle side.
    fn enable_manual_control(&mut self, wait_for_ack: bool)
        -> Result<VehicleResponse, LinkError>;

    /// Disable manual control, returning authority to the vehicle's own
    /// controller.
    fn disable_manual_control(
        &mut self,
        wait_for_ack: bool,
    ) -> Result<VehicleResponse, LinkError>;

    /// Dispatch a movement demand to the vehicle.
    fn move_cmd(
        &mut self,
        cmd: &MoveCommand,
        wait_for_ack: bool,
    ) -> Result<VehicleResponse, LinkError>;

    /// Poll for the newest video frame, `Ok(None)` if no new frame is
    /// available. Must not block beyond the transport's own short timeout.
    fn get_frame(&mut self) -> Result<Option<Frame>, LinkError>;

    /// Dispatch a discrete action to the vehicle.
    fn exec_action(
        &mut self,
        action: VehicleAction,
        wait_for_ack: bool,
    ) -> Result<VehicleResponse, LinkError> {
        match action {
            VehicleAction::Takeoff => self.takeoff(wait_for_ack),
            VehicleAction::Land => self.land(wait_for_ack),
            VehicleAction::EnableManualControl => self.enable_manual_control(wait_for_ack),
            VehicleAction::DisableManualControl => self.disable_manual_control(wait_for_ack),
        }
    }
}
