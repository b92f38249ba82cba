//! # Operator Input
//!
//! The control loop samples the operator exactly once per tick through the
//! [`OperatorInput`] trait, receiving a snapshot of discrete action flags
//! and the manual movement axes. The concrete input source (keyboard,
//! joystick, UI, flight script) lives behind this interface.
//!
//! Discrete actions are dispatched to the vehicle edge-triggered: an action
//! fires only on the tick where its flag rises, so an input source that
//! reports "still asserted" every tick does not re-send the command.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::info;

use util::script_interpreter::{PendingOps, ScriptInterpreter};
use vehicle_if::cmds::{ManualAxes, OpCmd, VehicleAction};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A per-tick snapshot of the operator's inputs.
#[derive(Clone, Copy, Debug, Default)]
pub struct OperatorSnapshot {
    pub takeoff: bool,
    pub land: bool,
    pub enable_manual_ctrl: bool,
    pub disable_manual_ctrl: bool,
    pub shutdown: bool,

    /// Manual movement axes, only acted on while manual control is enabled
    pub axes: ManualAxes,
}

/// An operator source that never asserts anything.
///
/// Used when no flight script is given: the vehicle streams video and holds
/// on the analysis signal until the process is interrupted.
#[derive(Default)]
pub struct IdleOperator;

/// An operator source driven by a timed flight script.
///
/// Each scripted command asserts its flag for exactly one tick. Manual
/// movement commands set the held axes, which persist until the next
/// `ManualMove` in the script. Reaching the end of the script asserts
/// shutdown.
pub struct ScriptOperator {
    interpreter: ScriptInterpreter,
    held_axes: ManualAxes,
    end_logged: bool,
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A source of operator input, sampled once per control cycle.
pub trait OperatorInput {
    fn sample(&mut self) -> OperatorSnapshot;
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Extract the discrete actions whose flags rose between two snapshots.
pub fn rising_edge_actions(
    prev: &OperatorSnapshot,
    curr: &OperatorSnapshot,
) -> Vec<VehicleAction> {
    let mut actions = vec![];

    if curr.takeoff && !prev.takeoff {
        actions.push(VehicleAction::Takeoff);
    }
    if curr.land && !prev.land {
        actions.push(VehicleAction::Land);
    }
    if curr.enable_manual_ctrl && !prev.enable_manual_ctrl {
        actions.push(VehicleAction::EnableManualControl);
    }
    if curr.disable_manual_ctrl && !prev.disable_manual_ctrl {
        actions.push(VehicleAction::DisableManualControl);
    }

    actions
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl OperatorInput for Box<dyn OperatorInput> {
    fn sample(&mut self) -> OperatorSnapshot {
        (**self).sample()
    }
}

impl OperatorInput for IdleOperator {
    fn sample(&mut self) -> OperatorSnapshot {
        OperatorSnapshot::default()
    }
}

impl ScriptOperator {
    pub fn new(interpreter: ScriptInterpreter) -> Self {
        Self {
            interpreter,
            held_axes: ManualAxes::default(),
            end_logged: false,
        }
    }
}

impl OperatorInput for ScriptOperator {
    fn sample(&mut self) -> OperatorSnapshot {
        let mut snapshot = OperatorSnapshot {
            axes: self.held_axes,
            ..Default::default()
        };

        match self.interpreter.get_pending_ops() {
            PendingOps::None => (),
            PendingOps::Some(op_vec) => {
                for op in op_vec {
                    match op {
                        OpCmd::Takeoff => snapshot.takeoff = true,
                        OpCmd::Land => snapshot.land = true,
                        OpCmd::EnableManualControl => snapshot.enable_manual_ctrl = true,
                        OpCmd::DisableManualControl => snapshot.disable_manual_ctrl = true,
                        OpCmd::Shutdown => snapshot.shutdown = true,
                        OpCmd::ManualMove(axes) => {
                            self.held_axes = axes;
                            snapshot.axes = axes;
                        }
                    }
                }
            }
            PendingOps::EndOfScript => {
                if !self.end_logged {
                    info!("End of flight script reached, requesting shutdown");
                    self.end_logged = true;
                }
                snapshot.shutdown = true;
            }
        }

        snapshot
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_rising_edge_only() {
        let off = OperatorSnapshot::default();
        let held = OperatorSnapshot {
            takeoff: true,
            ..Default::default()
        };

        // Rising edge fires
        assert_eq!(
            rising_edge_actions(&off, &held),
            vec![VehicleAction::Takeoff]
        );

        // Held flag does not re-fire
        assert!(rising_edge_actions(&held, &held).is_empty());

        // Falling edge fires nothing
        assert!(rising_edge_actions(&held, &off).is_empty());
    }

    #[test]
    fn test_multiple_edges_in_one_tick() {
        let off = OperatorSnapshot::default();
        let multi = OperatorSnapshot {
            land: true,
            disable_manual_ctrl: true,
            ..Default::default()
        };

        let actions = rising_edge_actions(&off, &multi);
        assert_eq!(actions.len(), 2);
        assert!(actions.contains(&VehicleAction::Land));
        assert!(actions.contains(&VehicleAction::DisableManualControl));
    }
}
