//! # Data Store

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use crate::analysis::TargetSignal;
use crate::cmd_mapper;
use crate::operator::OperatorSnapshot;
use vehicle_if::cmds::MoveCommand;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// True if this cycle falls on a 1Hz boundary
    pub is_1_hz_cycle: bool,

    // Analysis
    /// The signal used for command mapping this cycle (analysis result or
    /// manual override), `None` if neither has ever been available
    pub latest_signal: Option<TargetSignal>,

    // Vehicle state tracking
    /// True while manual control is enabled on the vehicle side (tracked
    /// from acknowledged enable/disable commands)
    pub manual_ctrl_enabled: bool,

    // Operator
    /// The previous cycle's operator snapshot, for edge-triggered dispatch
    pub prev_op_snapshot: OperatorSnapshot,

    // Command mapper
    pub cmd_mapper: cmd_mapper::CmdMapper,
    pub cmd_mapper_input: cmd_mapper::InputData,
    pub cmd_mapper_output: MoveCommand,
    pub cmd_mapper_status_rpt: cmd_mapper::StatusReport,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,

    /// Number of consecutive vehicle link errors
    pub num_consec_link_errors: u64,
}

/// Telemetry snapshot of the data store, saved into the session on the 1Hz
/// cycle.
#[derive(Serialize)]
pub struct Telemetry {
    pub num_cycles: u128,
    pub latest_signal: Option<TargetSignal>,
    pub move_cmd: MoveCommand,
    pub manual_ctrl_enabled: bool,
    pub num_consec_cycle_overruns: u64,
    pub num_consec_link_errors: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle, and
    /// sets the 1Hz cycle flag.
    pub fn cycle_start(&mut self, cycle_frequency_hz: f64) {
        // At cycle rates below 1 Hz every cycle counts as a 1Hz cycle
        let cycles_per_second = (cycle_frequency_hz as u128).max(1);
        self.is_1_hz_cycle = self.num_cycles % cycles_per_second == 0;

        self.cmd_mapper_input = cmd_mapper::InputData::default();
        self.cmd_mapper_output = MoveCommand::default();
        self.cmd_mapper_status_rpt = cmd_mapper::StatusReport::default();
    }

    /// Build a telemetry snapshot of the current cycle.
    pub fn telemetry(&self) -> Telemetry {
        Telemetry {
            num_cycles: self.num_cycles,
            latest_signal: self.latest_signal,
            move_cmd: self.cmd_mapper_output,
            manual_ctrl_enabled: self.manual_ctrl_enabled,
            num_consec_cycle_overruns: self.num_consec_cycle_overruns,
            num_consec_link_errors: self.num_consec_link_errors,
        }
    }
}
