//! Implementations for the command mapper state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;

// Internal
use super::{CmdMapperError, Params};
use crate::analysis::TargetSignal;
use util::{
    archive::{Archived, Archiver},
    maths::clamp,
    module::State,
    params,
    session::Session,
};
use vehicle_if::cmds::MoveCommand;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Command mapper module state
#[derive(Default)]
pub struct CmdMapper {
    pub(crate) params: Params,

    pub(crate) report: StatusReport,
    arch_report: Archiver,

    pub(crate) output: Option<MoveCommand>,
    arch_output: Archiver,
}

/// Input data to the command mapper.
#[derive(Default)]
pub struct InputData {
    /// The target signal to map, or `None` if analysis has not produced one
    /// yet, in which case the identity signal (hold position) is used.
    pub signal: Option<TargetSignal>,
}

/// Status report for command mapper processing.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    /// True for each axis whose demand hit the vehicle's accepted limit
    pub yaw_rate_limited: bool,
    pub vertical_limited: bool,
    pub lateral_limited: bool,
    pub forward_limited: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for CmdMapper {
    type InitData = &'static str;
    type InitError = params::LoadError;

    type InputData = InputData;
    type OutputData = MoveCommand;
    type StatusReport = StatusReport;
    type ProcError = CmdMapperError;

    /// Initialise the command mapper module.
    ///
    /// Expected init data is the path to the parameter file
    fn init(&mut self, init_data: Self::InitData, session: &Session) -> Result<(), Self::InitError> {
        self.params = params::load(init_data)?;

        // Initialise the archivers. Failure here is not worth aborting the
        // run for, the mapper simply runs unarchived.
        self.arch_report =
            Archiver::from_path(session, "cmd_mapper_status_report.csv").unwrap_or_default();
        self.arch_output = Archiver::from_path(session, "cmd_mapper_output.csv").unwrap_or_default();

        Ok(())
    }

    /// Perform cyclic processing of the command mapper.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        // Clear the status report
        self.report = StatusReport::default();

        // Absent signal maps to the identity command - hold position
        let signal = input_data.signal.unwrap_or(TargetSignal::IDENTITY);

        let (output, report) = map_signal(&self.params, &signal);
        self.report = report;

        trace!(
            "CmdMapper output: ({:.4}, {:.4}, {:.4}, {:.4})",
            output.yaw_rate,
            output.vertical,
            output.lateral,
            output.forward
        );

        self.output = Some(output);

        Ok((output, self.report))
    }
}

impl Archived for CmdMapper {
    fn write(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.arch_report.serialise(self.report)?;
        self.arch_output.serialise(self.output)?;

        Ok(())
    }
}

#[cfg(test)]
impl CmdMapper {
    /// Build a mapper with the given parameters, for tests which have no
    /// session to init from.
    pub(crate) fn with_params(params: Params) -> Self {
        Self {
            params,
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Map a target signal into a movement command.
///
/// Pure and total: every finite or non-finite input produces a command
/// within the vehicle's accepted range. NaN axes are treated as zero (hold
/// that axis), out-of-range axes clamp. Identical inputs always yield
/// identical outputs.
pub fn map_signal(params: &Params, signal: &TargetSignal) -> (MoveCommand, StatusReport) {
    let mut report = StatusReport::default();

    let yaw_rate = map_axis(
        signal.yaw_rate,
        params.rotate_coeff,
        params.max_abs_yaw_rate,
        &mut report.yaw_rate_limited,
    );
    let vertical = map_axis(
        signal.vertical,
        params.move_coeff,
        params.max_abs_vertical,
        &mut report.vertical_limited,
    );
    let lateral = map_axis(
        signal.lateral,
        params.move_coeff,
        params.max_abs_lateral,
        &mut report.lateral_limited,
    );
    let forward = map_axis(
        signal.forward,
        params.move_coeff,
        params.max_abs_forward,
        &mut report.forward_limited,
    );

    (
        MoveCommand {
            yaw_rate,
            vertical,
            lateral,
            forward,
        },
        report,
    )
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Map a single normalised axis into vehicle units.
fn map_axis(raw: f64, coeff: f64, max_abs: f64, limited: &mut bool) -> f64 {
    // NaN means no usable recommendation for this axis - hold it
    let raw = if raw.is_nan() { 0.0 } else { raw };

    // The signal contract is [-1, 1], enforce it before scaling
    let norm = clamp(&raw, &-1.0, &1.0);
    if norm != raw {
        *limited = true;
    }

    let scaled = norm * coeff;

    let out = clamp(&scaled, &-max_abs, &max_abs);
    if out != scaled {
        *limited = true;
    }

    out
}

#[cfg(test)]
mod test {
    use super::*;
    use util::module::State;

    fn test_params() -> Params {
        Params {
            move_coeff: 0.03,
            rotate_coeff: 0.15,
            max_abs_yaw_rate: 0.1,
            max_abs_vertical: 0.02,
            max_abs_lateral: 0.02,
            max_abs_forward: 0.02,
        }
    }

    #[test]
    fn test_map_nominal() {
        let (cmd, report) = map_signal(
            &test_params(),
            &TargetSignal {
                yaw_rate: 0.5,
                vertical: -0.5,
                lateral: 0.0,
                forward: 0.5,
            },
        );

        assert!((cmd.yaw_rate - 0.075).abs() < 1e-9);
        assert!((cmd.vertical + 0.015).abs() < 1e-9);
        assert_eq!(cmd.lateral, 0.0);
        assert!((cmd.forward - 0.015).abs() < 1e-9);
        assert!(!report.yaw_rate_limited);
        assert!(!report.forward_limited);
    }

    #[test]
    fn test_map_is_total() {
        let params = test_params();

        // Extreme, non-finite and NaN inputs all map into the accepted
        // range
        let nasty = [
            f64::NAN,
            f64::INFINITY,
            f64::NEG_INFINITY,
            1e300,
            -1e300,
            2.0,
            -2.0,
        ];

        for &v in nasty.iter() {
            let (cmd, _) = map_signal(
                &params,
                &TargetSignal {
                    yaw_rate: v,
                    vertical: v,
                    lateral: v,
                    forward: v,
                },
            );

            assert!(cmd.yaw_rate.abs() <= params.max_abs_yaw_rate);
            assert!(cmd.vertical.abs() <= params.max_abs_vertical);
            assert!(cmd.lateral.abs() <= params.max_abs_lateral);
            assert!(cmd.forward.abs() <= params.max_abs_forward);
            assert!(cmd.yaw_rate.is_finite());
        }

        // NaN holds the axis rather than deflecting it
        let (cmd, _) = map_signal(
            &params,
            &TargetSignal {
                yaw_rate: f64::NAN,
                vertical: 0.0,
                lateral: 0.0,
                forward: 0.0,
            },
        );
        assert_eq!(cmd.yaw_rate, 0.0);
    }

    #[test]
    fn test_map_is_deterministic() {
        let params = test_params();
        let signal = TargetSignal {
            yaw_rate: 0.123,
            vertical: -0.456,
            lateral: 0.789,
            forward: -0.999,
        };

        let (a, _) = map_signal(&params, &signal);
        let (b, _) = map_signal(&params, &signal);
        assert_eq!(a, b);
    }

    #[test]
    fn test_limit_flags_raised() {
        let (_, report) = map_signal(
            &test_params(),
            &TargetSignal {
                yaw_rate: 5.0,
                vertical: 0.1,
                lateral: -7.0,
                forward: 0.0,
            },
        );

        assert!(report.yaw_rate_limited);
        assert!(!report.vertical_limited);
        assert!(report.lateral_limited);
        assert!(!report.forward_limited);
    }

    #[test]
    fn test_proc_absent_signal_is_identity() {
        let mut mapper = CmdMapper::with_params(test_params());

        let (cmd, _) = mapper.proc(&InputData { signal: None }).unwrap();
        assert_eq!(cmd, MoveCommand::default());
    }
}
