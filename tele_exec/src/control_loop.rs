//! # Control Loop
//!
//! The fixed-period driver of the whole system. Each tick polls the vehicle
//! for a frame, hands it to the analysis worker through the shared state,
//! reads back the latest signal without waiting, maps it into a movement
//! command, dispatches it, and processes the operator's inputs. The loop is
//! the master clock; the analysis worker is purely reactive relative to it
//! and the loop never waits on it.
//!
//! All link and analysis failures are logged and survived - a single
//! dropped command does not abort teleoperation. The only way out of the
//! loop is the operator's shutdown input.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::thread;
use std::time::{Duration, Instant};

use log::{info, trace, warn};

use crate::analysis::TargetSignal;
use crate::data_store::DataStore;
use crate::operator::{rising_edge_actions, OperatorInput};
use crate::params::TeleExecParams;
use crate::shared_state::SharedState;
use util::archive::Archived;
use util::module::State;
use util::session;
use vehicle_if::cmds::{ManualAxes, VehicleAction, VehicleResponse};
use vehicle_if::link::VehicleLink;

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Run the control loop until the operator requests shutdown.
///
/// Timing is best-effort fixed cadence: the loop sleeps for the remainder
/// of the period after each tick, with no guarantee against scheduling
/// jitter. Overruns are counted and warned about, not punished.
pub fn run<L, O>(
    ds: &mut DataStore,
    params: &TeleExecParams,
    link: &mut L,
    operator: &mut O,
    shared: &SharedState,
) where
    L: VehicleLink,
    O: OperatorInput,
{
    let cycle_frequency_hz = 1.0 / params.cycle_period_s;

    info!("Begining control loop\n");

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start(cycle_frequency_hz);

        // ---- FRAME ACQUISITION ----

        // Poll the link once, non-blocking. No new frame is not an error,
        // the previous frame and signal simply stand.
        match link.get_frame() {
            Ok(Some(frame)) => shared.publish_frame(frame),
            Ok(None) => (),
            Err(e) => warn!("Could not poll for a frame: {}", e),
        }

        // ---- SIGNAL SELECTION ----

        // While manual control is enabled the operator's axes (as sampled
        // last tick) override the analysis signal.
        let signal = if ds.manual_ctrl_enabled {
            Some(manual_signal(&ds.prev_op_snapshot.axes))
        } else {
            shared.read_signal()
        };

        ds.latest_signal = signal;
        ds.cmd_mapper_input.signal = signal;

        // ---- COMMAND MAPPING ----

        match ds.cmd_mapper.proc(&ds.cmd_mapper_input) {
            Ok((o, r)) => {
                ds.cmd_mapper_output = o;
                ds.cmd_mapper_status_rpt = r;
            }
            // The mapper cannot fail by construction
            Err(e) => match e {},
        }

        // ---- COMMAND DISPATCH ----

        match link.move_cmd(&ds.cmd_mapper_output, true) {
            Ok(VehicleResponse::Ok) => ds.num_consec_link_errors = 0,
            Ok(VehicleResponse::Rejected(r)) => trace!("Move command rejected: {}", r),
            Err(e) => {
                warn!("Could not dispatch move command: {}", e);
                ds.num_consec_link_errors += 1;
            }
        }

        // ---- OPERATOR PROCESSING ----

        let snapshot = operator.sample();

        // Discrete actions fire on rising edges only, at most once per tick
        // per action
        for action in rising_edge_actions(&ds.prev_op_snapshot, &snapshot) {
            match link.exec_action(action, true) {
                Ok(VehicleResponse::Ok) => {
                    info!("{:?} acknowledged by the vehicle", action);
                    match action {
                        VehicleAction::EnableManualControl => ds.manual_ctrl_enabled = true,
                        VehicleAction::DisableManualControl => ds.manual_ctrl_enabled = false,
                        _ => (),
                    }
                }
                Ok(VehicleResponse::Rejected(r)) => {
                    warn!("{:?} rejected by the vehicle: {}", action, r)
                }
                Err(e) => {
                    warn!("Could not dispatch {:?}: {}", action, e);
                    ds.num_consec_link_errors += 1;
                }
            }
        }

        let shutdown = snapshot.shutdown;
        ds.prev_op_snapshot = snapshot;

        // ---- TELEMETRY ----

        if ds.is_1_hz_cycle {
            session::save(format!("tm/tm_{:08}.json", ds.num_cycles), ds.telemetry());
        }

        if let Err(e) = ds.cmd_mapper.write() {
            warn!("Could not archive command mapper data: {}", e);
        }

        // ---- SHUTDOWN CHECK ----

        if shutdown {
            info!("Operator shutdown requested, stopping");
            break;
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        match Duration::from_secs_f64(params.cycle_period_s).checked_sub(cycle_dur) {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            }
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - params.cycle_period_s
                );
                ds.num_consec_cycle_overruns += 1;
            }
        }

        // Increment cycle counter
        ds.num_cycles += 1;
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Turn the operator's manual axes into a target signal.
fn manual_signal(axes: &ManualAxes) -> TargetSignal {
    TargetSignal {
        yaw_rate: axes.yaw,
        vertical: axes.up_down,
        lateral: axes.lateral,
        forward: axes.forward_back,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::analysis::{worker_thread, DetectError, Detector, FixedDetector};
    use crate::cmd_mapper::{self, CmdMapper};
    use crate::display::NullDisplay;
    use crate::operator::OperatorSnapshot;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use vehicle_if::cmds::MoveCommand;
    use vehicle_if::frame::Frame;
    use vehicle_if::link::LinkError;

    // ---- MOCKS ----

    /// Vehicle link recording everything dispatched to it.
    struct MockLink {
        moves: Vec<MoveCommand>,
        actions: Vec<VehicleAction>,
        frames: VecDeque<Frame>,
        drops: Arc<AtomicUsize>,
    }

    impl MockLink {
        fn new(frames: Vec<Frame>) -> Self {
            Self {
                moves: vec![],
                actions: vec![],
                frames: frames.into(),
                drops: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl Drop for MockLink {
        fn drop(&mut self) {
            self.drops.fetch_add(1, Ordering::Relaxed);
        }
    }

    impl VehicleLink for MockLink {
        fn takeoff(&mut self, _w: bool) -> Result<VehicleResponse, LinkError> {
            self.actions.push(VehicleAction::Takeoff);
            Ok(VehicleResponse::Ok)
        }

        fn land(&mut self, _w: bool) -> Result<VehicleResponse, LinkError> {
            self.actions.push(VehicleAction::Land);
            Ok(VehicleResponse::Ok)
        }

        fn enable_manual_control(&mut self, _w: bool) -> Result<VehicleResponse, LinkError> {
            self.actions.push(VehicleAction::EnableManualControl);
            Ok(VehicleResponse::Ok)
        }

        fn disable_manual_control(&mut self, _w: bool) -> Result<VehicleResponse, LinkError> {
            self.actions.push(VehicleAction::DisableManualControl);
            Ok(VehicleResponse::Ok)
        }

        fn move_cmd(
            &mut self,
            cmd: &MoveCommand,
            _w: bool,
        ) -> Result<VehicleResponse, LinkError> {
            self.moves.push(*cmd);
            Ok(VehicleResponse::Ok)
        }

        fn get_frame(&mut self) -> Result<Option<Frame>, LinkError> {
            Ok(self.frames.pop_front())
        }
    }

    /// Operator replaying a fixed sequence of snapshots, then asserting
    /// shutdown forever.
    struct SequencedOperator {
        snapshots: VecDeque<OperatorSnapshot>,
    }

    impl SequencedOperator {
        /// `n` idle ticks followed by shutdown.
        fn idle_then_shutdown(n: usize) -> Self {
            Self {
                snapshots: (0..n).map(|_| OperatorSnapshot::default()).collect(),
            }
        }

        fn from_snapshots(snapshots: Vec<OperatorSnapshot>) -> Self {
            Self {
                snapshots: snapshots.into(),
            }
        }
    }

    impl OperatorInput for SequencedOperator {
        fn sample(&mut self) -> OperatorSnapshot {
            self.snapshots.pop_front().unwrap_or(OperatorSnapshot {
                shutdown: true,
                ..Default::default()
            })
        }
    }

    /// A detector which always raises.
    struct FailingDetector;

    impl Detector for FailingDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<TargetSignal, DetectError> {
            Err(DetectError::AlgorithmError(String::from("broken")))
        }
    }

    // ---- HELPERS ----

    fn test_mapper_params() -> cmd_mapper::Params {
        cmd_mapper::Params {
            move_coeff: 0.03,
            rotate_coeff: 0.15,
            max_abs_yaw_rate: 1.0,
            max_abs_vertical: 1.0,
            max_abs_lateral: 1.0,
            max_abs_forward: 1.0,
        }
    }

    fn test_data_store() -> DataStore {
        DataStore {
            cmd_mapper: CmdMapper::with_params(test_mapper_params()),
            ..Default::default()
        }
    }

    fn fast_params() -> TeleExecParams {
        TeleExecParams {
            cycle_period_s: 0.005,
            ..Default::default()
        }
    }

    fn test_frame() -> Frame {
        Frame::new(image::DynamicImage::new_rgb8(8, 8))
    }

    // ---- SCENARIOS ----

    /// No frames ever: the loop still dispatches the identity command every
    /// tick and never crashes.
    #[test]
    fn test_no_frames_dispatches_identity() {
        let mut ds = test_data_store();
        let mut link = MockLink::new(vec![]);
        let mut operator = SequencedOperator::idle_then_shutdown(5);
        let shared = SharedState::new();

        run(&mut ds, &fast_params(), &mut link, &mut operator, &shared);

        // One move per tick, including the shutdown tick
        assert_eq!(link.moves.len(), 6);
        for cmd in &link.moves {
            assert_eq!(*cmd, MoveCommand::default());
        }
    }

    /// One frame, one successful detection: every subsequent tick keeps
    /// dispatching the command derived from that signal.
    #[test]
    fn test_single_detection_signal_persists() {
        let mut ds = test_data_store();
        let mut link = MockLink::new(vec![test_frame()]);
        let mut operator = SequencedOperator::idle_then_shutdown(40);
        let shared = Arc::new(SharedState::new());

        let detector = FixedDetector {
            signal: TargetSignal {
                yaw_rate: 0.1,
                vertical: 0.0,
                lateral: 0.0,
                forward: 0.2,
            },
        };

        let worker_run = Arc::new(AtomicBool::new(true));
        let jh = {
            let shared = shared.clone();
            let worker_run = worker_run.clone();
            thread::spawn(move || worker_thread(shared, detector, NullDisplay, worker_run))
        };

        run(&mut ds, &fast_params(), &mut link, &mut operator, &shared);

        worker_run.store(false, Ordering::Relaxed);
        jh.join().unwrap();

        let expected = MoveCommand {
            yaw_rate: 0.1 * 0.15,
            vertical: 0.0,
            lateral: 0.0,
            forward: 0.2 * 0.03,
        };

        // The signal appears within the run and then never changes (no
        // further frames arrived to supersede it)
        let first = link
            .moves
            .iter()
            .position(|c| *c == expected)
            .expect("the detected signal never reached the link");
        for cmd in &link.moves[first..] {
            assert_eq!(*cmd, expected);
        }
    }

    /// Operator shutdown: the loop exits on the tick the flag is seen, and
    /// the link is released exactly once.
    #[test]
    fn test_shutdown_exits_within_tick() {
        let mut ds = test_data_store();
        let mut link = MockLink::new(vec![]);
        let mut operator = SequencedOperator::idle_then_shutdown(3);
        let shared = SharedState::new();

        run(&mut ds, &fast_params(), &mut link, &mut operator, &shared);

        // Ticks 0..=2 idle, tick 3 shuts down - no further dispatches
        assert_eq!(link.moves.len(), 4);
        assert_eq!(ds.num_cycles, 3);

        let drops = link.drops.clone();
        drop(link);
        assert_eq!(drops.load(Ordering::Relaxed), 1);
    }

    /// A detector that raises on every call: the command stream is
    /// unaffected and no signal is ever published.
    #[test]
    fn test_failing_detector_leaves_command_stream_untouched() {
        let mut ds = test_data_store();
        let frames = (0..20).map(|_| test_frame()).collect();
        let mut link = MockLink::new(frames);
        let mut operator = SequencedOperator::idle_then_shutdown(20);
        let shared = Arc::new(SharedState::new());

        let worker_run = Arc::new(AtomicBool::new(true));
        let jh = {
            let shared = shared.clone();
            let worker_run = worker_run.clone();
            thread::spawn(move || worker_thread(shared, FailingDetector, NullDisplay, worker_run))
        };

        run(&mut ds, &fast_params(), &mut link, &mut operator, &shared);

        worker_run.store(false, Ordering::Relaxed);
        jh.join().unwrap();

        assert!(shared.read_signal().is_none());
        for cmd in &link.moves {
            assert_eq!(*cmd, MoveCommand::default());
        }
    }

    /// Held operator flags dispatch once, on the rising edge only.
    #[test]
    fn test_edge_triggered_actions() {
        let mut ds = test_data_store();
        let mut link = MockLink::new(vec![]);
        let takeoff = OperatorSnapshot {
            takeoff: true,
            ..Default::default()
        };
        let mut operator = SequencedOperator::from_snapshots(vec![
            takeoff,
            takeoff,
            takeoff,
            OperatorSnapshot::default(),
        ]);
        let shared = SharedState::new();

        run(&mut ds, &fast_params(), &mut link, &mut operator, &shared);

        assert_eq!(link.actions, vec![VehicleAction::Takeoff]);
    }

    /// While manual control is enabled the operator's axes drive the move
    /// command, taking effect the tick after they are sampled.
    #[test]
    fn test_manual_axes_override() {
        let mut ds = test_data_store();
        let mut link = MockLink::new(vec![]);

        let manual = OperatorSnapshot {
            enable_manual_ctrl: true,
            axes: ManualAxes {
                forward_back: 1.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let held = OperatorSnapshot {
            axes: manual.axes,
            ..Default::default()
        };

        let mut operator = SequencedOperator::from_snapshots(vec![manual, held, held]);
        let shared = SharedState::new();

        run(&mut ds, &fast_params(), &mut link, &mut operator, &shared);

        assert!(ds.manual_ctrl_enabled);
        // Tick 0 had no override yet, ticks 1.. map the held axes
        assert_eq!(link.moves[0], MoveCommand::default());
        assert!((link.moves[1].forward - 0.03).abs() < 1e-9);
        assert!((link.moves[2].forward - 0.03).abs() < 1e-9);
    }
}
