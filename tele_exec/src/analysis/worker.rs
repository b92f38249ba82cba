//! Analysis worker thread
//!
//! Runs the detector over incoming frames without ever blocking the control
//! loop. The worker may fall behind a fast frame source - superseded frames
//! are dropped by the shared state, never queued, so the worker always sees
//! the newest frame available at the moment it wakes.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use log::{debug, trace, warn};

use super::Detector;
use crate::display::DisplaySink;
use crate::shared_state::SharedState;

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

/// How long the worker waits for a frame before re-checking its run flag.
const FRAME_WAIT_TIMEOUT: Duration = Duration::from_millis(250);

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Analysis worker entry point.
///
/// Cycle: suspend until a frame is ready, take it, run the detector, publish
/// the resulting signal and show the frame on the display. On detection
/// failure the failure is logged, the previous signal is left standing (a
/// failing detector degrades to a stale signal, not to command chatter) and
/// the fallback placeholder is shown instead.
///
/// The worker stops when `run` is cleared. It holds no external resources,
/// so it may also simply be abandoned at process exit.
pub fn worker_thread<D, S>(
    shared: Arc<SharedState>,
    mut detector: D,
    mut display: S,
    run: Arc<AtomicBool>,
) where
    D: Detector,
    S: DisplaySink,
{
    let mut seen_frame = false;

    while run.load(Ordering::Relaxed) {
        let frame = match shared.take_frame_timeout(FRAME_WAIT_TIMEOUT) {
            Some(f) => f,
            None => {
                // No video yet - show the placeholder until the first frame
                // arrives
                if !seen_frame {
                    display.show_placeholder();
                }
                continue;
            }
        };

        seen_frame = true;

        match detector.detect(&frame) {
            Ok(signal) => {
                shared.publish_signal(signal);
                trace!(
                    "Analysis complete, signal: ({:.3}, {:.3}, {:.3}, {:.3})",
                    signal.yaw_rate,
                    signal.vertical,
                    signal.lateral,
                    signal.forward
                );
                display.show_frame(&frame);
            }
            Err(e) => {
                warn!("Detection failed: {}", e);
                display.show_placeholder();
            }
        }
    }

    debug!("Analysis worker stopped");
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::analysis::{DetectError, FixedDetector, TargetSignal};
    use std::sync::Mutex;
    use std::thread;
    use vehicle_if::frame::Frame;

    /// Display sink recording how it was driven.
    #[derive(Clone, Default)]
    struct CountingDisplay {
        frames: Arc<Mutex<u32>>,
        placeholders: Arc<Mutex<u32>>,
    }

    impl DisplaySink for CountingDisplay {
        fn show_frame(&mut self, _frame: &Frame) {
            *self.frames.lock().unwrap() += 1;
        }

        fn show_placeholder(&mut self) {
            *self.placeholders.lock().unwrap() += 1;
        }
    }

    /// A detector which always raises.
    struct FailingDetector;

    impl Detector for FailingDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<TargetSignal, DetectError> {
            Err(DetectError::AlgorithmError(String::from("broken")))
        }
    }

    fn test_frame() -> Frame {
        Frame::new(image::DynamicImage::new_rgb8(8, 8))
    }

    #[test]
    fn test_worker_publishes_on_success() {
        let shared = Arc::new(SharedState::new());
        let run = Arc::new(AtomicBool::new(true));
        let display = CountingDisplay::default();

        let detector = FixedDetector {
            signal: TargetSignal {
                yaw_rate: 0.1,
                vertical: 0.0,
                lateral: 0.0,
                forward: 0.2,
            },
        };

        let jh = {
            let shared = shared.clone();
            let run = run.clone();
            let display = display.clone();
            thread::spawn(move || worker_thread(shared, detector, display, run))
        };

        shared.publish_frame(test_frame());

        // Wait for the signal to appear
        let mut signal = None;
        for _ in 0..100 {
            signal = shared.read_signal();
            if signal.is_some() {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }

        run.store(false, Ordering::Relaxed);
        jh.join().unwrap();

        let signal = signal.expect("worker never published a signal");
        assert_eq!(signal.yaw_rate, 0.1);
        assert_eq!(signal.forward, 0.2);
        assert!(*display.frames.lock().unwrap() >= 1);
    }

    #[test]
    fn test_worker_failure_keeps_prior_signal() {
        let shared = Arc::new(SharedState::new());
        let run = Arc::new(AtomicBool::new(true));
        let display = CountingDisplay::default();

        // Seed a last-known-good signal
        let prior = TargetSignal {
            yaw_rate: 0.3,
            vertical: 0.0,
            lateral: 0.0,
            forward: 0.0,
        };
        shared.publish_signal(prior);

        let jh = {
            let shared = shared.clone();
            let run = run.clone();
            let display = display.clone();
            thread::spawn(move || worker_thread(shared, FailingDetector, display, run))
        };

        // Feed a few frames, each of which will fail detection
        for _ in 0..3 {
            shared.publish_frame(test_frame());
            thread::sleep(Duration::from_millis(20));
        }

        run.store(false, Ordering::Relaxed);
        jh.join().unwrap();

        // The prior signal stands, the placeholder was shown, and no frame
        // was rendered as live video
        assert_eq!(shared.read_signal(), Some(prior));
        assert!(*display.placeholders.lock().unwrap() >= 1);
        assert_eq!(*display.frames.lock().unwrap(), 0);
    }
}
