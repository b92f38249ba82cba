//! # Shared State
//!
//! The single synchronisation point between the control loop and the
//! analysis worker. It is a single-slot mailbox, not a queue: a publish
//! overwrites whatever was pending, rapid publishes coalesce into one
//! notification, and the slower consumer only ever sees the newest value.
//!
//! The frame slot and the signal cell are guarded separately so that the
//! control loop's non-blocking signal reads can never contend with the
//! worker holding the frame slot open.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use log::{trace, warn};

use crate::analysis::TargetSignal;
use vehicle_if::frame::Frame;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Latest-value mailbox shared between the control loop and the analysis
/// worker. Exactly one instance exists for the lifetime of the process,
/// shared via an `Arc`.
#[derive(Default)]
pub struct SharedState {
    /// The pending frame, `None` if the worker has already taken it
    frame_slot: Mutex<Option<Frame>>,

    /// Notification that a new frame is in the slot
    frame_ready: Condvar,

    /// The most recent analysis result, `None` until the first detection
    /// succeeds
    signal: Mutex<Option<TargetSignal>>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a new frame for the analysis worker.
    ///
    /// Overwrites any frame the worker has not yet taken - frames are
    /// superseded, never queued. Never blocks beyond the short critical
    /// section of the slot itself.
    pub fn publish_frame(&self, frame: Frame) {
        let mut slot = match self.frame_slot.lock() {
            Ok(s) => s,
            Err(e) => {
                warn!("Frame slot poisoned, frame dropped: {}", e);
                return;
            }
        };

        if slot.is_some() {
            trace!("Unprocessed frame superseded");
        }

        *slot = Some(frame);

        // Multiple publishes before the worker wakes coalesce into this one
        // notification.
        self.frame_ready.notify_one();
    }

    /// Take the pending frame, suspending until one is published.
    ///
    /// Only the analysis worker calls this. The slot is cleared by the take,
    /// so no frame is ever delivered twice.
    pub fn take_frame(&self) -> Option<Frame> {
        let mut slot = match self.frame_slot.lock() {
            Ok(s) => s,
            Err(e) => {
                warn!("Frame slot poisoned: {}", e);
                return None;
            }
        };

        loop {
            if let Some(frame) = slot.take() {
                return Some(frame);
            }

            slot = match self.frame_ready.wait(slot) {
                Ok(s) => s,
                Err(e) => {
                    warn!("Frame slot poisoned: {}", e);
                    return None;
                }
            };
        }
    }

    /// As [`SharedState::take_frame`] but giving up after `timeout`, so the
    /// caller can periodically re-check its run flag.
    pub fn take_frame_timeout(&self, timeout: Duration) -> Option<Frame> {
        let deadline = Instant::now() + timeout;

        let mut slot = match self.frame_slot.lock() {
            Ok(s) => s,
            Err(e) => {
                warn!("Frame slot poisoned: {}", e);
                return None;
            }
        };

        loop {
            if let Some(frame) = slot.take() {
                return Some(frame);
            }

            let now = Instant::now();
            if now >= deadline {
                return None;
            }

            slot = match self.frame_ready.wait_timeout(slot, deadline - now) {
                Ok((s, _)) => s,
                Err(e) => {
                    warn!("Frame slot poisoned: {}", e);
                    return None;
                }
            };
        }
    }

    /// Read the most recent analysis result without waiting.
    ///
    /// Returns `None` if analysis has never produced a result. The control
    /// loop must never wait on the worker, and this read cannot: the signal
    /// cell is only ever held for the duration of a copy.
    pub fn read_signal(&self) -> Option<TargetSignal> {
        match self.signal.lock() {
            Ok(s) => *s,
            Err(e) => {
                warn!("Signal cell poisoned: {}", e);
                None
            }
        }
    }

    /// Publish a new analysis result, overwriting the previous one.
    pub fn publish_signal(&self, signal: TargetSignal) {
        match self.signal.lock() {
            Ok(mut s) => *s = Some(signal),
            Err(e) => warn!("Signal cell poisoned, signal dropped: {}", e),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    /// Build a frame tagged by its width so tests can tell them apart.
    fn tagged_frame(tag: u32) -> Frame {
        Frame::new(image::DynamicImage::new_rgb8(tag, 1))
    }

    #[test]
    fn test_publish_coalesces() {
        let shared = SharedState::new();

        // Three rapid publishes while the "worker" is busy
        shared.publish_frame(tagged_frame(1));
        shared.publish_frame(tagged_frame(2));
        shared.publish_frame(tagged_frame(3));

        // Only the newest frame is ever delivered
        let frame = shared.take_frame().unwrap();
        assert_eq!(frame.width(), 3);

        // And it is delivered exactly once - the slot is now empty
        assert!(shared
            .take_frame_timeout(Duration::from_millis(10))
            .is_none());
    }

    #[test]
    fn test_take_frame_wakes_on_publish() {
        let shared = Arc::new(SharedState::new());

        let taker = {
            let shared = shared.clone();
            thread::spawn(move || shared.take_frame().map(|f| f.width()))
        };

        // Give the taker time to block on the condvar
        thread::sleep(Duration::from_millis(20));
        shared.publish_frame(tagged_frame(7));

        assert_eq!(taker.join().unwrap(), Some(7));
    }

    #[test]
    fn test_read_signal_nonblocking_while_worker_waits() {
        let shared = Arc::new(SharedState::new());

        // A worker blocked waiting for a frame must not stall signal reads
        let waiter = {
            let shared = shared.clone();
            thread::spawn(move || shared.take_frame_timeout(Duration::from_millis(200)))
        };

        thread::sleep(Duration::from_millis(20));

        let start = Instant::now();
        assert!(shared.read_signal().is_none());
        shared.publish_signal(TargetSignal {
            yaw_rate: 0.5,
            vertical: 0.0,
            lateral: 0.0,
            forward: 0.0,
        });
        assert_eq!(shared.read_signal().unwrap().yaw_rate, 0.5);
        assert!(start.elapsed() < Duration::from_millis(100));

        assert!(waiter.join().unwrap().is_none());
    }

    #[test]
    fn test_signal_overwrite() {
        let shared = SharedState::new();

        shared.publish_signal(TargetSignal {
            yaw_rate: 0.1,
            vertical: 0.2,
            lateral: 0.3,
            forward: 0.4,
        });
        shared.publish_signal(TargetSignal {
            yaw_rate: -0.1,
            vertical: -0.2,
            lateral: -0.3,
            forward: -0.4,
        });

        // Latest value wins, and reads do not consume it
        assert_eq!(shared.read_signal().unwrap().forward, -0.4);
        assert_eq!(shared.read_signal().unwrap().forward, -0.4);
    }
}
