//! Pluggable target detection
//!
//! The actual detection algorithm is an external collaborator: anything
//! implementing [`Detector`] can be plugged into the analysis worker.
//! Failures are caught at the worker boundary and never cross into the
//! control loop.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use thiserror::Error;

// Internal
use super::TargetSignal;
use util::maths::{clamp, lin_map};
use vehicle_if::frame::Frame;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors raised by a detector.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("No target visible in the frame")]
    NoTarget,

    #[error("The frame could not be analysed: {0}")]
    FrameInvalid(String),

    #[error("Detection algorithm failure: {0}")]
    AlgorithmError(String),
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A target detection algorithm.
pub trait Detector: Send {
    /// Derive a movement recommendation from the given frame.
    fn detect(&mut self, frame: &Frame) -> Result<TargetSignal, DetectError>;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A detector returning a constant signal regardless of the frame.
///
/// Stand-in for a real detection algorithm during development, and a handy
/// tool for testing the pipeline end to end.
#[derive(Clone, Copy, Default)]
pub struct FixedDetector {
    pub signal: TargetSignal,
}

/// A minimal real detector: steers toward the brightest region of the
/// frame.
///
/// The frame is collapsed to greyscale and the centroid of all pixels above
/// the luma threshold is computed. The horizontal offset of the centroid
/// from the frame centre drives the yaw axis, the vertical offset drives
/// the vertical axis. Lateral and forward are left at zero - this detector
/// only points the vehicle at the target.
pub struct LumaCentroidDetector {
    /// Pixels at or above this luma value count as "target"
    pub luma_threshold: u8,
}

impl Default for LumaCentroidDetector {
    fn default() -> Self {
        Self {
            luma_threshold: 200,
        }
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Detector for FixedDetector {
    fn detect(&mut self, _frame: &Frame) -> Result<TargetSignal, DetectError> {
        Ok(self.signal)
    }
}

impl Detector for LumaCentroidDetector {
    fn detect(&mut self, frame: &Frame) -> Result<TargetSignal, DetectError> {
        if frame.width() == 0 || frame.height() == 0 {
            return Err(DetectError::FrameInvalid(String::from(
                "frame has zero size",
            )));
        }

        let luma = frame.image.to_luma8();

        // Accumulate the centroid of all above-threshold pixels
        let mut sum_x = 0u64;
        let mut sum_y = 0u64;
        let mut count = 0u64;

        for (x, y, pixel) in luma.enumerate_pixels() {
            if pixel.0[0] >= self.luma_threshold {
                sum_x += x as u64;
                sum_y += y as u64;
                count += 1;
            }
        }

        if count == 0 {
            return Err(DetectError::NoTarget);
        }

        let centroid_x = sum_x as f64 / count as f64;
        let centroid_y = sum_y as f64 / count as f64;

        // Normalised offsets from the frame centre, in [-1, 1]. Image rows
        // grow downwards so the vertical axis is inverted.
        let w = frame.width() as f64;
        let h = frame.height() as f64;

        let yaw_rate = clamp(&lin_map((0.0, w), (-1.0, 1.0), centroid_x), &-1.0, &1.0);
        let vertical = clamp(&lin_map((0.0, h), (1.0, -1.0), centroid_y), &-1.0, &1.0);

        Ok(TargetSignal {
            yaw_rate,
            vertical,
            lateral: 0.0,
            forward: 0.0,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use image::{DynamicImage, GrayImage, Luma};

    /// Build a dark frame with a single bright pixel at the given position.
    fn frame_with_spot(w: u32, h: u32, x: u32, y: u32) -> Frame {
        let mut img = GrayImage::new(w, h);
        img.put_pixel(x, y, Luma([255u8]));
        Frame::new(DynamicImage::ImageLuma8(img))
    }

    #[test]
    fn test_centroid_steers_toward_target() {
        let mut det = LumaCentroidDetector::default();

        // Target right of centre and above centre
        let sig = det.detect(&frame_with_spot(100, 100, 90, 10)).unwrap();
        assert!(sig.yaw_rate > 0.0);
        assert!(sig.vertical > 0.0);

        // Target left of centre and below centre
        let sig = det.detect(&frame_with_spot(100, 100, 10, 90)).unwrap();
        assert!(sig.yaw_rate < 0.0);
        assert!(sig.vertical < 0.0);

        // Signals are always normalised
        assert!(sig.yaw_rate >= -1.0 && sig.yaw_rate <= 1.0);
        assert!(sig.vertical >= -1.0 && sig.vertical <= 1.0);
    }

    #[test]
    fn test_centroid_no_target() {
        let mut det = LumaCentroidDetector::default();
        let dark = Frame::new(DynamicImage::ImageLuma8(GrayImage::new(64, 64)));

        assert!(matches!(det.detect(&dark), Err(DetectError::NoTarget)));
    }
}
