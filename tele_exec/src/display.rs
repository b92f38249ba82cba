//! # Display Sinks
//!
//! Operator monitoring output. The analysis worker pushes one frame (or the
//! fallback placeholder) per analysis cycle into a display sink; what the
//! sink does with it is its own business and failures never reach the
//! worker's control flow.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::path::PathBuf;
use std::time::{Duration, Instant};

use image::{imageops::FilterType, DynamicImage, Rgb, RgbImage};
use log::warn;

use util::session::Session;
use vehicle_if::frame::Frame;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Size of the generated "no video" placeholder image.
const PLACEHOLDER_SIZE: (u32, u32) = (480, 270);

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A sink for operator monitoring frames.
pub trait DisplaySink: Send {
    /// Show a live video frame.
    fn show_frame(&mut self, frame: &Frame);

    /// Show the fallback placeholder (no video / analysis failed).
    fn show_placeholder(&mut self);
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A display sink that discards everything.
#[derive(Clone, Copy, Default)]
pub struct NullDisplay;

/// A display sink writing downscaled PNG monitoring frames into the
/// session's `frames` directory, rate-limited so a fast analysis cycle
/// doesn't flood the disk.
pub struct SessionDisplay {
    frames_root: PathBuf,

    /// Downscale factor applied to live frames before writing
    scale_factor: f64,

    /// Minimum interval between written frames
    min_period: Duration,

    last_write: Option<Instant>,

    /// Monotonic counter used to name the written frames
    frame_count: u64,

    /// The placeholder is only written once per run
    placeholder_written: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DisplaySink for NullDisplay {
    fn show_frame(&mut self, _frame: &Frame) {}

    fn show_placeholder(&mut self) {}
}

impl SessionDisplay {
    /// Create a new display writing into the given session.
    ///
    /// `scale_factor` is the downscale applied to live frames (e.g. 0.25),
    /// `max_rate_hz` bounds how often frames are written.
    pub fn new(session: &Session, scale_factor: f64, max_rate_hz: f64) -> Self {
        Self {
            frames_root: session.frames_root.clone(),
            scale_factor,
            min_period: Duration::from_secs_f64(1.0 / max_rate_hz),
            last_write: None,
            frame_count: 0,
            placeholder_written: false,
        }
    }

    /// Rate limit check, true if a frame may be written now.
    fn may_write(&mut self) -> bool {
        match self.last_write {
            Some(t) if t.elapsed() < self.min_period => false,
            _ => {
                self.last_write = Some(Instant::now());
                true
            }
        }
    }

    fn write_image(&mut self, image: &DynamicImage, name: &str) {
        let mut path = self.frames_root.clone();
        path.push(name);

        if let Err(e) = image.save(&path) {
            warn!("Could not write monitoring frame {:?}: {}", path, e);
        }
    }

    /// Build the dark "no video" placeholder.
    fn placeholder_image() -> DynamicImage {
        let (w, h) = PLACEHOLDER_SIZE;
        DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([16u8, 16u8, 16u8])))
    }
}

impl DisplaySink for SessionDisplay {
    fn show_frame(&mut self, frame: &Frame) {
        if !self.may_write() {
            return;
        }

        let width = (frame.width() as f64 * self.scale_factor).max(1.0) as u32;
        let height = (frame.height() as f64 * self.scale_factor).max(1.0) as u32;

        let scaled = frame.image.resize(width, height, FilterType::Triangle);

        let name = format!("frame_{:06}.png", self.frame_count);
        self.frame_count += 1;

        self.write_image(&scaled, &name);
    }

    fn show_placeholder(&mut self) {
        if self.placeholder_written {
            return;
        }
        self.placeholder_written = true;

        let placeholder = Self::placeholder_image();
        self.write_image(&placeholder, "no_video.png");
    }
}
