//! # Video Frame Types
//!
//! A `Frame` is one captured image from the vehicle's camera feed. Frames are
//! immutable once captured and are superseded, never merged: only the newest
//! frame matters to the consumer.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use image::{DynamicImage, GenericImageView};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An individual frame from the vehicle's camera
#[derive(Clone)]
pub struct Frame {
    /// UTC timestamp at which the frame was acquired
    pub timestamp: DateTime<Utc>,

    /// The image itself
    pub image: DynamicImage,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Pixel formats a frame may arrive in. This is used rather than exposing the
/// decoder's own colour type to restrict the formats the rest of the software
/// has to handle, and to allow serialisation in telemetry.
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Eq, PartialEq)]
pub enum PixelFormat {
    /// 8-bit greyscale
    Luma8,

    /// 8-bit RGB
    Rgb8,

    /// 8-bit RGB with alpha
    Rgba8,

    /// Any other format supported by the decoder
    Other,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Frame {
    /// Create a new frame from a decoded image, timestamped now.
    pub fn new(image: DynamicImage) -> Self {
        Self {
            timestamp: Utc::now(),
            image,
        }
    }

    /// Width of the frame in pixels
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height of the frame in pixels
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// The pixel format of the frame
    pub fn pixel_format(&self) -> PixelFormat {
        match self.image {
            DynamicImage::ImageLuma8(_) => PixelFormat::Luma8,
            DynamicImage::ImageRgb8(_) => PixelFormat::Rgb8,
            DynamicImage::ImageRgba8(_) => PixelFormat::Rgba8,
            _ => PixelFormat::Other,
        }
    }

    /// Age of the frame relative to now, in seconds.
    pub fn age_s(&self) -> f64 {
        let diff = Utc::now().signed_duration_since(self.timestamp);
        diff.num_milliseconds() as f64 * 0.001
    }
}
