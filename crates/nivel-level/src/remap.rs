//! Device frame to screen frame compensation.
//!
//! The accelerometer reports in a frame fixed to the device body, while
//! "left/right" and "forward/back" follow whatever orientation is currently
//! displayed. Each screen rotation is a fixed quarter turn of the X/Y plane;
//! Z is untouched.

use crate::types::{RawSample, ScreenRotation};
use glam::Vec2;

/// Rotate the sample's X/Y components into the screen frame.
pub fn remap(sample: &RawSample, rotation: ScreenRotation) -> Vec2 {
    let (x, y) = (sample.x, sample.y);
    match rotation {
        ScreenRotation::Rotation0 => Vec2::new(x, y),
        ScreenRotation::Rotation90 => Vec2::new(-y, x),
        ScreenRotation::Rotation180 => Vec2::new(-x, -y),
        ScreenRotation::Rotation270 => Vec2::new(y, -x),
    }
}
