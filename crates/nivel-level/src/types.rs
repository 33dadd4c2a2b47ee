use glam::Vec3;
use std::fmt;

/// Raw accelerometer reading in the device frame (m/s^2).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawSample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl RawSample {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn as_vec3(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    pub fn is_finite(&self) -> bool {
        self.as_vec3().is_finite()
    }
}

/// Display rotation relative to the device's natural orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScreenRotation {
    #[default]
    Rotation0,
    Rotation90,
    Rotation180,
    Rotation270,
}

impl ScreenRotation {
    pub const ALL: [ScreenRotation; 4] = [
        ScreenRotation::Rotation0,
        ScreenRotation::Rotation90,
        ScreenRotation::Rotation180,
        ScreenRotation::Rotation270,
    ];

    /// Build from a rotation in degrees. Anything other than 0/90/180/270
    /// falls back to `Rotation0`.
    pub fn from_degrees(degrees: i32) -> Self {
        match degrees {
            0 => Self::Rotation0,
            90 => Self::Rotation90,
            180 => Self::Rotation180,
            270 => Self::Rotation270,
            other => {
                tracing::warn!(degrees = other, "Unknown screen rotation, assuming 0");
                Self::Rotation0
            }
        }
    }

    /// Build from a platform surface index (0..=3, quarter turns).
    pub fn from_surface_index(index: u8) -> Self {
        match index {
            0 => Self::Rotation0,
            1 => Self::Rotation90,
            2 => Self::Rotation180,
            3 => Self::Rotation270,
            other => {
                tracing::warn!(index = other, "Unknown surface rotation index, assuming 0");
                Self::Rotation0
            }
        }
    }

    pub fn degrees(self) -> i32 {
        match self {
            Self::Rotation0 => 0,
            Self::Rotation90 => 90,
            Self::Rotation180 => 180,
            Self::Rotation270 => 270,
        }
    }

    /// The rotation that undoes this one.
    pub fn inverse(self) -> Self {
        match self {
            Self::Rotation0 => Self::Rotation0,
            Self::Rotation90 => Self::Rotation270,
            Self::Rotation180 => Self::Rotation180,
            Self::Rotation270 => Self::Rotation90,
        }
    }
}

impl fmt::Display for ScreenRotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Physical placement model used to interpret a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrientationMode {
    /// Lying face up or down; gravity mostly on device Z.
    Flat,
    /// Standing on an edge; gravity mostly on device X/Y.
    OnEdge,
}

/// Engine output for a single sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TiltResult {
    pub mode: OrientationMode,
    /// Lateral tilt in degrees.
    pub roll: f32,
    /// Frontal tilt in degrees.
    pub pitch: f32,
    pub is_level: bool,
}

/// Normalized bubble position, both axes in [-1, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BubbleOffset {
    pub dx: f32,
    pub dy: f32,
}

/// A processed sample as published by the level client.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub sample: RawSample,
    pub rotation: ScreenRotation,
    pub result: TiltResult,
}
