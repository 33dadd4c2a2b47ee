use crate::bubble::{self, DEFAULT_MAX_ANGLE_DEG};
use crate::remap::remap;
use crate::tilt::{self, LEVEL_THRESHOLD_DEG, Z_FLAT_THRESHOLD};
use crate::types::{BubbleOffset, RawSample, ScreenRotation, TiltResult};

/// Tunable limits used by [`LevelEngine`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelThresholds {
    /// |z| (m/s^2) above which the device counts as lying flat.
    pub z_flat: f32,
    /// Exclusive bound (degrees) on both angles for a level verdict.
    pub level_deg: f32,
    /// Tilt (degrees) that maps to a full bubble deflection.
    pub bubble_max_deg: f32,
}

impl Default for LevelThresholds {
    fn default() -> Self {
        Self {
            z_flat: Z_FLAT_THRESHOLD,
            level_deg: LEVEL_THRESHOLD_DEG,
            bubble_max_deg: DEFAULT_MAX_ANGLE_DEG,
        }
    }
}

/// Single-sample accelerometer tilt engine.
///
/// Turns each accelerometer reading into a [`TiltResult`]: remap X/Y into the
/// screen frame, pick flat or on-edge from raw Z, solve the angles, then
/// classify. Holds no state between samples, so it can be copied freely and
/// called from any thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevelEngine {
    thresholds: LevelThresholds,
}

impl LevelEngine {
    pub fn new(thresholds: LevelThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &LevelThresholds {
        &self.thresholds
    }

    /// Process one sample under the given screen rotation.
    pub fn process(&self, sample: &RawSample, rotation: ScreenRotation) -> TiltResult {
        let screen = remap(sample, rotation);
        let mode = tilt::select_mode(sample, self.thresholds.z_flat);
        let (roll, pitch) = tilt::solve(mode, screen.x, screen.y, sample.z);
        let is_level = tilt::is_level(roll, pitch, self.thresholds.level_deg);

        tracing::trace!(
            ?mode,
            %rotation,
            x = sample.x,
            y = sample.y,
            z = sample.z,
            roll,
            pitch,
            is_level,
            "Tilt computed"
        );

        TiltResult {
            mode,
            roll,
            pitch,
            is_level,
        }
    }

    /// Bubble position for a result, using the configured max angle.
    pub fn offset(&self, result: &TiltResult) -> BubbleOffset {
        bubble::map_offset(result.roll, result.pitch, self.thresholds.bubble_max_deg)
    }
}
