use crate::types::{OrientationMode, RawSample};

/// |z| above this (m/s^2) means the device is lying flat.
pub const Z_FLAT_THRESHOLD: f32 = 6.0;

/// Both angles must be strictly below this (degrees) to count as level.
pub const LEVEL_THRESHOLD_DEG: f32 = 2.0;

/// Classify placement from the instantaneous gravity vector.
///
/// Uses the raw device-frame Z only, so screen rotation has no effect.
/// There is no hysteresis: every sample is decided on its own.
pub fn select_mode(sample: &RawSample, z_flat_threshold: f32) -> OrientationMode {
    if sample.z.abs() > z_flat_threshold {
        OrientationMode::Flat
    } else {
        OrientationMode::OnEdge
    }
}

/// Compute `(roll, pitch)` in degrees from screen-frame `ax`/`ay` and raw `az`.
///
/// Flat mode measures each horizontal component against Z with `atan2`,
/// which stays defined when `az == 0`. On-edge mode resolves X and Z against
/// the full gravity magnitude; pitch uses Z, not Y.
pub fn solve(mode: OrientationMode, ax: f32, ay: f32, az: f32) -> (f32, f32) {
    match mode {
        OrientationMode::Flat => {
            let roll = ax.atan2(az).to_degrees();
            let pitch = ay.atan2(az).to_degrees();
            (roll, pitch)
        }
        OrientationMode::OnEdge => {
            let norm = (ax * ax + ay * ay + az * az).sqrt();
            if norm == 0.0 {
                return (0.0, 0.0);
            }
            // Rounding can push the ratio just past +-1.
            let roll = (ax / norm).clamp(-1.0, 1.0).asin().to_degrees();
            let pitch = (az / norm).clamp(-1.0, 1.0).asin().to_degrees();
            (roll, pitch)
        }
    }
}

pub fn is_level(roll: f32, pitch: f32, threshold_deg: f32) -> bool {
    roll.abs() < threshold_deg && pitch.abs() < threshold_deg
}
