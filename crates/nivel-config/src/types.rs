use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Engine thresholds.
    pub level: LevelConfig,
    /// Sample input settings.
    pub feed: FeedConfig,
    /// Terminal readout settings.
    pub readout: ReadoutConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// |z| in m/s^2 above which the device is treated as lying flat.
    /// Calibrated against standard gravity (~9.8).
    pub z_flat_threshold: f32,
    /// Roll and pitch must both be strictly below this (degrees) to read as level.
    pub level_threshold_deg: f32,
    /// Tilt in degrees that moves the bubble to the rim.
    pub bubble_max_angle_deg: f32,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            z_flat_threshold: 6.0,
            level_threshold_deg: 2.0,
            bubble_max_angle_deg: 30.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Screen rotation (0, 90, 180 or 270) for samples that don't carry one.
    pub default_rotation_deg: i32,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            default_rotation_deg: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadoutConfig {
    /// Show raw X/Y/Z values while lying flat.
    pub show_raw_values: bool,
    /// Width in characters of the text bubble gauge (0 disables it).
    pub gauge_width: u16,
}

impl Default for ReadoutConfig {
    fn default() -> Self {
        Self {
            show_raw_values: true,
            gauge_width: 21,
        }
    }
}
