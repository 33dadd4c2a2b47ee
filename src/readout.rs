use nivel_config::ReadoutConfig;
use nivel_level::engine::LevelEngine;
use nivel_level::types::{BubbleOffset, OrientationMode, Reading, ScreenRotation};

/// Angle with one decimal and a degree sign, e.g. `12.3°`.
pub fn format_angle(degrees: f32) -> String {
    format!("{degrees:.1}°")
}

pub fn mode_label(mode: OrientationMode) -> &'static str {
    match mode {
        OrientationMode::Flat => "Flat (lying)",
        OrientationMode::OnEdge => "On edge (standing)",
    }
}

pub fn verdict(is_level: bool) -> &'static str {
    if is_level {
        "LEVEL"
    } else {
        "Adjust position"
    }
}

/// One-axis text gauge: `[....o....]` with the marker at `offset` in [-1, 1].
pub fn gauge(offset: f32, width: u16) -> String {
    let width = width.max(1) as usize;
    let span = (width - 1) as f32;
    let pos = (((offset.clamp(-1.0, 1.0) + 1.0) / 2.0) * span).round() as usize;
    let centre = (width - 1) / 2;

    let cells: String = (0..width)
        .map(|i| match i {
            _ if i == pos => 'o',
            _ if i == centre => '|',
            _ => '.',
        })
        .collect();
    format!("[{cells}]")
}

/// Renders readings as single terminal lines.
pub struct Readout {
    engine: LevelEngine,
    config: ReadoutConfig,
}

impl Readout {
    pub fn new(engine: LevelEngine, config: ReadoutConfig) -> Self {
        Self { engine, config }
    }

    pub fn render(&self, reading: &Reading) -> String {
        let result = &reading.result;
        let mut line = format!(
            "{:<18}  roll {:>7}  pitch {:>7}  {}",
            mode_label(result.mode),
            format_angle(result.roll),
            format_angle(result.pitch),
            verdict(result.is_level),
        );

        if self.config.gauge_width > 0 {
            let BubbleOffset { dx, dy } = self.engine.offset(result);
            line.push_str(&format!(
                "  x{} y{}",
                gauge(dx, self.config.gauge_width),
                gauge(dy, self.config.gauge_width)
            ));
        }

        if self.shows_raw_values(reading) {
            let s = &reading.sample;
            line.push_str(&format!("  X: {:.2} | Y: {:.2} | Z: {:.2}", s.x, s.y, s.z));
        }

        line
    }

    // Raw values only fit the flat, portrait layout.
    fn shows_raw_values(&self, reading: &Reading) -> bool {
        self.config.show_raw_values
            && reading.result.mode == OrientationMode::Flat
            && matches!(
                reading.rotation,
                ScreenRotation::Rotation0 | ScreenRotation::Rotation180
            )
    }
}
