use crate::types::BubbleOffset;

/// Tilt (degrees) that pushes the bubble all the way to the rim.
pub const DEFAULT_MAX_ANGLE_DEG: f32 = 30.0;

/// Map roll/pitch to a normalized bubble offset.
///
/// Linear in each axis, saturating at `max_angle`. A non-positive or
/// non-finite `max_angle` uses [`DEFAULT_MAX_ANGLE_DEG`].
pub fn map_offset(roll: f32, pitch: f32, max_angle: f32) -> BubbleOffset {
    let max_angle = if max_angle.is_finite() && max_angle > 0.0 {
        max_angle
    } else {
        DEFAULT_MAX_ANGLE_DEG
    };
    BubbleOffset {
        dx: normalize(roll, max_angle),
        dy: normalize(pitch, max_angle),
    }
}

fn normalize(angle: f32, max_angle: f32) -> f32 {
    let v = (angle / max_angle).clamp(-1.0, 1.0);
    // NaN angles park the bubble in the centre.
    if v.is_nan() {
        0.0
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saturates_at_max_angle() {
        assert_eq!(map_offset(30.0, 30.0, DEFAULT_MAX_ANGLE_DEG), BubbleOffset { dx: 1.0, dy: 1.0 });
        assert_eq!(map_offset(-45.0, 0.0, DEFAULT_MAX_ANGLE_DEG), BubbleOffset { dx: -1.0, dy: 0.0 });
    }

    #[test]
    fn linear_inside_range() {
        let o = map_offset(15.0, -7.5, DEFAULT_MAX_ANGLE_DEG);
        assert!((o.dx - 0.5).abs() < 1e-6);
        assert!((o.dy + 0.25).abs() < 1e-6);
    }

    #[test]
    fn output_always_in_unit_square() {
        let angles = [f32::NEG_INFINITY, -1e9, -90.0, -2.0, 0.0, 0.1, 29.9, 90.0, 1e9, f32::NAN];
        for &roll in &angles {
            for &pitch in &angles {
                for max in [30.0, 5.0, 0.0, -1.0, f32::NAN] {
                    let o = map_offset(roll, pitch, max);
                    assert!((-1.0..=1.0).contains(&o.dx), "dx {}", o.dx);
                    assert!((-1.0..=1.0).contains(&o.dy), "dy {}", o.dy);
                }
            }
        }
    }

    #[test]
    fn bad_max_angle_uses_default() {
        assert_eq!(map_offset(15.0, 0.0, 0.0), map_offset(15.0, 0.0, DEFAULT_MAX_ANGLE_DEG));
        assert_eq!(map_offset(15.0, 0.0, f32::INFINITY), map_offset(15.0, 0.0, DEFAULT_MAX_ANGLE_DEG));
    }
}
