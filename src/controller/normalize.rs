//! Deadzone and response curve for one pair of axes

use serde::{Deserialize, Serialize};

/// Deadzone and response of one axis pair
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisTuning {
    /// Radial deadzone as a fraction of full deflection (0.0 - 1.0)
    pub deadzone: f32,
    /// Exponent of the response curve, 1.0 is linear
    pub response: f32,
}

impl Default for AxisTuning {
    fn default() -> Self {
        Self {
            deadzone: 0.10, // 10 %
            response: 1.0,
        }
    }
}

/// Maps a raw signed 16-bit sample onto [-1, 1]
pub fn normalize_sample(raw: i16) -> f32 {
    (f32::from(raw) + 0.5) / 32767.5
}

/// Radial deadzone with rescale, clamp, then the power curve.
pub fn process_input(raw_x: i16, raw_y: i16, tuning: AxisTuning) -> (f32, f32) {
    let x = normalize_sample(raw_x);
    let y = normalize_sample(raw_y);

    let magnitude = (x * x + y * y).sqrt();
    if magnitude < tuning.deadzone || magnitude <= f32::EPSILON {
        return (0.0, 0.0);
    }

    let live_range = 1.0 - tuning.deadzone;
    let scaled = if live_range > f32::EPSILON {
        (magnitude - tuning.deadzone) / live_range
    } else {
        1.0
    };
    let (nx, ny) = (x / magnitude, y / magnitude);

    let out_x = (nx * scaled).clamp(-1.0, 1.0);
    let out_y = (ny * scaled).clamp(-1.0, 1.0);
    (
        apply_response(out_x, tuning.response),
        apply_response(out_y, tuning.response),
    )
}

fn apply_response(value: f32, response: f32) -> f32 {
    value.signum() * value.abs().powf(response)
}

/// Back onto the signed 16-bit scale used by binds
pub fn to_axis_value(value: f32) -> i32 {
    (value * 32767.0).round().clamp(-32768.0, 32767.0) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn magnitude((x, y): (f32, f32)) -> f32 {
        (x * x + y * y).sqrt()
    }

    fn raw(v: f32) -> i16 {
        (v * 32767.5 - 0.5).round() as i16
    }

    #[test]
    fn full_scale_normalizes_to_unit() {
        assert_eq!(normalize_sample(i16::MAX), 1.0);
        assert_eq!(normalize_sample(i16::MIN), -1.0);
    }

    #[rstest]
    #[case(0.0)]
    #[case(0.05)]
    #[case(0.099)]
    fn inside_deadzone_is_centered(#[case] v: f32) {
        let tuning = AxisTuning::default();
        assert_eq!(process_input(raw(v), 0, tuning), (0.0, 0.0));
    }

    #[test]
    fn just_outside_deadzone_is_small() {
        let tuning = AxisTuning::default();
        let out = process_input(raw(0.11), 0, tuning);
        let m = magnitude(out);
        assert!(m > 0.0 && m < 0.05, "magnitude {m}");
    }

    #[test]
    fn full_deflection_reaches_one() {
        let tuning = AxisTuning::default();
        let (x, y) = process_input(i16::MAX, 0, tuning);
        assert!((x - 1.0).abs() < 1e-4);
        assert!(y.abs() < 1e-3);
    }

    #[test]
    fn scaling_is_monotonic() {
        let tuning = AxisTuning::default();
        let mut last = 0.0;
        for step in 11..=100 {
            let m = magnitude(process_input(raw(step as f32 / 100.0), 0, tuning));
            assert!(m >= last);
            last = m;
        }
    }

    #[test]
    fn diagonal_is_clamped() {
        let tuning = AxisTuning {
            deadzone: 0.0,
            response: 1.0,
        };
        let (x, y) = process_input(i16::MAX, i16::MAX, tuning);
        assert!(x <= 1.0 && y <= 1.0);
        assert!(x > 0.99 && y > 0.99);
    }

    #[test]
    fn response_curve_keeps_sign() {
        let tuning = AxisTuning {
            deadzone: 0.0,
            response: 2.0,
        };
        let (x, _) = process_input(raw(-0.5), 0, tuning);
        assert!((x + 0.25).abs() < 1e-3);
    }

    #[test]
    fn axis_value_round_trip() {
        assert_eq!(to_axis_value(1.0), 32767);
        assert_eq!(to_axis_value(-1.0), -32767);
        assert_eq!(to_axis_value(0.0), 0);
    }
}
