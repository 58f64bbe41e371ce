use crate::math::{axis_from_degrees, derive_affine_matrix, AffineMatrix, Vec3};
use tracing::warn;

pub const DEFAULT_AXIS_ANGLE: f64 = 45.0;
pub const DEFAULT_ROTATION_ANGLE: f64 = 0.0;
pub const DEFAULT_ZOOM: f64 = 1.0;
pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 10.0;

/// Parameters that drive every displayed position in the scene
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationParameters {
    /// Direction of the rotation axis in the z=0 plane, degrees from +X
    pub axis_angle_degrees: f64,
    /// Rotation about that axis, degrees
    pub rotation_angle_degrees: f64,
    /// Zoom level, always positive
    pub zoom_factor: f64,
}

impl Default for RotationParameters {
    fn default() -> Self {
        RotationParameters {
            axis_angle_degrees: DEFAULT_AXIS_ANGLE,
            rotation_angle_degrees: DEFAULT_ROTATION_ANGLE,
            zoom_factor: DEFAULT_ZOOM,
        }
    }
}

impl RotationParameters {
    /// Unit rotation axis, recomputed from the angle on every call
    pub fn axis(&self) -> Vec3 {
        axis_from_degrees(self.axis_angle_degrees)
    }

    pub fn angle_radians(&self) -> f64 {
        self.rotation_angle_degrees.to_radians()
    }

    pub fn affine_matrix(&self) -> AffineMatrix {
        let axis = self.axis();
        derive_affine_matrix(&[axis[0], axis[1]], self.angle_radians())
    }

    /// Sets the axis angle from raw input. Returns false and keeps the old
    /// value when the input is not a finite number.
    pub fn set_axis_angle(&mut self, input: &str) -> bool {
        match parse_finite(input) {
            Some(value) => {
                self.axis_angle_degrees = value;
                true
            }
            None => {
                warn!(input, "ignoring invalid axis angle");
                false
            }
        }
    }

    /// Sets the rotation angle from raw input, same rules as the axis angle
    pub fn set_rotation_angle(&mut self, input: &str) -> bool {
        match parse_finite(input) {
            Some(value) => {
                self.rotation_angle_degrees = value;
                true
            }
            None => {
                warn!(input, "ignoring invalid rotation angle");
                false
            }
        }
    }

    /// Sets the zoom from raw input. Non-positive values are rejected,
    /// positive values are clamped to the supported range.
    pub fn set_zoom(&mut self, input: &str) -> bool {
        match parse_finite(input) {
            Some(value) if value > 0.0 => {
                self.zoom_factor = value.clamp(MIN_ZOOM, MAX_ZOOM);
                true
            }
            _ => {
                warn!(input, "ignoring invalid zoom factor");
                false
            }
        }
    }

    /// Adds `delta` degrees to the axis angle, keeping the stored value in [0, 360)
    pub fn nudge_axis_angle(&mut self, delta: f64) {
        self.axis_angle_degrees = (self.axis_angle_degrees + delta).rem_euclid(360.0);
    }

    pub fn nudge_rotation_angle(&mut self, delta: f64) {
        self.rotation_angle_degrees = (self.rotation_angle_degrees + delta).rem_euclid(360.0);
    }

    /// Multiplies the zoom by `factor`, clamped to the supported range
    pub fn scale_zoom(&mut self, factor: f64) {
        self.zoom_factor = (self.zoom_factor * factor).clamp(MIN_ZOOM, MAX_ZOOM);
    }
}

fn parse_finite(input: &str) -> Option<f64> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Snapshot of the values shown beside the canvas after each refresh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Readout {
    pub matrix: AffineMatrix,
    pub axis_angle_degrees: f64,
    pub rotation_angle_degrees: f64,
    pub zoom_factor: f64,
    pub point_count: usize,
    pub label_count: usize,
}

impl Readout {
    /// Text lines for the heads-up display
    pub fn lines(&self) -> Vec<String> {
        let m = &self.matrix;
        vec![
            format!(
                "φ = {:.0}°  θ = {:.0}°  zoom {:.1}×",
                self.axis_angle_degrees, self.rotation_angle_degrees, self.zoom_factor
            ),
            format!("[ {:>5.2} {:>5.2} ]", m.a, m.b),
            format!("[ {:>5.2} {:>5.2} ]", m.c, m.d),
            format!("{} points  {} labels", self.point_count, self.label_count),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reset_values() {
        let params = RotationParameters::default();
        assert_eq!(params.axis_angle_degrees, 45.0);
        assert_eq!(params.rotation_angle_degrees, 0.0);
        assert_eq!(params.zoom_factor, 1.0);
    }

    #[test]
    fn invalid_angle_input_is_ignored() {
        let mut params = RotationParameters::default();
        assert!(params.set_rotation_angle(" 90 "));
        assert!(!params.set_rotation_angle("ninety"));
        assert!(!params.set_rotation_angle(""));
        assert!(!params.set_axis_angle("NaN"));
        assert!(!params.set_axis_angle("inf"));
        assert_eq!(params.rotation_angle_degrees, 90.0);
        assert_eq!(params.axis_angle_degrees, 45.0);
    }

    #[test]
    fn angles_accept_any_real() {
        let mut params = RotationParameters::default();
        assert!(params.set_axis_angle("-720.5"));
        assert_eq!(params.axis_angle_degrees, -720.5);
    }

    #[test]
    fn zoom_must_be_positive() {
        let mut params = RotationParameters::default();
        assert!(!params.set_zoom("0"));
        assert!(!params.set_zoom("-2"));
        assert_eq!(params.zoom_factor, 1.0);
        assert!(params.set_zoom("50"));
        assert_eq!(params.zoom_factor, MAX_ZOOM);
        assert!(params.set_zoom("0.01"));
        assert_eq!(params.zoom_factor, MIN_ZOOM);
    }

    #[test]
    fn nudges_wrap_around() {
        let mut params = RotationParameters::default();
        params.nudge_rotation_angle(-5.0);
        assert_eq!(params.rotation_angle_degrees, 355.0);
        params.nudge_axis_angle(320.0);
        assert_eq!(params.axis_angle_degrees, 5.0);
    }

    #[test]
    fn axis_is_derived_from_angle() {
        let mut params = RotationParameters::default();
        params.set_axis_angle("90");
        let axis = params.axis();
        assert!(axis[0].abs() < 1e-12);
        assert!((axis[1] - 1.0).abs() < 1e-12);
        assert_eq!(axis[2], 0.0);
    }

    #[test]
    fn readout_formats_two_decimals() {
        let readout = Readout {
            matrix: RotationParameters::default().affine_matrix(),
            axis_angle_degrees: 45.0,
            rotation_angle_degrees: 0.0,
            zoom_factor: 1.0,
            point_count: 3,
            label_count: 0,
        };
        let lines = readout.lines();
        assert_eq!(lines[0], "φ = 45°  θ = 0°  zoom 1.0×");
        assert_eq!(lines[1], "[  1.00  0.00 ]");
        assert_eq!(lines[3], "3 points  0 labels");
    }
}
