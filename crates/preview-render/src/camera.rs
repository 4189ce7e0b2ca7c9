use nalgebra::Vector3;
use quote_types::MeshBounds;

pub const MIN_DISTANCE: f64 = 120.0;
pub const MAX_DISTANCE: f64 = 1400.0;
const MIN_TARGET_HEIGHT: f64 = 35.0;
const MAX_TARGET_HEIGHT: f64 = 140.0;
/// Keeps the camera above the bed and off the pole.
const MAX_ELEVATION: f64 = 85.0 * std::f64::consts::PI / 180.0;
const MIN_ELEVATION: f64 = 2.0 * std::f64::consts::PI / 180.0;

/// Orbit camera around a target on the vertical axis. Panning is disabled,
/// so the target only moves when a new model is framed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    pub target: Vector3<f64>,
    pub distance: f64,
    /// Radians around +Y, 0 looking down -Z.
    pub azimuth: f64,
    /// Radians above the bed plane.
    pub elevation: f64,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            target: Vector3::new(0.0, MIN_TARGET_HEIGHT, 0.0),
            distance: 420.0,
            azimuth: std::f64::consts::FRAC_PI_4,
            elevation: 0.5,
        }
    }
}

impl OrbitCamera {
    /// Aim at a placed model: target height follows the model, distance
    /// grows with its largest extent.
    pub fn frame(&mut self, bounds: &MeshBounds) {
        let target_y = (bounds.height * 0.45).clamp(MIN_TARGET_HEIGHT, MAX_TARGET_HEIGHT);
        self.target = Vector3::new(0.0, target_y, 0.0);
        let (w, d) = bounds.footprint();
        let extent = w.max(d).max(bounds.height);
        self.distance = (extent * 2.2).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    pub fn orbit(&mut self, d_azimuth: f64, d_elevation: f64) {
        self.azimuth = (self.azimuth + d_azimuth).rem_euclid(std::f64::consts::TAU);
        self.elevation = (self.elevation + d_elevation).clamp(MIN_ELEVATION, MAX_ELEVATION);
    }

    /// Multiply the distance by `factor`, within the allowed range.
    pub fn zoom(&mut self, factor: f64) {
        if factor.is_finite() && factor > 0.0 {
            self.distance = (self.distance * factor).clamp(MIN_DISTANCE, MAX_DISTANCE);
        }
    }

    /// Always refused.
    pub fn pan(&mut self, _dx: f64, _dy: f64) -> bool {
        false
    }

    pub fn eye(&self) -> Vector3<f64> {
        let (sa, ca) = self.azimuth.sin_cos();
        let (se, ce) = self.elevation.sin_cos();
        self.target + Vector3::new(ce * sa, se, ce * ca) * self.distance
    }

    /// Unit right/up/forward vectors of the view.
    pub fn basis(&self) -> (Vector3<f64>, Vector3<f64>, Vector3<f64>) {
        let forward = (self.target - self.eye()).normalize();
        let right = forward.cross(&Vector3::y()).normalize();
        let up = right.cross(&forward);
        (right, up, forward)
    }
}
