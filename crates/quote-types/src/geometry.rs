use serde::{Deserialize, Serialize};

/// Geometric figures extracted from a mesh, in millimeter units.
///
/// Always recomputed in full from a fresh mesh; never patched incrementally.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Metrics {
    /// Enclosed volume (mm³), absolute value of the signed divergence sum.
    #[serde(rename = "volumeMM3")]
    pub volume_mm3: f64,
    /// Total surface area (mm²).
    #[serde(rename = "surfaceAreaMM2")]
    pub surface_area_mm2: f64,
    /// Surface area weighted by how much each triangle faces up or down (mm²).
    /// Never exceeds `surface_area_mm2`.
    #[serde(rename = "horizontalAreaMM2")]
    pub horizontal_area_mm2: f64,
}

impl Metrics {
    /// Volume in cubic centimeters.
    pub fn volume_cm3(&self) -> f64 {
        self.volume_mm3 / 1000.0
    }

    /// Surface area in square centimeters.
    pub fn surface_area_cm2(&self) -> f64 {
        self.surface_area_mm2 / 100.0
    }

    /// Horizontal-facing area in square centimeters.
    pub fn horizontal_area_cm2(&self) -> f64 {
        self.horizontal_area_mm2 / 100.0
    }
}

/// Placement data for a loaded mesh, so callers can sit the model on a
/// print bed without redoing bounding-box math.
///
/// The vertical axis is +Y.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeshBounds {
    /// Extent along Y (mm).
    pub height: f64,
    /// Midpoint of the Y extent.
    pub center_y: f64,
    /// Translation along Y that puts the lowest point on the bed plane (`-min.y`).
    pub y_offset: f64,
    /// Axis-aligned minimum corner after horizontal centering.
    pub min: [f64; 3],
    /// Axis-aligned maximum corner after horizontal centering.
    pub max: [f64; 3],
}

impl MeshBounds {
    /// Build placement data from an axis-aligned box.
    pub fn from_extents(min: [f64; 3], max: [f64; 3]) -> Self {
        Self {
            height: max[1] - min[1],
            center_y: (max[1] + min[1]) * 0.5,
            y_offset: -min[1],
            min,
            max,
        }
    }

    /// Footprint on the bed plane: (width along X, depth along Z).
    pub fn footprint(&self) -> (f64, f64) {
        (self.max[0] - self.min[0], self.max[2] - self.min[2])
    }
}
