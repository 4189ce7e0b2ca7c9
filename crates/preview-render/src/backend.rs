//! The seam between the preview scene and whatever draws it.

use slotmap::new_key_type;
use stl_mesh::TriangleMesh;

use crate::bed::BedSpec;
use crate::camera::OrbitCamera;
use crate::color::Rgb;
use crate::error::PreviewError;

new_key_type! {
    /// Handle to an uploaded vertex buffer.
    pub struct GeometryId;
    /// Handle to a surface material.
    pub struct MaterialId;
}

/// Number of live native resources on a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResourceCounts {
    pub geometries: usize,
    pub materials: usize,
}

impl ResourceCounts {
    pub fn is_empty(&self) -> bool {
        self.geometries == 0 && self.materials == 0
    }
}

/// One placed model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelInstance {
    pub geometry: GeometryId,
    pub material: MaterialId,
    /// Added to every vertex at draw time (lifts the model onto the bed).
    pub offset: [f64; 3],
}

/// Everything one frame needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawList {
    pub camera: OrbitCamera,
    pub bed: BedSpec,
    pub model: Option<ModelInstance>,
}

/// A renderer with explicitly managed resources.
///
/// Nothing is freed implicitly: every `create_*` must be paired with the
/// matching `release_*`. Releasing a handle twice is an error.
pub trait GraphicsBackend {
    type Frame;

    fn create_geometry(&mut self, mesh: &TriangleMesh) -> GeometryId;
    fn release_geometry(&mut self, id: GeometryId) -> Result<(), PreviewError>;

    fn create_material(&mut self, color: Rgb) -> MaterialId;
    /// Change a material's color in place.
    fn set_material_color(&mut self, id: MaterialId, color: Rgb) -> Result<(), PreviewError>;
    fn release_material(&mut self, id: MaterialId) -> Result<(), PreviewError>;

    fn live_resources(&self) -> ResourceCounts;

    fn render(&self, draw: &DrawList) -> Result<Self::Frame, PreviewError>;
}
