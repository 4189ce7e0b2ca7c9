use quote_types::{MeshBounds, Platform};
use stl_mesh::{load_stl, ComplexityLimits};
use tracing::{debug, info, instrument, warn};

use crate::backend::{DrawList, GeometryId, GraphicsBackend, MaterialId, ModelInstance};
use crate::bed::BedSpec;
use crate::camera::OrbitCamera;
use crate::color::Rgb;
use crate::error::PreviewError;

struct PlacedModel {
    geometry: GeometryId,
    bounds: MeshBounds,
}

/// The preview viewport: bed, camera and at most one model.
///
/// The scene loads STL bytes itself, independent of the metrics worker.
/// It owns exactly one material for its whole life and at most one
/// geometry; both are released explicitly, never left to the backend.
pub struct PreviewScene<B: GraphicsBackend> {
    backend: B,
    camera: OrbitCamera,
    bed: BedSpec,
    limits: ComplexityLimits,
    color: Rgb,
    material: Option<MaterialId>,
    model: Option<PlacedModel>,
}

impl<B: GraphicsBackend> PreviewScene<B> {
    pub fn new(backend: B, platform: Platform) -> Self {
        Self {
            backend,
            camera: OrbitCamera::default(),
            bed: BedSpec::default(),
            limits: ComplexityLimits::for_platform(platform),
            color: Rgb::BLACK,
            material: None,
            model: None,
        }
    }

    pub fn with_bed(mut self, bed: BedSpec) -> Self {
        self.bed = bed;
        self
    }

    /// Override the platform's default complexity ceiling.
    pub fn with_limits(mut self, limits: ComplexityLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Replace the displayed model with the STL in `bytes`.
    ///
    /// The previous geometry is released before parsing starts, so a failed
    /// load leaves an empty bed rather than a stale model.
    #[instrument(skip(self, bytes), fields(len = bytes.len()))]
    pub fn load_model(&mut self, bytes: &[u8]) -> Result<MeshBounds, PreviewError> {
        self.release_model()?;

        let loaded = load_stl(bytes, &self.limits)?;
        let geometry = self.backend.create_geometry(&loaded.mesh);
        self.ensure_material();
        self.camera.frame(&loaded.bounds);

        let (w, d) = loaded.bounds.footprint();
        if !self.bed.fits(w, d) {
            warn!(width = w, depth = d, bed = self.bed.size_mm, "model overhangs the bed");
        }
        info!(
            triangles = loaded.mesh.triangle_count(),
            height = loaded.bounds.height,
            "preview model loaded"
        );
        self.model = Some(PlacedModel {
            geometry,
            bounds: loaded.bounds,
        });
        Ok(loaded.bounds)
    }

    /// Recolor the model. The existing material is updated in place.
    pub fn set_color(&mut self, hex: &str) -> Result<(), PreviewError> {
        let color = Rgb::from_hex(hex)?;
        self.color = color;
        if let Some(material) = self.material {
            self.backend.set_material_color(material, color)?;
            debug!(%color, "material recolored");
        }
        Ok(())
    }

    /// Remove the model, keeping the material for the next one.
    pub fn clear(&mut self) -> Result<(), PreviewError> {
        self.release_model()
    }

    /// Release every resource the scene holds. Safe to call more than once.
    pub fn teardown(&mut self) -> Result<(), PreviewError> {
        self.release_model()?;
        if let Some(material) = self.material.take() {
            self.backend.release_material(material)?;
        }
        Ok(())
    }

    pub fn render(&self) -> Result<B::Frame, PreviewError> {
        let model = match (&self.model, self.material) {
            (Some(placed), Some(material)) => Some(ModelInstance {
                geometry: placed.geometry,
                material,
                offset: [0.0, placed.bounds.y_offset, 0.0],
            }),
            _ => None,
        };
        self.backend.render(&DrawList {
            camera: self.camera,
            bed: self.bed,
            model,
        })
    }

    pub fn bounds(&self) -> Option<&MeshBounds> {
        self.model.as_ref().map(|m| &m.bounds)
    }

    pub fn color(&self) -> Rgb {
        self.color
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut OrbitCamera {
        &mut self.camera
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn ensure_material(&mut self) {
        if self.material.is_none() {
            self.material = Some(self.backend.create_material(self.color));
        }
    }

    fn release_model(&mut self) -> Result<(), PreviewError> {
        if let Some(placed) = self.model.take() {
            self.backend.release_geometry(placed.geometry)?;
            debug!("released preview geometry");
        }
        Ok(())
    }
}

impl<B: GraphicsBackend> Drop for PreviewScene<B> {
    fn drop(&mut self) {
        if let Err(e) = self.teardown() {
            warn!(error = %e, "preview teardown failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svg::SvgBackend;
    use approx::assert_relative_eq;

    const RAISED: &[u8] = b"solid t
facet normal 0 0 1
outer loop
vertex 0 20 0
vertex 10 20 0
vertex 0 60 0
endloop
endfacet
endsolid t
";

    #[test]
    fn load_places_model_on_bed() {
        let mut scene = PreviewScene::new(SvgBackend::default(), Platform::Desktop);
        let bounds = scene.load_model(RAISED).unwrap();
        assert_relative_eq!(bounds.height, 40.0);
        assert_relative_eq!(bounds.y_offset, -20.0);
        assert_relative_eq!(scene.camera().target.y, 35.0);
        let svg = scene.render().unwrap();
        assert_eq!(svg.matches("<polygon").count(), 1);
    }

    #[test]
    fn color_before_model_is_used_for_the_material() {
        let mut scene = PreviewScene::new(SvgBackend::default(), Platform::Desktop);
        scene.set_color("#00ff00").unwrap();
        scene.load_model(RAISED).unwrap();
        assert_eq!(scene.color(), Rgb::new(0, 255, 0));
        assert_eq!(scene.backend().material_updates(), 0);
    }

    #[test]
    fn invalid_color_keeps_previous() {
        let mut scene = PreviewScene::new(SvgBackend::default(), Platform::Desktop);
        assert!(scene.set_color("banana").is_err());
        assert_eq!(scene.color(), Rgb::BLACK);
    }

    #[test]
    fn configured_limits_override_platform_defaults() {
        let tight = ComplexityLimits {
            max_vertices: 2,
            max_triangles: 1,
        };
        let mut scene =
            PreviewScene::new(SvgBackend::default(), Platform::Desktop).with_limits(tight);
        let err = scene.load_model(RAISED).unwrap_err();
        assert_eq!(err.error_code(), quote_types::ErrorCode::TooComplex);
        assert_eq!(scene.backend().live_resources().geometries, 0);
    }

    #[test]
    fn failed_load_leaves_empty_bed() {
        let mut scene = PreviewScene::new(SvgBackend::default(), Platform::Desktop);
        scene.load_model(RAISED).unwrap();
        let err = scene.load_model(b"solid broken\nendsolid\n").unwrap_err();
        assert_eq!(err.error_code(), quote_types::ErrorCode::StlUnreadable);
        assert!(scene.bounds().is_none());
        assert_eq!(scene.backend().live_resources().geometries, 0);
    }
}
