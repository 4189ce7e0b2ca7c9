//! Software backend that renders a frame as an SVG document.

use std::fmt::Write as _;

use nalgebra::Vector3;
use slotmap::SlotMap;
use stl_mesh::TriangleMesh;

use crate::backend::{DrawList, GeometryId, GraphicsBackend, MaterialId, ResourceCounts};
use crate::color::Rgb;
use crate::error::PreviewError;

const BACKGROUND: &str = "#1a1a2e";
const GRID_COLOR: &str = "#3a3f5c";

/// Keeps geometry and materials in slot maps so released handles can never
/// be reused by mistake.
#[derive(Debug)]
pub struct SvgBackend {
    width: f64,
    height: f64,
    geometries: SlotMap<GeometryId, TriangleMesh>,
    materials: SlotMap<MaterialId, Rgb>,
    material_updates: u64,
}

impl Default for SvgBackend {
    fn default() -> Self {
        Self::new(640.0, 480.0)
    }
}

impl SvgBackend {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            geometries: SlotMap::with_key(),
            materials: SlotMap::with_key(),
            material_updates: 0,
        }
    }

    /// Number of in-place material color changes.
    pub fn material_updates(&self) -> u64 {
        self.material_updates
    }

    pub fn material_color(&self, id: MaterialId) -> Option<Rgb> {
        self.materials.get(id).copied()
    }
}

struct TriInfo {
    points: [(f64, f64); 3],
    depth: f64,
    brightness: f64,
}

impl GraphicsBackend for SvgBackend {
    type Frame = String;

    fn create_geometry(&mut self, mesh: &TriangleMesh) -> GeometryId {
        self.geometries.insert(mesh.clone())
    }

    fn release_geometry(&mut self, id: GeometryId) -> Result<(), PreviewError> {
        self.geometries
            .remove(id)
            .map(|_| ())
            .ok_or(PreviewError::UnknownGeometry)
    }

    fn create_material(&mut self, color: Rgb) -> MaterialId {
        self.materials.insert(color)
    }

    fn set_material_color(&mut self, id: MaterialId, color: Rgb) -> Result<(), PreviewError> {
        let slot = self
            .materials
            .get_mut(id)
            .ok_or(PreviewError::UnknownMaterial)?;
        *slot = color;
        self.material_updates += 1;
        Ok(())
    }

    fn release_material(&mut self, id: MaterialId) -> Result<(), PreviewError> {
        self.materials
            .remove(id)
            .map(|_| ())
            .ok_or(PreviewError::UnknownMaterial)
    }

    fn live_resources(&self) -> ResourceCounts {
        ResourceCounts {
            geometries: self.geometries.len(),
            materials: self.materials.len(),
        }
    }

    fn render(&self, draw: &DrawList) -> Result<String, PreviewError> {
        let (right, up, forward) = draw.camera.basis();
        let target = draw.camera.target;
        let eye = draw.camera.eye();
        let project = |p: &Vector3<f64>| -> (f64, f64) {
            let rel = p - target;
            (rel.dot(&right), -rel.dot(&up))
        };

        let grid: Vec<((f64, f64), (f64, f64))> = draw
            .bed
            .grid_lines()
            .iter()
            .map(|(a, b)| {
                (
                    project(&Vector3::new(a[0], a[1], a[2])),
                    project(&Vector3::new(b[0], b[1], b[2])),
                )
            })
            .collect();

        let mut tris: Vec<TriInfo> = Vec::new();
        let mut color = Rgb::WHITE;
        if let Some(model) = &draw.model {
            let mesh = self
                .geometries
                .get(model.geometry)
                .ok_or(PreviewError::UnknownGeometry)?;
            color = *self
                .materials
                .get(model.material)
                .ok_or(PreviewError::UnknownMaterial)?;

            let offset = Vector3::new(model.offset[0], model.offset[1], model.offset[2]);
            let light = Vector3::new(0.3, -0.5, 0.8).normalize();
            tris.reserve(mesh.triangle_count());
            for t in 0..mesh.triangle_count() {
                let [i0, i1, i2] = mesh.triangle(t);
                let a = mesh.vertex(i0) + offset;
                let b = mesh.vertex(i1) + offset;
                let c = mesh.vertex(i2) + offset;
                let n = (b - a).cross(&(c - a));
                let len = n.norm().max(1e-12);
                let brightness = 0.3 + 0.7 * (n.dot(&light) / len).abs().min(1.0);
                let centroid = (a + b + c) / 3.0;
                tris.push(TriInfo {
                    points: [project(&a), project(&b), project(&c)],
                    depth: (centroid - eye).dot(&forward),
                    brightness,
                });
            }
            // Far to near.
            tris.sort_by(|x, y| y.depth.total_cmp(&x.depth));
        }

        let (mut min_x, mut max_x, mut min_y, mut max_y) =
            (f64::MAX, f64::MIN, f64::MAX, f64::MIN);
        let mut extend = |(x, y): (f64, f64)| {
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        };
        for (a, b) in &grid {
            extend(*a);
            extend(*b);
        }
        for tri in &tris {
            tri.points.iter().copied().for_each(&mut extend);
        }

        let padding = 20.0;
        let avail_w = self.width - 2.0 * padding;
        let avail_h = self.height - 2.0 * padding;
        let data_w = (max_x - min_x).max(0.001);
        let data_h = (max_y - min_y).max(0.001);
        let scale = (avail_w / data_w).min(avail_h / data_h);
        let offset_x = padding + (avail_w - data_w * scale) / 2.0;
        let offset_y = padding + (avail_h - data_h * scale) / 2.0;
        let tx = |(x, y): (f64, f64)| ((x - min_x) * scale + offset_x, (y - min_y) * scale + offset_y);

        let mut svg = String::with_capacity(256 + tris.len() * 96);
        // Writing into a String cannot fail.
        let _ = writeln!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\" height=\"{}\" style=\"background:{BACKGROUND}\">",
            self.width, self.height
        );
        for (a, b) in &grid {
            let (x0, y0) = tx(*a);
            let (x1, y1) = tx(*b);
            let _ = writeln!(
                svg,
                "  <line x1=\"{x0:.1}\" y1=\"{y0:.1}\" x2=\"{x1:.1}\" y2=\"{y1:.1}\" stroke=\"{GRID_COLOR}\" stroke-width=\"0.5\"/>"
            );
        }
        let stroke_width = if tris.len() > 200 { 0.0 } else { 0.3 };
        for tri in &tris {
            let [(x0, y0), (x1, y1), (x2, y2)] = tri.points.map(tx);
            let fill = color.shade(tri.brightness);
            let _ = writeln!(
                svg,
                "  <polygon points=\"{x0:.1},{y0:.1} {x1:.1},{y1:.1} {x2:.1},{y2:.1}\" fill=\"{fill}\" stroke=\"{fill}\" stroke-width=\"{stroke_width}\"/>"
            );
        }
        svg.push_str("</svg>\n");
        Ok(svg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ModelInstance;
    use crate::bed::BedSpec;
    use crate::camera::OrbitCamera;

    fn triangle() -> TriangleMesh {
        TriangleMesh::from_soup(vec![0.0, 0.0, 0.0, 10.0, 0.0, 0.0, 0.0, 10.0, 0.0])
    }

    fn draw(model: Option<ModelInstance>) -> DrawList {
        DrawList {
            camera: OrbitCamera::default(),
            bed: BedSpec::default(),
            model,
        }
    }

    #[test]
    fn empty_scene_draws_grid_only() {
        let svg = SvgBackend::default().render(&draw(None)).unwrap();
        assert!(svg.starts_with("<svg"));
        assert_eq!(svg.matches("<line").count(), 34);
        assert_eq!(svg.matches("<polygon").count(), 0);
    }

    #[test]
    fn model_is_drawn_in_material_color() {
        let mut backend = SvgBackend::default();
        let geometry = backend.create_geometry(&triangle());
        let material = backend.create_material(Rgb::new(255, 0, 0));
        let svg = backend
            .render(&draw(Some(ModelInstance {
                geometry,
                material,
                offset: [0.0; 3],
            })))
            .unwrap();
        assert_eq!(svg.matches("<polygon").count(), 1);
        assert!(svg.contains("fill=\"#"));
        assert!(svg.contains("0000\" stroke"), "red shades keep zero green and blue: {svg}");
    }

    #[test]
    fn released_handles_are_rejected() {
        let mut backend = SvgBackend::default();
        let geometry = backend.create_geometry(&triangle());
        let material = backend.create_material(Rgb::WHITE);
        backend.release_geometry(geometry).unwrap();
        assert_eq!(
            backend.release_geometry(geometry),
            Err(PreviewError::UnknownGeometry)
        );
        let err = backend
            .render(&draw(Some(ModelInstance {
                geometry,
                material,
                offset: [0.0; 3],
            })))
            .unwrap_err();
        assert_eq!(err, PreviewError::UnknownGeometry);
        backend.release_material(material).unwrap();
        assert!(backend.live_resources().is_empty());
    }

    #[test]
    fn recolor_is_in_place() {
        let mut backend = SvgBackend::default();
        let material = backend.create_material(Rgb::WHITE);
        backend.set_material_color(material, Rgb::BLACK).unwrap();
        assert_eq!(backend.material_color(material), Some(Rgb::BLACK));
        assert_eq!(backend.live_resources().materials, 1);
        assert_eq!(backend.material_updates(), 1);
    }
}
