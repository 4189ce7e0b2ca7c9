use nalgebra::Vector3;
use quote_types::Metrics;
use stl_mesh::{ComplexityLimits, TriangleMesh};
use tracing::{debug, instrument};

use crate::error::MetricsError;

/// Compute volume, surface area and horizontal area under the desktop
/// complexity ceiling.
pub fn compute_metrics(mesh: &TriangleMesh) -> Result<Metrics, MetricsError> {
    compute_metrics_with_limits(mesh, &ComplexityLimits::desktop())
}

/// Compute volume, surface area and horizontal area of `mesh`.
///
/// For each triangle (a, b, c) with `cross = (b - a) × (c - a)`:
/// - area contribution is `|cross| / 2`
/// - signed volume contribution is `a · cross / 6` (tetrahedron against the
///   origin); the result is the absolute value of the sum, so winding
///   direction does not matter but the mesh must be closed for the figure
///   to mean anything
/// - horizontal contribution is `area * |cross.y| / |cross|`, skipped for
///   degenerate triangles
///
/// The vertex and triangle counts are checked against `limits` before the
/// pass starts. Works on indexed and non-indexed meshes alike and never
/// mutates the mesh.
#[instrument(skip(mesh, limits), fields(triangles = mesh.triangle_count()))]
pub fn compute_metrics_with_limits(
    mesh: &TriangleMesh,
    limits: &ComplexityLimits,
) -> Result<Metrics, MetricsError> {
    limits.check(mesh.vertex_count(), mesh.triangle_count())?;
    mesh.validate()?;

    let mut volume = 0.0f64;
    let mut area = 0.0f64;
    let mut horizontal = 0.0f64;

    // Scratch vectors reused across the whole pass.
    let mut a: Vector3<f64> = Vector3::zeros();
    let mut b: Vector3<f64> = Vector3::zeros();
    let mut c: Vector3<f64> = Vector3::zeros();
    let mut ab: Vector3<f64> = Vector3::zeros();
    let mut ac: Vector3<f64> = Vector3::zeros();
    let mut cross: Vector3<f64> = Vector3::zeros();

    for t in 0..mesh.triangle_count() {
        let [i0, i1, i2] = mesh.triangle(t);
        mesh.load_vertex(i0, &mut a);
        mesh.load_vertex(i1, &mut b);
        mesh.load_vertex(i2, &mut c);

        ab.copy_from(&b);
        ab -= &a;
        ac.copy_from(&c);
        ac -= &a;
        cross.copy_from(&ab.cross(&ac));

        let cross_len = cross.norm();
        let tri_area = cross_len * 0.5;
        area += tri_area;

        volume += a.dot(&cross) / 6.0;

        if cross_len > 0.0 {
            let horiz_weight = cross.y.abs() / cross_len;
            horizontal += tri_area * horiz_weight;
        }
    }

    let metrics = Metrics {
        volume_mm3: volume.abs(),
        surface_area_mm2: area,
        horizontal_area_mm2: horizontal,
    };
    debug!(
        volume_mm3 = metrics.volume_mm3,
        surface_area_mm2 = metrics.surface_area_mm2,
        horizontal_area_mm2 = metrics.horizontal_area_mm2,
        "computed mesh metrics"
    );
    Ok(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Right tetrahedron with legs of length 6 along X, Y, Z.
    fn tetrahedron() -> TriangleMesh {
        TriangleMesh::indexed(
            vec![0.0, 0.0, 0.0, 6.0, 0.0, 0.0, 0.0, 6.0, 0.0, 0.0, 0.0, 6.0],
            vec![0, 2, 1, 0, 1, 3, 0, 3, 2, 1, 2, 3],
        )
    }

    #[test]
    fn tetrahedron_volume() {
        let m = compute_metrics(&tetrahedron()).unwrap();
        assert_relative_eq!(m.volume_mm3, 36.0, epsilon = 1e-9);
    }

    #[test]
    fn tetrahedron_areas() {
        let m = compute_metrics(&tetrahedron()).unwrap();
        let leg_face = 18.0;
        let slanted = 0.5 * (3.0f64 * 36.0 * 36.0).sqrt();
        assert_relative_eq!(m.surface_area_mm2, 3.0 * leg_face + slanted, epsilon = 1e-9);
        // The XZ face is fully horizontal, the slanted face is 1/sqrt(3) horizontal,
        // the two vertical faces contribute nothing.
        let expected_h = leg_face + slanted / 3.0f64.sqrt();
        assert_relative_eq!(m.horizontal_area_mm2, expected_h, epsilon = 1e-9);
    }

    #[test]
    fn single_degenerate_triangle_contributes_nothing() {
        let mesh = TriangleMesh::from_soup(vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let m = compute_metrics(&mesh).unwrap();
        assert_eq!(m, Metrics::default());
    }

    #[test]
    fn guard_runs_before_validation() {
        // Out-of-range indices would fail validation; the ceiling must trip first.
        let mesh = TriangleMesh {
            positions: vec![0.0; 12],
            normals: vec![0.0; 12],
            indices: Some(vec![0, 1, 99]),
        };
        let limits = ComplexityLimits {
            max_vertices: 3,
            max_triangles: 10,
        };
        let err = compute_metrics_with_limits(&mesh, &limits).unwrap_err();
        assert!(matches!(err, MetricsError::TooComplex(_)));

        let err = compute_metrics(&mesh).unwrap_err();
        assert!(matches!(err, MetricsError::InvalidMesh(_)));
    }
}
