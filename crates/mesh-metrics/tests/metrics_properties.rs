//! Known-shape and property-based checks for the metrics pass.

use approx::assert_relative_eq;
use mesh_metrics::{compute_metrics, compute_metrics_with_limits, MetricsError};
use proptest::prelude::*;
use stl_mesh::{ComplexityLimits, TriangleMesh};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

const CUBE_INDICES: [u32; 36] = [
    0, 2, 1, 0, 3, 2, // z = 0
    4, 5, 6, 4, 6, 7, // z = e
    0, 1, 5, 0, 5, 4, // y = 0
    3, 7, 6, 3, 6, 2, // y = e
    0, 4, 7, 0, 7, 3, // x = 0
    1, 2, 6, 1, 6, 5, // x = e
];

fn cube_positions(edge: f32, offset: [f32; 3]) -> Vec<f32> {
    let corners = [
        [0.0, 0.0, 0.0],
        [edge, 0.0, 0.0],
        [edge, edge, 0.0],
        [0.0, edge, 0.0],
        [0.0, 0.0, edge],
        [edge, 0.0, edge],
        [edge, edge, edge],
        [0.0, edge, edge],
    ];
    corners
        .iter()
        .flat_map(|c| [c[0] + offset[0], c[1] + offset[1], c[2] + offset[2]])
        .collect()
}

fn indexed_cube(edge: f32, offset: [f32; 3]) -> TriangleMesh {
    TriangleMesh::indexed(cube_positions(edge, offset), CUBE_INDICES.to_vec())
}

fn soup_cube(edge: f32, offset: [f32; 3], flip: bool) -> TriangleMesh {
    let positions = cube_positions(edge, offset);
    let mut soup = Vec::with_capacity(36 * 3);
    for tri in CUBE_INDICES.chunks(3) {
        let order = if flip {
            [tri[0], tri[2], tri[1]]
        } else {
            [tri[0], tri[1], tri[2]]
        };
        for i in order {
            let i = i as usize * 3;
            soup.extend_from_slice(&positions[i..i + 3]);
        }
    }
    TriangleMesh::from_soup(soup)
}

// ---------------------------------------------------------------------------
// Known shapes
// ---------------------------------------------------------------------------

#[test]
fn ten_mm_cube_is_exact() {
    let m = compute_metrics(&indexed_cube(10.0, [0.0; 3])).unwrap();
    assert_relative_eq!(m.volume_mm3, 1000.0, epsilon = 1e-9);
    assert_relative_eq!(m.surface_area_mm2, 600.0, epsilon = 1e-9);
    assert_relative_eq!(m.horizontal_area_mm2, 200.0, epsilon = 1e-9);
}

#[test]
fn indexed_and_soup_agree() {
    let indexed = compute_metrics(&indexed_cube(7.5, [1.0, 2.0, 3.0])).unwrap();
    let soup = compute_metrics(&soup_cube(7.5, [1.0, 2.0, 3.0], false)).unwrap();
    assert_relative_eq!(indexed.volume_mm3, soup.volume_mm3, epsilon = 1e-9);
    assert_relative_eq!(indexed.surface_area_mm2, soup.surface_area_mm2, epsilon = 1e-9);
    assert_relative_eq!(
        indexed.horizontal_area_mm2,
        soup.horizontal_area_mm2,
        epsilon = 1e-9
    );
}

#[test]
fn inverted_winding_keeps_positive_volume() {
    let m = compute_metrics(&soup_cube(10.0, [0.0; 3], true)).unwrap();
    assert_relative_eq!(m.volume_mm3, 1000.0, epsilon = 1e-9);
}

#[test]
fn repeated_calls_are_identical() {
    let mesh = soup_cube(12.0, [-4.0, 0.0, 9.0], false);
    let before = mesh.clone();
    let first = compute_metrics(&mesh).unwrap();
    let second = compute_metrics(&mesh).unwrap();
    assert_eq!(first, second);
    assert_eq!(mesh, before);
}

#[test]
fn degenerate_triangle_inside_closed_mesh() {
    let mut mesh = soup_cube(10.0, [0.0; 3], false);
    // Three collinear points, then three coincident ones.
    mesh.positions
        .extend_from_slice(&[1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 3.0, 3.0, 3.0]);
    mesh.positions
        .extend_from_slice(&[5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0]);
    mesh.compute_vertex_normals();

    let m = compute_metrics(&mesh).unwrap();
    assert_relative_eq!(m.volume_mm3, 1000.0, epsilon = 1e-6);
    assert_relative_eq!(m.surface_area_mm2, 600.0, epsilon = 1e-6);
    assert_relative_eq!(m.horizontal_area_mm2, 200.0, epsilon = 1e-6);
}

#[test]
fn one_vertex_over_ceiling_is_rejected() {
    let mesh = soup_cube(10.0, [0.0; 3], false);
    let at_limit = ComplexityLimits {
        max_vertices: mesh.vertex_count(),
        max_triangles: mesh.triangle_count(),
    };
    assert!(compute_metrics_with_limits(&mesh, &at_limit).is_ok());

    let below = ComplexityLimits {
        max_vertices: mesh.vertex_count() - 1,
        ..at_limit
    };
    let err = compute_metrics_with_limits(&mesh, &below).unwrap_err();
    match err {
        MetricsError::TooComplex(e) => {
            assert_eq!(e.vertices, below.max_vertices + 1);
        }
        other => panic!("expected TooComplex, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

fn arb_coord() -> impl Strategy<Value = f32> {
    -500.0f32..500.0
}

fn arb_soup() -> impl Strategy<Value = Vec<f32>> {
    (1usize..40).prop_flat_map(|n| prop::collection::vec(arb_coord(), n * 9))
}

proptest! {
    #[test]
    fn horizontal_never_exceeds_total(positions in arb_soup()) {
        let m = compute_metrics(&TriangleMesh::from_soup(positions)).unwrap();
        prop_assert!(m.volume_mm3 >= 0.0);
        prop_assert!(m.surface_area_mm2 >= 0.0);
        prop_assert!(m.horizontal_area_mm2 >= 0.0);
        prop_assert!(
            m.horizontal_area_mm2 <= m.surface_area_mm2 * (1.0 + 1e-9) + 1e-9,
            "horizontal {} > total {}", m.horizontal_area_mm2, m.surface_area_mm2
        );
    }

    #[test]
    fn closed_cube_volume_is_translation_and_winding_invariant(
        edge in 1.0f32..50.0,
        ox in -100.0f32..100.0,
        oy in -100.0f32..100.0,
        oz in -100.0f32..100.0,
        flip in any::<bool>(),
    ) {
        let m = compute_metrics(&soup_cube(edge, [ox, oy, oz], flip)).unwrap();
        let e = edge as f64;
        let tol = 1e-3;
        prop_assert!((m.volume_mm3 - e.powi(3)).abs() <= tol * e.powi(3),
            "volume {} vs {}", m.volume_mm3, e.powi(3));
        prop_assert!((m.surface_area_mm2 - 6.0 * e * e).abs() <= tol * e * e);
        prop_assert!((m.horizontal_area_mm2 - 2.0 * e * e).abs() <= tol * e * e);
    }
}
