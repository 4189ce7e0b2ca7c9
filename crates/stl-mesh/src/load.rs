//! Binary and ASCII STL parsing.
//!
//! Binary STL layout:
//! - 80-byte header (ignored)
//! - u32 triangle count (little-endian)
//! - per triangle: 3×f32 normal (ignored) + 3×(3×f32 vertex) + u16 attribute = 50 bytes
//!
//! The preamble is inspected here so oversized or truncated files are
//! rejected before any triangle is decoded; the records themselves are read
//! with `stl_io`. Normals from either format are discarded and recomputed
//! from winding.

use std::io::{self, Cursor};

use nalgebra::Vector3;
use quote_types::MeshBounds;
use stl_io::{AsciiStlReader, BinaryStlReader, Triangle};
use tracing::{debug, info, instrument};

use crate::error::StlError;
use crate::limits::ComplexityLimits;
use crate::mesh::TriangleMesh;

const HEADER_LEN: usize = 80;
const PREAMBLE_LEN: usize = HEADER_LEN + 4;
const TRIANGLE_RECORD_LEN: usize = 50;

/// Encoding of an STL buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StlFormat {
    Binary,
    Ascii,
}

/// A parsed, horizontally centered mesh plus its bed placement data.
#[derive(Debug, Clone)]
pub struct LoadedMesh {
    pub mesh: TriangleMesh,
    pub format: StlFormat,
    pub bounds: MeshBounds,
}

impl LoadedMesh {
    /// Lift the mesh so its lowest point sits on Y = 0.
    pub fn place_on_bed(&mut self) {
        let lift = Vector3::new(0.0, self.bounds.y_offset, 0.0);
        self.mesh.translate(&lift);
        self.bounds = MeshBounds::from_extents(
            [self.bounds.min[0], self.bounds.min[1] + lift.y, self.bounds.min[2]],
            [self.bounds.max[0], self.bounds.max[1] + lift.y, self.bounds.max[2]],
        );
    }
}

/// Decide how to parse `bytes`.
///
/// A buffer whose size exactly matches its declared binary triangle count is
/// binary even when its header happens to start with `solid`.
pub fn detect_format(bytes: &[u8]) -> StlFormat {
    if let Some(count) = declared_triangle_count(bytes) {
        if expected_binary_len(count) == Some(bytes.len()) {
            return StlFormat::Binary;
        }
    }
    let head = &bytes[ascii_start(bytes)..];
    if head.len() >= 5 && head[..5].eq_ignore_ascii_case(b"solid") {
        StlFormat::Ascii
    } else {
        StlFormat::Binary
    }
}

/// Parse an STL buffer into a centered triangle soup.
///
/// The complexity ceiling is enforced before the triangle records are
/// touched (binary) or as soon as it is crossed (ASCII).
#[instrument(skip(bytes, limits), fields(len = bytes.len()))]
pub fn load_stl(bytes: &[u8], limits: &ComplexityLimits) -> Result<LoadedMesh, StlError> {
    let format = detect_format(bytes);
    debug!(?format, "detected STL format");

    let positions = match format {
        StlFormat::Binary => {
            let count = check_binary_preamble(bytes, limits)?;
            let mut cursor = Cursor::new(bytes);
            let reader = BinaryStlReader::create_triangle_iterator(&mut cursor)
                .map_err(unreadable)?;
            collect_positions(reader, limits, count)?
        }
        StlFormat::Ascii => {
            // Keywords match in any case; the rest is numbers and the solid name.
            let text = bytes[ascii_start(bytes)..].to_ascii_lowercase();
            let mut cursor = Cursor::new(text);
            let reader =
                AsciiStlReader::create_triangle_iterator(&mut cursor).map_err(unreadable)?;
            collect_positions(reader, limits, 0)?
        }
    };

    let mut mesh = TriangleMesh::from_soup(positions);
    mesh.validate()?;
    let bb = mesh
        .center_horizontally()
        .ok_or_else(|| StlError::malformed("mesh has no vertices"))?;
    let bounds = bb.to_mesh_bounds();

    info!(
        ?format,
        triangles = mesh.triangle_count(),
        height = bounds.height,
        "loaded STL mesh"
    );

    Ok(LoadedMesh {
        mesh,
        format,
        bounds,
    })
}

/// Validate the binary preamble against the limits and the buffer length.
/// Returns the declared triangle count.
fn check_binary_preamble(bytes: &[u8], limits: &ComplexityLimits) -> Result<usize, StlError> {
    let count = declared_triangle_count(bytes).ok_or_else(|| {
        StlError::malformed(format!(
            "{} bytes is shorter than the {}-byte binary preamble",
            bytes.len(),
            PREAMBLE_LEN
        ))
    })?;

    limits.check(count.saturating_mul(3), count)?;

    if count == 0 {
        return Err(StlError::malformed("binary STL declares zero triangles"));
    }
    let expected = expected_binary_len(count)
        .ok_or_else(|| StlError::malformed("triangle count overflows"))?;
    if bytes.len() != expected {
        return Err(StlError::malformed(format!(
            "expected {} bytes for {} triangles, got {}",
            expected,
            count,
            bytes.len()
        )));
    }
    Ok(count)
}

/// Drain a triangle iterator into a flat position buffer.
fn collect_positions<I>(
    triangles: I,
    limits: &ComplexityLimits,
    capacity: usize,
) -> Result<Vec<f32>, StlError>
where
    I: Iterator<Item = io::Result<Triangle>>,
{
    let mut positions = Vec::with_capacity(capacity.saturating_mul(9));
    let mut facets = 0usize;
    for triangle in triangles {
        let triangle = triangle.map_err(unreadable)?;
        facets += 1;
        limits.check(facets * 3, facets)?;
        for vertex in &triangle.vertices {
            let [x, y, z] = [vertex[0], vertex[1], vertex[2]];
            if !(x.is_finite() && y.is_finite() && z.is_finite()) {
                return Err(StlError::malformed(format!(
                    "non-finite vertex coordinate in facet {}",
                    facets
                )));
            }
            positions.extend_from_slice(&[x, y, z]);
        }
    }
    if facets == 0 {
        return Err(StlError::malformed("no facets found"));
    }
    Ok(positions)
}

fn unreadable(err: io::Error) -> StlError {
    StlError::malformed(err.to_string())
}

/// Offset of the first non-whitespace byte.
fn ascii_start(bytes: &[u8]) -> usize {
    bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len())
}

fn declared_triangle_count(bytes: &[u8]) -> Option<usize> {
    let raw: [u8; 4] = bytes.get(HEADER_LEN..PREAMBLE_LEN)?.try_into().ok()?;
    Some(u32::from_le_bytes(raw) as usize)
}

fn expected_binary_len(count: usize) -> Option<usize> {
    count
        .checked_mul(TRIANGLE_RECORD_LEN)
        .and_then(|body| body.checked_add(PREAMBLE_LEN))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const TETRA_ASCII: &str = "solid tetra
  facet normal 0 0 -1
    outer loop
      vertex 0 0 0
      vertex 0 10 0
      vertex 10 0 0
    endloop
  endfacet
  facet normal 0 -1 0
    outer loop
      vertex 0 0 0
      vertex 10 0 0
      vertex 0 0 10
    endloop
  endfacet
endsolid tetra
";

    fn binary_with_count(declared: u32, actual: usize) -> Vec<u8> {
        let mut buf = vec![0u8; HEADER_LEN];
        buf.extend_from_slice(&declared.to_le_bytes());
        for t in 0..actual {
            buf.extend_from_slice(&[0u8; 12]);
            let base = t as f32;
            for v in [[base, 0.0, 0.0], [base + 1.0, 0.0, 0.0], [base, 1.0, 0.0]] {
                for c in v {
                    buf.extend_from_slice(&f32::to_le_bytes(c));
                }
            }
            buf.extend_from_slice(&0u16.to_le_bytes());
        }
        buf
    }

    #[test]
    fn detects_ascii_with_leading_whitespace() {
        assert_eq!(detect_format(b"  \nsolid x\n"), StlFormat::Ascii);
        assert_eq!(detect_format(b"SOLID x\n"), StlFormat::Ascii);
    }

    #[test]
    fn exact_length_wins_over_solid_header() {
        let mut buf = binary_with_count(1, 1);
        buf[..5].copy_from_slice(b"solid");
        assert_eq!(detect_format(&buf), StlFormat::Binary);
        let loaded = load_stl(&buf, &ComplexityLimits::desktop()).unwrap();
        assert_eq!(loaded.format, StlFormat::Binary);
        assert_eq!(loaded.mesh.triangle_count(), 1);
    }

    #[test]
    fn parses_ascii_facets() {
        let loaded = load_stl(TETRA_ASCII.as_bytes(), &ComplexityLimits::desktop()).unwrap();
        assert_eq!(loaded.format, StlFormat::Ascii);
        assert_eq!(loaded.mesh.triangle_count(), 2);
        assert_relative_eq!(loaded.bounds.height, 10.0);
        assert_relative_eq!(loaded.bounds.y_offset, 0.0);
    }

    #[test]
    fn placing_on_bed_lifts_to_zero() {
        let text = TETRA_ASCII.replace("vertex 0 0 0", "vertex 0 -4 0");
        let mut loaded = load_stl(text.as_bytes(), &ComplexityLimits::desktop()).unwrap();
        assert_relative_eq!(loaded.bounds.y_offset, 4.0);
        loaded.place_on_bed();
        assert_relative_eq!(loaded.bounds.min[1], 0.0);
        assert_relative_eq!(loaded.bounds.y_offset, 0.0);
        let bb = loaded.mesh.bounding_box().unwrap();
        assert_relative_eq!(bb.min.y, 0.0);
        assert_relative_eq!(bb.max.y, 14.0);
    }

    #[test]
    fn ascii_without_facets_is_malformed() {
        let err = load_stl(b"solid empty\nendsolid empty\n", &ComplexityLimits::desktop())
            .unwrap_err();
        assert!(matches!(err, StlError::Malformed { .. }));
    }

    #[test]
    fn ascii_bad_coordinate_is_malformed() {
        let text = TETRA_ASCII.replacen("vertex 0 10 0", "vertex 0 ten 0", 1);
        let err = load_stl(text.as_bytes(), &ComplexityLimits::desktop()).unwrap_err();
        assert!(matches!(err, StlError::Malformed { .. }));
    }

    #[test]
    fn ascii_quad_facet_is_malformed() {
        let text = TETRA_ASCII.replacen(
            "vertex 10 0 0\n    endloop",
            "vertex 10 0 0\n      vertex 10 10 0\n    endloop",
            1,
        );
        let err = load_stl(text.as_bytes(), &ComplexityLimits::desktop()).unwrap_err();
        assert!(matches!(err, StlError::Malformed { .. }));
    }

    #[test]
    fn ascii_crossing_ceiling_is_too_complex() {
        let limits = ComplexityLimits {
            max_vertices: 3,
            max_triangles: 10,
        };
        let err = load_stl(TETRA_ASCII.as_bytes(), &limits).unwrap_err();
        assert!(matches!(err, StlError::TooComplex(_)));
    }

    #[test]
    fn truncated_binary_is_malformed() {
        let buf = binary_with_count(100, 10);
        let err = load_stl(&buf, &ComplexityLimits::desktop()).unwrap_err();
        assert!(matches!(err, StlError::Malformed { .. }), "{err}");
        assert_eq!(err.error_code(), quote_types::ErrorCode::StlUnreadable);
    }

    #[test]
    fn binary_count_is_checked_before_length() {
        // Declares far more triangles than allowed but carries almost no data.
        let buf = binary_with_count(5_000_000, 1);
        let err = load_stl(&buf, &ComplexityLimits::desktop()).unwrap_err();
        assert!(matches!(err, StlError::TooComplex(_)));
        assert_eq!(err.error_code(), quote_types::ErrorCode::TooComplex);
    }

    #[test]
    fn short_buffer_is_malformed() {
        let err = load_stl(&[0u8; 20], &ComplexityLimits::desktop()).unwrap_err();
        assert!(matches!(err, StlError::Malformed { .. }));
    }

    #[test]
    fn zero_triangle_binary_is_malformed() {
        let buf = binary_with_count(0, 0);
        let err = load_stl(&buf, &ComplexityLimits::desktop()).unwrap_err();
        assert!(matches!(err, StlError::Malformed { .. }));
    }
}
