//! STL export from a [`TriangleMesh`], binary and ASCII.
//!
//! Facet normals are computed from winding, never copied from the vertex
//! normal buffer.

use std::fmt::Write as _;

use nalgebra::Vector3;
use stl_io::{Normal, Triangle, Vertex};

use crate::error::StlError;
use crate::mesh::TriangleMesh;

/// Export a mesh as a binary STL file. The header carries `name`.
pub fn export_binary_stl(mesh: &TriangleMesh, name: &str) -> Result<Vec<u8>, StlError> {
    mesh.validate()?;
    let tri_count = mesh.triangle_count();
    if u32::try_from(tri_count).is_err() {
        return Err(StlError::malformed("too many triangles for binary STL"));
    }

    let triangles: Vec<Triangle> = (0..tri_count)
        .map(|t| {
            let tri = mesh.triangle(t);
            let n = facet_normal(mesh, tri);
            Triangle {
                normal: Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                vertices: tri.map(|i| {
                    Vertex::new([
                        mesh.positions[i * 3],
                        mesh.positions[i * 3 + 1],
                        mesh.positions[i * 3 + 2],
                    ])
                }),
            }
        })
        .collect();

    let mut buf = Vec::with_capacity(84 + tri_count * 50);
    stl_io::write_stl(&mut buf, triangles.iter())
        .map_err(|e| StlError::malformed(format!("failed to write STL: {}", e)))?;

    let header = format!("binary STL: {}", name);
    let header_bytes = &header.as_bytes()[..header.len().min(80)];
    buf[..header_bytes.len()].copy_from_slice(header_bytes);

    Ok(buf)
}

/// Export a mesh as an ASCII STL string.
pub fn export_ascii_stl(mesh: &TriangleMesh, name: &str) -> Result<String, StlError> {
    mesh.validate()?;
    let tri_count = mesh.triangle_count();

    let mut out = String::with_capacity(tri_count * 300);
    // Writing into a String cannot fail.
    let _ = writeln!(out, "solid {}", name);
    for t in 0..tri_count {
        let tri = mesh.triangle(t);
        let n = facet_normal(mesh, tri);
        let _ = writeln!(out, "  facet normal {} {} {}", n.x as f32, n.y as f32, n.z as f32);
        out.push_str("    outer loop\n");
        for i in tri {
            let _ = writeln!(
                out,
                "      vertex {} {} {}",
                mesh.positions[i * 3],
                mesh.positions[i * 3 + 1],
                mesh.positions[i * 3 + 2]
            );
        }
        out.push_str("    endloop\n");
        out.push_str("  endfacet\n");
    }
    let _ = writeln!(out, "endsolid {}", name);
    Ok(out)
}

fn facet_normal(mesh: &TriangleMesh, [i0, i1, i2]: [usize; 3]) -> Vector3<f64> {
    let a = mesh.vertex(i0);
    let n = (mesh.vertex(i1) - a).cross(&(mesh.vertex(i2) - a));
    let len = n.norm();
    if len > 1e-12 {
        n / len
    } else {
        Vector3::new(0.0, 0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn box_mesh() -> TriangleMesh {
        TriangleMesh::indexed(
            vec![
                0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0, //
                0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 1.0, 1.0, 1.0, 0.0, 1.0, 1.0,
            ],
            vec![
                0, 2, 1, 0, 3, 2, // back
                4, 5, 6, 4, 6, 7, // front
                0, 1, 5, 0, 5, 4, // bottom
                3, 7, 6, 3, 6, 2, // top
                0, 4, 7, 0, 7, 3, // left
                1, 2, 6, 1, 6, 5, // right
            ],
        )
    }

    #[test]
    fn binary_size_formula() {
        let mesh = box_mesh();
        let stl = export_binary_stl(&mesh, "box").unwrap();
        assert_eq!(stl.len(), 80 + 4 + 12 * 50);
        assert_eq!(u32::from_le_bytes([stl[80], stl[81], stl[82], stl[83]]), 12);
        assert!(String::from_utf8_lossy(&stl[..80]).contains("box"));
    }

    #[test]
    fn ascii_keywords() {
        let stl = export_ascii_stl(&box_mesh(), "cube").unwrap();
        assert!(stl.starts_with("solid cube\n"));
        assert!(stl.ends_with("endsolid cube\n"));
        assert_eq!(stl.matches("endfacet").count(), 12);
    }

    #[test]
    fn empty_mesh_is_rejected() {
        assert!(export_binary_stl(&TriangleMesh::new(), "empty").is_err());
        assert!(export_ascii_stl(&TriangleMesh::new(), "empty").is_err());
    }
}
