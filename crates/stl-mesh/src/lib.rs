//! STL mesh loading for the print-quote engine.
//!
//! - [`TriangleMesh`]: flat position/normal buffers, optionally indexed
//! - [`load_stl`]: binary/ASCII STL parsing with an early complexity guard
//! - [`export`]: binary/ASCII STL writers
//! - [`ComplexityLimits`]: per-platform vertex/triangle ceilings

pub mod error;
pub mod export;
pub mod limits;
pub mod load;
pub mod mesh;

pub use error::StlError;
pub use export::{export_ascii_stl, export_binary_stl};
pub use limits::{ComplexityExceeded, ComplexityLimits};
pub use load::{detect_format, load_stl, LoadedMesh, StlFormat};
pub use mesh::{BoundingBox, MeshError, TriangleMesh};
