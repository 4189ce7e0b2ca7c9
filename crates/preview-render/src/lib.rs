//! Live 3D preview of an uploaded STL on a virtual print bed.
//!
//! [`PreviewScene`] owns one geometry and one material on a
//! [`GraphicsBackend`] and releases them explicitly: the geometry on every
//! model replacement, both on teardown or drop. Recoloring mutates the
//! existing material. [`SvgBackend`] is a software backend that draws the
//! scene as an SVG with painter's-order shading.

pub mod backend;
pub mod bed;
pub mod camera;
pub mod color;
pub mod error;
pub mod scene;
pub mod svg;

pub use backend::{DrawList, GeometryId, GraphicsBackend, MaterialId, ModelInstance, ResourceCounts};
pub use bed::BedSpec;
pub use camera::OrbitCamera;
pub use color::Rgb;
pub use error::PreviewError;
pub use scene::PreviewScene;
pub use svg::SvgBackend;
