use quote_types::Platform;
use serde::{Deserialize, Serialize};

/// Processing ceilings for a mesh. Checked before any O(n) work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexityLimits {
    pub max_vertices: usize,
    pub max_triangles: usize,
}

impl Default for ComplexityLimits {
    fn default() -> Self {
        Self::desktop()
    }
}

impl ComplexityLimits {
    pub const DESKTOP_MAX_VERTICES: usize = 2_000_000;
    pub const MOBILE_MAX_VERTICES: usize = 800_000;
    pub const MAX_TRIANGLES: usize = 1_200_000;

    pub fn desktop() -> Self {
        Self {
            max_vertices: Self::DESKTOP_MAX_VERTICES,
            max_triangles: Self::MAX_TRIANGLES,
        }
    }

    /// Stricter ceiling for constrained (iOS) devices.
    pub fn mobile() -> Self {
        Self {
            max_vertices: Self::MOBILE_MAX_VERTICES,
            max_triangles: Self::MAX_TRIANGLES,
        }
    }

    pub fn for_platform(platform: Platform) -> Self {
        match platform {
            Platform::Desktop => Self::desktop(),
            Platform::Mobile => Self::mobile(),
        }
    }

    pub fn check(&self, vertices: usize, triangles: usize) -> Result<(), ComplexityExceeded> {
        if vertices > self.max_vertices || triangles > self.max_triangles {
            return Err(ComplexityExceeded {
                vertices,
                triangles,
                max_vertices: self.max_vertices,
                max_triangles: self.max_triangles,
            });
        }
        Ok(())
    }
}

/// A mesh is larger than the configured ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error(
    "mesh too complex: {vertices} vertices / {triangles} triangles \
     (limit {max_vertices} / {max_triangles})"
)]
pub struct ComplexityExceeded {
    pub vertices: usize,
    pub triangles: usize,
    pub max_vertices: usize,
    pub max_triangles: usize,
}
