/// The virtual print bed: a square plate at Y = 0 centered on the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BedSpec {
    pub size_mm: f64,
    pub divisions: u32,
}

impl Default for BedSpec {
    fn default() -> Self {
        Self {
            size_mm: 256.0,
            divisions: 16,
        }
    }
}

impl BedSpec {
    pub fn cell_mm(&self) -> f64 {
        self.size_mm / self.divisions.max(1) as f64
    }

    /// Grid line segments in the XZ plane, `divisions + 1` per direction.
    pub fn grid_lines(&self) -> Vec<([f64; 3], [f64; 3])> {
        let half = self.size_mm / 2.0;
        let cell = self.cell_mm();
        let n = self.divisions.max(1);
        let mut lines = Vec::with_capacity(2 * (n as usize + 1));
        for i in 0..=n {
            let t = -half + i as f64 * cell;
            lines.push(([t, 0.0, -half], [t, 0.0, half]));
            lines.push(([-half, 0.0, t], [half, 0.0, t]));
        }
        lines
    }

    /// Whether a footprint of `width × depth` centered on the origin fits.
    pub fn fits(&self, width: f64, depth: f64) -> bool {
        width <= self.size_mm && depth <= self.size_mm
    }
}
