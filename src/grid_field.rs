use serde::{Deserialize, Serialize};

/// 2D scalar temperature field over a rectangular domain with fixed spacing.
///
/// The field is double buffered: operators read `current` and write `next`
/// during a step, then the simulation commits `next` into `current`. Out of
/// bounds neighbors mirror the cell itself, so the raw Laplacian is zero-flux
/// (insulated) by default; fixed-temperature and Robin edges are imposed by
/// the boundary-loss operator after diffusion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridField {
    pub nx: usize,
    pub ny: usize,
    pub dx_m: f64,
    pub dy_m: f64,
    current: Vec<f64>,
    next: Vec<f64>,
}

impl GridField {
    pub fn new(nx: usize, ny: usize, dx_m: f64, dy_m: f64, fill_k: f64) -> Self {
        GridField {
            nx,
            ny,
            dx_m,
            dy_m,
            current: vec![fill_k; nx * ny],
            next: vec![fill_k; nx * ny],
        }
    }

    #[inline]
    pub fn idx(&self, i: usize, j: usize) -> usize {
        i * self.ny + j
    }

    #[inline]
    pub fn kelvin(&self, i: usize, j: usize) -> f64 {
        self.current[self.idx(i, j)]
    }

    pub fn cell_count(&self) -> usize {
        self.current.len()
    }

    pub fn current_values(&self) -> &[f64] {
        &self.current
    }

    pub fn next_values(&self) -> &[f64] {
        &self.next
    }

    pub fn next_values_mut(&mut self) -> &mut [f64] {
        &mut self.next
    }

    /// Copy the committed state into the working buffer at the start of a step.
    pub fn reset_next(&mut self) {
        self.next.copy_from_slice(&self.current);
    }

    /// Commit the working buffer. Returns the maximum per-cell |delta T| of
    /// this step, which the run loop divides by dt for quasi-steady detection.
    pub fn commit_next(&mut self) -> f64 {
        let mut max_delta: f64 = 0.0;
        for (cur, nxt) in self.current.iter().zip(self.next.iter()) {
            let d = (nxt - cur).abs();
            if d > max_delta {
                max_delta = d;
            }
        }
        std::mem::swap(&mut self.current, &mut self.next);
        max_delta
    }

    /// Five-point Laplacian of the committed state at (i, j), in K/m^2.
    /// Missing neighbors mirror the center value (zero-flux).
    #[inline]
    pub fn laplacian(&self, i: usize, j: usize) -> f64 {
        let c = self.kelvin(i, j);
        let left = if i > 0 { self.kelvin(i - 1, j) } else { c };
        let right = if i + 1 < self.nx { self.kelvin(i + 1, j) } else { c };
        let down = if j > 0 { self.kelvin(i, j - 1) } else { c };
        let up = if j + 1 < self.ny { self.kelvin(i, j + 1) } else { c };
        (left + right - 2.0 * c) / (self.dx_m * self.dx_m)
            + (down + up - 2.0 * c) / (self.dy_m * self.dy_m)
    }

    pub fn peak_kelvin(&self) -> f64 {
        self.current.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn mean_kelvin(&self) -> f64 {
        self.current.iter().sum::<f64>() / self.current.len() as f64
    }

    pub fn all_finite(&self) -> bool {
        self.current.iter().all(|v| v.is_finite())
    }

    /// Cell indices whose centers lie within `radius_m` of (cx_m, cy_m).
    pub fn cells_within_radius(&self, cx_m: f64, cy_m: f64, radius_m: f64) -> Vec<usize> {
        let r2 = radius_m * radius_m;
        let mut cells = Vec::new();
        for i in 0..self.nx {
            let x = (i as f64 + 0.5) * self.dx_m;
            for j in 0..self.ny {
                let y = (j as f64 + 0.5) * self.dy_m;
                let dx = x - cx_m;
                let dy = y - cy_m;
                if dx * dx + dy * dy <= r2 {
                    cells.push(self.idx(i, j));
                }
            }
        }
        cells
    }

    /// Indices of the cells on the four domain edges (each listed once).
    pub fn edge_cells(&self) -> Vec<usize> {
        let mut cells = Vec::new();
        for j in 0..self.ny {
            cells.push(self.idx(0, j));
            if self.nx > 1 {
                cells.push(self.idx(self.nx - 1, j));
            }
        }
        for i in 1..self.nx.saturating_sub(1) {
            cells.push(self.idx(i, 0));
            if self.ny > 1 {
                cells.push(self.idx(i, self.ny - 1));
            }
        }
        cells
    }
}
