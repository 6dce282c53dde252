//! Occupancy rasterization: damage zones → fixed-resolution binary grid.

use crate::types::{DamageZone, GridConfig};
use serde::{Deserialize, Serialize};

pub const BLOCKED: u8 = 0;
pub const CLEAR: u8 = 1;

// ---------------------------------------------------------------------------
// Grid geometry
// ---------------------------------------------------------------------------

impl GridConfig {
    pub fn cell_width(&self) -> f32 {
        self.world_width / self.cols as f32
    }

    pub fn cell_depth(&self) -> f32 {
        self.world_depth / self.rows as f32
    }

    /// World-space `(x, z)` sample point of a cell: its geometric center.
    ///
    /// Row 0 sits on the minimum-z edge, column 0 on the minimum-x edge.
    pub fn cell_center(&self, row: usize, col: usize) -> (f32, f32) {
        let cw = self.cell_width();
        let ch = self.cell_depth();
        (
            -self.world_width / 2.0 + col as f32 * cw + cw / 2.0,
            -self.world_depth / 2.0 + row as f32 * ch + ch / 2.0,
        )
    }

    /// `(row, col)` of the cell covering `(x, z)`, or `None` outside the grid.
    pub fn world_to_cell(&self, x: f32, z: f32) -> Option<(usize, usize)> {
        let gx = (x + self.world_width / 2.0) / self.cell_width();
        let gz = (z + self.world_depth / 2.0) / self.cell_depth();
        if !(gx >= 0.0 && gz >= 0.0) {
            return None;
        }
        let (col, row) = (gx.floor() as usize, gz.floor() as usize);
        (row < self.rows && col < self.cols).then_some((row, col))
    }
}

// ---------------------------------------------------------------------------
// Matrix
// ---------------------------------------------------------------------------

/// Row-major 0/1 grid. Serializes as a plain 2D JSON array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OccupancyMatrix {
    rows: Vec<Vec<u8>>,
}

impl OccupancyMatrix {
    /// An all-clear matrix.
    pub fn clear(rows: usize, cols: usize) -> Self {
        Self {
            rows: vec![vec![CLEAR; cols]; rows],
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn col_count(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<u8> {
        self.rows.get(row).and_then(|r| r.get(col)).copied()
    }

    pub fn is_blocked(&self, row: usize, col: usize) -> bool {
        self.get(row, col) == Some(BLOCKED)
    }

    pub fn blocked_count(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.iter().filter(|&&c| c == BLOCKED).count())
            .sum()
    }

    pub fn rows(&self) -> &[Vec<u8>] {
        &self.rows
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Rasterize `zones` onto `grid`. A cell is blocked when its center lies in
/// any zone (edges inclusive).
pub fn rasterize(zones: &[DamageZone], grid: &GridConfig) -> OccupancyMatrix {
    let mut rows = Vec::with_capacity(grid.rows);
    for row in 0..grid.rows {
        let mut cells = Vec::with_capacity(grid.cols);
        for col in 0..grid.cols {
            let (x, z) = grid.cell_center(row, col);
            let blocked = zones.iter().any(|zone| zone.contains(x, z));
            cells.push(if blocked { BLOCKED } else { CLEAR });
        }
        rows.push(cells);
    }
    OccupancyMatrix { rows }
}
