//! Landscape-metrics engine over a classified [`PixelGrid`].
//!
//! Follows the FRAGSTATS conventions: patches are 8-connected runs of one
//! class, no-data cells are excluded from the landscape area, and edges
//! against no-data or the grid border are not counted. Areas are in m², the
//! cell side `res` in metres.
use std::collections::VecDeque;

use crate::grid::PixelGrid;
use crate::taxonomy::{CoarseClass, N_CLASSES};

/// One connected patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Patch {
    pub class: CoarseClass,
    /// Patch size in cells.
    pub cells: usize,
}

/// Class-level statistics, FRAGSTATS units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassMetrics {
    /// Patches per 100 ha.
    pub patch_density: f64,
    /// Edge length per hectare (m/ha).
    pub edge_density: f64,
    /// Mean patch size in cells.
    pub area_mn: f64,
    /// Largest patch as a percentage of the landscape area.
    pub largest_patch_index: f64,
}

const NEIGHBOURS_8: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

pub struct Landscape {
    res: f64,
    valid_cells: usize,
    patches: Vec<Patch>,
    class_cells: [usize; N_CLASSES],
    /// Cell sides shared with a different class, per class.
    class_edges: [usize; N_CLASSES],
    /// Double-counted 4-neighbour adjacency matrix (g_ik).
    adjacency: [[u64; N_CLASSES]; N_CLASSES],
}

impl Landscape {
    /// Delineate patches and tally adjacencies for `grid` at cell size `res`.
    pub fn new(grid: &PixelGrid, res: f64) -> Self {
        let (w, h) = (grid.width, grid.height);
        let mut class_cells = [0usize; N_CLASSES];
        let mut class_edges = [0usize; N_CLASSES];
        let mut adjacency = [[0u64; N_CLASSES]; N_CLASSES];

        // --- Composition and 4-neighbour adjacencies ---
        for r in 0..h {
            for c in 0..w {
                let Some(a) = grid.get(r, c) else { continue };
                class_cells[a.index()] += 1;

                let right = (c + 1 < w).then(|| grid.get(r, c + 1)).flatten();
                let below = (r + 1 < h).then(|| grid.get(r + 1, c)).flatten();
                for b in [right, below].into_iter().flatten() {
                    adjacency[a.index()][b.index()] += 1;
                    adjacency[b.index()][a.index()] += 1;
                    if a != b {
                        class_edges[a.index()] += 1;
                        class_edges[b.index()] += 1;
                    }
                }
            }
        }

        // --- Patch delineation (8-connectivity, BFS) ---
        let mut visited = vec![false; w * h];
        let mut patches = Vec::new();
        let mut queue = VecDeque::new();
        for start in 0..w * h {
            if visited[start] {
                continue;
            }
            let Some(class) = grid.cells[start] else { continue };
            visited[start] = true;
            queue.push_back(start);
            let mut cells = 0usize;

            while let Some(idx) = queue.pop_front() {
                cells += 1;
                let (r, c) = ((idx / w) as isize, (idx % w) as isize);
                for (dr, dc) in NEIGHBOURS_8 {
                    let (nr, nc) = (r + dr, c + dc);
                    if nr < 0 || nc < 0 || nr >= h as isize || nc >= w as isize {
                        continue;
                    }
                    let n = nr as usize * w + nc as usize;
                    if !visited[n] && grid.cells[n] == Some(class) {
                        visited[n] = true;
                        queue.push_back(n);
                    }
                }
            }
            patches.push(Patch { class, cells });
        }

        Self {
            res,
            valid_cells: class_cells.iter().sum(),
            patches,
            class_cells,
            class_edges,
            adjacency,
        }
    }

    /// Classes with at least one cell, in id order.
    pub fn present_classes(&self) -> Vec<CoarseClass> {
        CoarseClass::ALL
            .into_iter()
            .filter(|c| self.class_cells[c.index()] > 0)
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn patches(&self) -> &[Patch] {
        &self.patches
    }

    /// Total landscape area (m²), no-data excluded.
    pub fn landscape_area(&self) -> f64 {
        self.valid_cells as f64 * self.res * self.res
    }

    /// Class-level metrics, or `None` when `class` does not occur.
    pub fn class_metrics(&self, class: CoarseClass) -> Option<ClassMetrics> {
        let cells = self.class_cells[class.index()];
        if cells == 0 {
            return None;
        }
        let area = self.landscape_area();
        let (n_patches, largest) = self
            .patches
            .iter()
            .filter(|p| p.class == class)
            .fold((0usize, 0usize), |(n, max), p| (n + 1, max.max(p.cells)));
        let edge_m = self.class_edges[class.index()] as f64 * self.res;

        Some(ClassMetrics {
            patch_density: n_patches as f64 / area * 1_000_000.0,
            edge_density: edge_m / area * 10_000.0,
            area_mn: cells as f64 / n_patches as f64,
            largest_patch_index: 100.0 * largest as f64 / self.valid_cells as f64,
        })
    }

    /// Contagion index (percent).
    ///
    ///   CONTAG = 100 · [1 + Σᵢ Σₖ qᵢₖ ln qᵢₖ / (2 ln m)],  qᵢₖ = Pᵢ · gᵢₖ / Σₖ gᵢₖ
    ///
    /// Pᵢ is the landscape share of class i, gᵢₖ the double-counted adjacency
    /// count and m the number of classes present. Undefined for m < 2, where
    /// 0.0 is returned.
    pub fn contagion(&self) -> f64 {
        let present = self.present_classes();
        let m = present.len();
        if m < 2 {
            return 0.0;
        }

        let mut sum = 0.0f64;
        for &i in &present {
            let p_i = self.class_cells[i.index()] as f64 / self.valid_cells as f64;
            let row = &self.adjacency[i.index()];
            let row_sum: u64 = row.iter().sum();
            if row_sum == 0 {
                continue;
            }
            for &g_ik in row {
                if g_ik == 0 {
                    continue;
                }
                let q = p_i * g_ik as f64 / row_sum as f64;
                sum += q * q.ln();
            }
        }

        100.0 * (1.0 + sum / (2.0 * (m as f64).ln()))
    }
}
