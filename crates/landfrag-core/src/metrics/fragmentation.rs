//! Target-class fragmentation metrics plus whole-landscape contagion.
use serde::Serialize;

use super::landscape::Landscape;
use crate::grid::PixelGrid;
use crate::taxonomy::CoarseClass;

/// Square metres per hectare.
const M2_PER_HA: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FragmentationMetrics {
    /// Target-class patches per 100 ha.
    pub patch_density: f64,
    /// Target-class edge length, m/ha.
    pub edge_density: f64,
    /// Target-class mean patch area, hectares.
    pub mean_patch_area_ha: f64,
    /// Target-class largest patch index, percent.
    pub largest_patch_index: f64,
    /// Whole-landscape contagion, percent.
    pub contagion: f64,
}

impl FragmentationMetrics {
    pub fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            patch_density: f(self.patch_density),
            edge_density: f(self.edge_density),
            mean_patch_area_ha: f(self.mean_patch_area_ha),
            largest_patch_index: f(self.largest_patch_index),
            contagion: f(self.contagion),
        }
    }
}

/// Mean patch area in cells → hectares for square cells of side `res` metres.
pub fn cells_to_hectares(area_cells: f64, res: f64) -> f64 {
    area_cells * res * res / M2_PER_HA
}

/// Fragmentation of `target` within `grid`. When `target` is absent the four
/// class metrics are 0.0; contagion is always computed.
pub fn compute_metrics(grid: &PixelGrid, res: f64, target: CoarseClass) -> FragmentationMetrics {
    let landscape = Landscape::new(grid, res);
    let contagion = landscape.contagion();

    match landscape.class_metrics(target) {
        Some(m) => FragmentationMetrics {
            patch_density: m.patch_density,
            edge_density: m.edge_density,
            mean_patch_area_ha: cells_to_hectares(m.area_mn, res),
            largest_patch_index: m.largest_patch_index,
            contagion,
        },
        None => FragmentationMetrics {
            contagion,
            ..FragmentationMetrics::default()
        },
    }
}
