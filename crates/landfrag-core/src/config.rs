//! Run configuration. Every field has a default, so an empty JSON object is
//! a valid config.
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::acquire::RetryPolicy;
use crate::error::Result;
use crate::source::SourceCatalog;
use crate::taxonomy::CoarseClass;

/// A named buffer radius around a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialScale {
    pub label: String,
    pub radius_m: f64,
}

impl SpatialScale {
    pub fn new(label: &str, radius_m: f64) -> Self {
        Self {
            label: label.to_string(),
            radius_m,
        }
    }
}

/// Default buffers: 1, 2.5, 5 and 10 km.
pub fn default_scales() -> Vec<SpatialScale> {
    vec![
        SpatialScale::new("1km", 1_000.0),
        SpatialScale::new("2.5km", 2_500.0),
        SpatialScale::new("5km", 5_000.0),
        SpatialScale::new("10km", 10_000.0),
    ]
}

/// Remote raster service connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL of the raster service.
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8765".to_string(),
            timeout_secs: 300,
        }
    }
}

impl ServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub catalog: SourceCatalog,
    /// Analysed in order; the largest radius bounds the raster acquisition.
    pub scales: Vec<SpatialScale>,
    /// Ground sampling distance of reductions and exports (m).
    pub resolution_m: f64,
    /// Pixel cap passed to reductions and exports.
    pub max_pixels: f64,
    /// Let reductions coarsen instead of failing when over the pixel cap.
    pub best_effort: bool,
    /// Class whose fragmentation is reported.
    pub target_class: CoarseClass,
    pub retry: RetryPolicy,
    pub service: ServiceConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            catalog: SourceCatalog::default(),
            scales: default_scales(),
            resolution_m: 30.0,
            max_pixels: 1e9,
            best_effort: true,
            target_class: CoarseClass::Forest,
            retry: RetryPolicy::default(),
            service: ServiceConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load a JSON config; missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Largest configured buffer, if any.
    pub fn largest_scale(&self) -> Option<&SpatialScale> {
        self.scales
            .iter()
            .max_by(|a, b| a.radius_m.total_cmp(&b.radius_m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_gives_defaults() {
        let cfg: PipelineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, PipelineConfig::default());
        assert_eq!(cfg.scales.len(), 4);
        assert_eq!(cfg.resolution_m, 30.0);
        assert_eq!(cfg.retry.max_attempts, 3);
        assert_eq!(cfg.target_class, CoarseClass::Forest);
    }

    #[test]
    fn partial_json_overrides_fields() {
        let cfg: PipelineConfig = serde_json::from_str(
            r#"{ "service": { "endpoint": "https://raster.example" },
                 "scales": [ { "label": "500m", "radius_m": 500.0 } ] }"#,
        )
        .unwrap();
        assert_eq!(cfg.service.endpoint, "https://raster.example");
        assert_eq!(cfg.service.timeout_secs, 300);
        assert_eq!(cfg.scales, vec![SpatialScale::new("500m", 500.0)]);
    }

    #[test]
    fn largest_scale_is_ten_km_by_default() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.largest_scale().unwrap().label, "10km");
        let empty = PipelineConfig {
            scales: Vec::new(),
            ..PipelineConfig::default()
        };
        assert!(empty.largest_scale().is_none());
    }
}
