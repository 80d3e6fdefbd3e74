//! Raster acquisition from a remote land-cover service.
//!
//! [`RasterService`] is the consumed capability: build a classified, clipped
//! raster server-side, reduce it to a histogram, and export it as GeoTIFF.
//! [`RasterAcquirer`] layers the fixed query parameters, the best-effort
//! histogram semantics and the bounded download retry on top.
pub mod http;
pub mod retry;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::PipelineConfig;
use crate::coords::Region;
use crate::error::{LandfragError, Result};
use crate::grid::{decode_geotiff, PixelGrid};
use crate::metrics::ClassHistogram;
use crate::source::{SourceCatalog, SourceDescriptor};
use crate::taxonomy::remap_table;

pub use http::HttpRasterService;
pub use retry::{retry, Exhausted, RetryPolicy};

/// Band name of the remapped image.
pub const CLASS_BAND: &str = "classification";

/// Opaque server-side reference to a classified raster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RasterHandle(pub String);

/// Select `collection`, keep images touching `region`, mosaic, pick `band`,
/// remap `remap_from[i] → remap_to[i]` into `output_band`, clip to `region`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifyRequest {
    pub collection: String,
    pub band: String,
    pub remap_from: Vec<u16>,
    pub remap_to: Vec<u8>,
    pub output_band: &'static str,
    pub region: Region,
}

/// Frequency-histogram reduction of `band` over `region`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramRequest {
    pub band: &'static str,
    pub region: Region,
    pub scale_m: f64,
    pub max_pixels: f64,
    pub best_effort: bool,
}

/// Single-file GeoTIFF export of `region`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadRequest {
    pub region: Region,
    pub scale_m: f64,
    pub max_pixels: f64,
    pub format: &'static str,
    pub file_per_band: bool,
}

pub trait RasterService {
    fn classify(&self, request: &ClassifyRequest) -> Result<RasterHandle>;

    /// `None` when the reduction produced no value for the band.
    fn histogram(
        &self,
        raster: &RasterHandle,
        request: &HistogramRequest,
    ) -> Result<Option<BTreeMap<String, f64>>>;

    fn download_url(&self, raster: &RasterHandle, request: &DownloadRequest) -> Result<String>;

    /// Plain GET of an export URL.
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Query parameters shared by every acquisition in a run.
#[derive(Debug, Clone, PartialEq)]
pub struct AcquireSettings {
    pub catalog: SourceCatalog,
    pub resolution_m: f64,
    pub max_pixels: f64,
    pub best_effort: bool,
    pub retry: RetryPolicy,
}

impl From<&PipelineConfig> for AcquireSettings {
    fn from(cfg: &PipelineConfig) -> Self {
        Self {
            catalog: cfg.catalog.clone(),
            resolution_m: cfg.resolution_m,
            max_pixels: cfg.max_pixels,
            best_effort: cfg.best_effort,
            retry: cfg.retry,
        }
    }
}

pub struct RasterAcquirer<S> {
    service: S,
    settings: AcquireSettings,
}

impl<S: RasterService> RasterAcquirer<S> {
    pub fn new(service: S, settings: AcquireSettings) -> Self {
        Self { service, settings }
    }

    #[cfg(test)]
    pub(crate) fn service(&self) -> &S {
        &self.service
    }

    /// Classified raster for `source`, clipped to `region`. No pixels move.
    pub fn acquire_classified_raster(
        &self,
        source: &SourceDescriptor,
        region: &Region,
    ) -> Result<RasterHandle> {
        let (remap_from, remap_to) = remap_table();
        let request = ClassifyRequest {
            collection: self.settings.catalog.asset(source.kind).to_string(),
            band: source.band.clone(),
            remap_from,
            remap_to,
            output_band: CLASS_BAND,
            region: *region,
        };
        self.service.classify(&request)
    }

    /// Per-class pixel counts over `region`. A missing result is an empty
    /// histogram.
    pub fn histogram_for(&self, raster: &RasterHandle, region: &Region) -> Result<ClassHistogram> {
        let request = HistogramRequest {
            band: CLASS_BAND,
            region: *region,
            scale_m: self.settings.resolution_m,
            max_pixels: self.settings.max_pixels,
            best_effort: self.settings.best_effort,
        };
        match self.service.histogram(raster, &request)? {
            Some(raw) => ClassHistogram::from_raw(&raw),
            None => Ok(ClassHistogram::new()),
        }
    }

    /// Decoded pixel grid over the bounding box of `region`. The download
    /// and decode are retried per the retry policy.
    pub fn pixel_grid_for(&self, raster: &RasterHandle, region: &Region) -> Result<PixelGrid> {
        let request = DownloadRequest {
            region: Region::Bounds(region.bounds()),
            scale_m: self.settings.resolution_m,
            max_pixels: self.settings.max_pixels,
            format: "GeoTIFF",
            file_per_band: false,
        };
        let url = self.service.download_url(raster, &request)?;

        retry(&self.settings.retry, |attempt| {
            debug!(attempt, %url, "downloading raster");
            let bytes = self.service.fetch(&url)?;
            decode_geotiff(&bytes)
        })
        .map_err(|e| LandfragError::RasterAcquisition {
            attempts: e.attempts,
            last_error: e.last.to_string(),
        })
    }
}
