//! Error types shared by every stage of the pipeline.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LandfragError {
    #[error("land-cover code {0} has no coarse class")]
    UnmappedCode(u16),

    #[error("unknown coarse class id {0:?}")]
    UnknownClass(String),

    #[error("raster acquisition failed after {attempts} attempts: {last_error}")]
    RasterAcquisition { attempts: u32, last_error: String },

    #[error("remote query failed: {0}")]
    RemoteQuery(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GeoTIFF decode error: {0}")]
    Decode(#[from] tiff::TiffError),

    #[error("unsupported pixel layout: {0}")]
    UnsupportedPixelLayout(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LandfragError>;
