use std::io;

use tiff::decoder::{Decoder, DecodingResult};

use crate::error::{LandfragError, Result};
use crate::taxonomy::CoarseClass;

/// A 2D grid of coarse land-cover classes, row-major, row 0 = north edge.
/// `None` marks no-data (masked or outside the clip).
#[derive(Debug, Clone, PartialEq)]
pub struct PixelGrid {
    pub cells: Vec<Option<CoarseClass>>,
    pub width: usize,
    pub height: usize,
}

impl PixelGrid {
    /// Create a grid filled with `fill`.
    #[cfg(test)]
    pub(crate) fn new(width: usize, height: usize, fill: Option<CoarseClass>) -> Self {
        Self {
            cells: vec![fill; width * height],
            width,
            height,
        }
    }

    /// Build a grid from raw class ids; ids outside 1..=10 become no-data.
    pub fn from_ids(width: usize, height: usize, ids: &[u8]) -> Self {
        debug_assert_eq!(ids.len(), width * height);
        Self {
            cells: ids.iter().map(|&id| CoarseClass::from_id(id)).collect(),
            width,
            height,
        }
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<CoarseClass> {
        self.cells[row * self.width + col]
    }

    #[cfg(test)]
    pub(crate) fn set(&mut self, row: usize, col: usize, val: Option<CoarseClass>) {
        self.cells[row * self.width + col] = val;
    }

    /// Number of cells holding a class.
    pub fn valid_cells(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}

/// Decode an in-memory GeoTIFF into a [`PixelGrid`].
///
/// Only the first sample of each pixel is read (band 1). Sample values that
/// are not a coarse class id, including the exporter's 0 fill for masked
/// pixels, are stored as no-data.
pub fn decode_geotiff(bytes: &[u8]) -> Result<PixelGrid> {
    let mut decoder = Decoder::new(io::Cursor::new(bytes))?;
    let (width, height) = decoder.dimensions()?;
    let (width, height) = (width as usize, height as usize);
    if width == 0 || height == 0 {
        return Err(LandfragError::UnsupportedPixelLayout(format!(
            "empty raster ({width}×{height})"
        )));
    }

    let samples: Vec<i64> = match decoder.read_image()? {
        DecodingResult::U8(v) => v.into_iter().map(i64::from).collect(),
        DecodingResult::U16(v) => v.into_iter().map(i64::from).collect(),
        DecodingResult::U32(v) => v.into_iter().map(i64::from).collect(),
        DecodingResult::U64(v) => v.into_iter().map(|x| i64::try_from(x).unwrap_or(-1)).collect(),
        DecodingResult::I8(v) => v.into_iter().map(i64::from).collect(),
        DecodingResult::I16(v) => v.into_iter().map(i64::from).collect(),
        DecodingResult::I32(v) => v.into_iter().map(i64::from).collect(),
        DecodingResult::I64(v) => v,
        DecodingResult::F32(v) => v.into_iter().map(float_sample).collect(),
        DecodingResult::F64(v) => v.into_iter().map(float_sample).collect(),
        #[allow(unreachable_patterns)]
        _ => {
            return Err(LandfragError::UnsupportedPixelLayout(
                "unsupported sample type".to_string(),
            ))
        }
    };

    let n_pixels = width * height;
    if samples.len() < n_pixels || samples.len() % n_pixels != 0 {
        return Err(LandfragError::UnsupportedPixelLayout(format!(
            "{} samples for {width}×{height} pixels",
            samples.len()
        )));
    }
    let stride = samples.len() / n_pixels;

    let cells = samples
        .iter()
        .step_by(stride)
        .map(|&v| u8::try_from(v).ok().and_then(CoarseClass::from_id))
        .collect();

    Ok(PixelGrid { cells, width, height })
}

/// Float rasters carry class ids as whole numbers; NaN and fractions are no-data.
fn float_sample(v: impl Into<f64>) -> i64 {
    let v: f64 = v.into();
    if v.is_finite() && v.fract() == 0.0 {
        v as i64
    } else {
        -1
    }
}
