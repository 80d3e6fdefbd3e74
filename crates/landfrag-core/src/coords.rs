/// Geographic point and region types used to address remote raster queries.
/// All coordinate math uses f64 for precision.
use serde::{Deserialize, Serialize};

/// Metres per degree of latitude (mean).
pub const METRES_PER_DEG: f64 = 111_320.0;

/// A point on the sphere in geographic coordinates (WGS84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    /// Latitude in degrees, -90 to +90.
    pub lat: f64,
    /// Longitude in degrees, -180 to +180.
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Axis-aligned lon/lat box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl Bounds {
    #[cfg(test)]
    pub(crate) fn contains(&self, p: LatLon) -> bool {
        p.lon >= self.min_lon && p.lon <= self.max_lon && p.lat >= self.min_lat && p.lat <= self.max_lat
    }
}

/// Zone submitted to the raster service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Region {
    /// Geodesic buffer of `radius_m` metres around `center`.
    Circle { center: LatLon, radius_m: f64 },
    Bounds(Bounds),
}

impl Region {
    pub fn circle(center: LatLon, radius_m: f64) -> Self {
        Region::Circle { center, radius_m }
    }

    /// Bounding box of the region. For circles the longitude half-width is
    /// widened by 1/cos(lat) and clamped near the poles.
    pub fn bounds(&self) -> Bounds {
        match *self {
            Region::Bounds(b) => b,
            Region::Circle { center, radius_m } => {
                let dlat = radius_m / METRES_PER_DEG;
                let cos_lat = center.lat.to_radians().cos().max(1e-6);
                let dlon = (radius_m / (METRES_PER_DEG * cos_lat)).min(180.0);
                Bounds {
                    min_lon: center.lon - dlon,
                    min_lat: (center.lat - dlat).max(-90.0),
                    max_lon: center.lon + dlon,
                    max_lat: (center.lat + dlat).min(90.0),
                }
            }
        }
    }
}
