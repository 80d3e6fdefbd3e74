//! Study sites and CSV ingestion.
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::coords::LatLon;
use crate::error::Result;

/// One input row. Extra CSV columns are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "Longitude")]
    pub lon: f64,
    #[serde(rename = "Latitude")]
    pub lat: f64,
    #[serde(rename = "Study Year")]
    pub year: i32,
}

impl Site {
    pub fn location(&self) -> LatLon {
        LatLon::new(self.lat, self.lon)
    }
}

/// Parse sites from CSV with a header row.
pub fn read_sites<R: Read>(reader: R) -> Result<Vec<Site>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut sites = Vec::new();
    for row in rdr.deserialize() {
        sites.push(row?);
    }
    Ok(sites)
}

pub fn read_sites_file(path: &Path) -> Result<Vec<Site>> {
    read_sites(std::fs::File::open(path)?)
}
