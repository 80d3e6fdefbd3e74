//! Output rows and the result table.
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::metrics::{Coverage, FragmentationMetrics};
use crate::source::SourceDescriptor;
use crate::taxonomy::all_class_names;

/// Fixed leading columns, before one `"{class} %"` column per coarse class.
pub const LEADING_COLUMNS: [&str; 9] = [
    "ID",
    "Stats Buffer",
    "GLC Image ID",
    "GLC Image Band",
    "Forest Patch Density",
    "Forest Edge Density",
    "Forest Mean Patch Area (ha)",
    "Forest Largest Patch Index",
    "Contagion",
];

/// Round to two decimals from the exact binary value, ties to even
/// (0.125 → 0.12, 0.375 → 0.38). Non-finite values become 0.0.
pub fn round2(v: f64) -> f64 {
    if !v.is_finite() {
        return 0.0;
    }
    format!("{v:.2}").parse().unwrap_or(0.0)
}

/// One (site, scale) row. Numeric fields are rounded on construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRecord {
    pub site_id: i64,
    pub scale: String,
    pub source_label: String,
    pub source_band: String,
    pub fragmentation: FragmentationMetrics,
    pub coverage: Coverage,
}

impl ResultRecord {
    pub fn new(
        site_id: i64,
        scale: &str,
        source: &SourceDescriptor,
        fragmentation: FragmentationMetrics,
        coverage: Coverage,
    ) -> Self {
        Self {
            site_id,
            scale: scale.to_string(),
            source_label: source.label.clone(),
            source_band: source.band.clone(),
            fragmentation: fragmentation.map(round2),
            coverage: coverage.map(round2),
        }
    }

    /// Column names in output order.
    pub fn header() -> Vec<String> {
        LEADING_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(all_class_names().iter().map(|name| format!("{name} %")))
            .collect()
    }

    /// Field values in [`ResultRecord::header`] order.
    pub fn to_row(&self) -> Vec<String> {
        let f = &self.fragmentation;
        let mut row = vec![
            self.site_id.to_string(),
            self.scale.clone(),
            self.source_label.clone(),
            self.source_band.clone(),
            format_value(f.patch_density),
            format_value(f.edge_density),
            format_value(f.mean_patch_area_ha),
            format_value(f.largest_patch_index),
            format_value(f.contagion),
        ];
        row.extend(self.coverage.iter().map(|(_, pct)| format_value(pct)));
        row
    }
}

/// Shortest decimal form, always with a fractional part ("0.0", "12.5").
fn format_value(v: f64) -> String {
    format!("{v:?}")
}

/// Ordered collection of records; the run's only artifact.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    records: Vec<ResultRecord>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = ResultRecord>) {
        self.records.extend(records);
    }

    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(ResultRecord::header())?;
        for record in &self.records {
            wtr.write_record(record.to_row())?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn write_csv_file(&self, path: &Path) -> Result<()> {
        self.write_csv(std::fs::File::create(path)?)
    }
}
