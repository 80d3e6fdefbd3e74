//! Temporal source selection: which GLC_FCS30D collection and band best
//! represent a study year.
//!
//! The annual collection starts at 2000 (band b1). Years 1997–1999 borrow the
//! 2000 snapshot. Anything earlier falls back to the five-year maps
//! (1985, 1990, 1995).
use serde::{Deserialize, Serialize};

/// First year covered by the annual collection.
pub const FIRST_ANNUAL_YEAR: i32 = 2000;
/// Earliest study year still served by the annual collection (as 2000).
pub const ANNUAL_FALLBACK_FROM: i32 = 1997;
/// Five-year snapshot years, in band order (b1, b2, b3).
pub const FIVE_YEAR_SNAPSHOTS: [i32; 3] = [1985, 1990, 1995];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectionKind {
    Annual,
    FiveYear,
}

/// Asset ids of the two collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceCatalog {
    pub annual: String,
    pub five_year: String,
}

impl Default for SourceCatalog {
    fn default() -> Self {
        Self {
            annual: "projects/sat-io/open-datasets/GLC-FCS30D/annual".to_string(),
            five_year: "projects/sat-io/open-datasets/GLC-FCS30D/five-years-map".to_string(),
        }
    }
}

impl SourceCatalog {
    pub fn asset(&self, kind: CollectionKind) -> &str {
        match kind {
            CollectionKind::Annual => &self.annual,
            CollectionKind::FiveYear => &self.five_year,
        }
    }
}

/// The land-cover snapshot chosen for one site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub kind: CollectionKind,
    /// Band name, e.g. "b6".
    pub band: String,
    /// Human-readable snapshot label, e.g. "Annual 2005".
    pub label: String,
}

/// Pick the snapshot for `year`.
pub fn select_source(year: i32) -> SourceDescriptor {
    if year >= FIRST_ANNUAL_YEAR {
        return SourceDescriptor {
            kind: CollectionKind::Annual,
            band: format!("b{}", year - (FIRST_ANNUAL_YEAR - 1)),
            label: format!("Annual {year}"),
        };
    }
    if year >= ANNUAL_FALLBACK_FROM {
        return SourceDescriptor {
            kind: CollectionKind::Annual,
            band: "b1".to_string(),
            label: format!("Annual {FIRST_ANNUAL_YEAR}"),
        };
    }

    let (band_idx, closest) = closest_five_year(f64::from(year));
    SourceDescriptor {
        kind: CollectionKind::FiveYear,
        band: format!("b{}", band_idx + 1),
        label: format!("Five-Year {closest}"),
    }
}

/// Index and year of the nearest five-year snapshot. Equidistant years
/// resolve to the earlier snapshot.
fn closest_five_year(year: f64) -> (usize, i32) {
    let mut best = (0, FIVE_YEAR_SNAPSHOTS[0]);
    let mut best_dist = (year - f64::from(best.1)).abs();
    for (idx, &snap) in FIVE_YEAR_SNAPSHOTS.iter().enumerate().skip(1) {
        let dist = (year - f64::from(snap)).abs();
        if dist < best_dist {
            best = (idx, snap);
            best_dist = dist;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annual_years_use_offset_band() {
        for year in 2000..=2022 {
            let src = select_source(year);
            assert_eq!(src.kind, CollectionKind::Annual);
            assert_eq!(src.band, format!("b{}", year - 1999));
            assert!(src.label.contains(&year.to_string()));
        }
        let src = select_source(2005);
        assert_eq!(src.band, "b6");
        assert_eq!(src.label, "Annual 2005");
    }

    #[test]
    fn late_nineties_borrow_year_2000() {
        for year in 1997..=1999 {
            let src = select_source(year);
            assert_eq!(src.kind, CollectionKind::Annual);
            assert_eq!(src.band, "b1");
            assert_eq!(src.label, "Annual 2000");
        }
    }

    #[test]
    fn early_years_pick_closest_five_year_map() {
        let src = select_source(1983);
        assert_eq!(src.kind, CollectionKind::FiveYear);
        assert_eq!(src.band, "b1");
        assert_eq!(src.label, "Five-Year 1985");

        let src = select_source(1992);
        assert_eq!(src.band, "b2");
        assert_eq!(src.label, "Five-Year 1990");

        let src = select_source(1996);
        assert_eq!(src.band, "b3");
        assert_eq!(src.label, "Five-Year 1995");
    }

    #[test]
    fn midpoint_neighbours_split_at_half_year() {
        // 1987 is 2 from 1985 and 3 from 1990; 1988 is the reverse.
        assert_eq!(select_source(1987).label, "Five-Year 1985");
        assert_eq!(select_source(1988).label, "Five-Year 1990");
        assert_eq!(select_source(1992).label, "Five-Year 1990");
        assert_eq!(select_source(1993).label, "Five-Year 1995");
    }

    #[test]
    fn equidistant_snapshots_resolve_to_earlier() {
        assert_eq!(closest_five_year(1987.5), (0, 1985));
        assert_eq!(closest_five_year(1992.5), (1, 1990));
        assert_eq!(closest_five_year(1985.0), (0, 1985));
        assert_eq!(closest_five_year(1000.0), (0, 1985));
    }

    #[test]
    fn catalog_resolves_assets() {
        let catalog = SourceCatalog::default();
        assert!(catalog.asset(CollectionKind::Annual).ends_with("/annual"));
        assert!(catalog.asset(CollectionKind::FiveYear).ends_with("/five-years-map"));
    }
}
