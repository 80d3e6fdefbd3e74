//! Percent-cover composition from a class histogram.
use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{LandfragError, Result};
use crate::taxonomy::{CoarseClass, N_CLASSES};

/// Pixel counts per coarse class over one region. Best-effort reductions
/// weight edge pixels fractionally, so counts are f64.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassHistogram(BTreeMap<CoarseClass, f64>);

impl ClassHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the service's `{"<class id>": count}` mapping. Keys may be
    /// written as integers or whole floats ("2", "2.0").
    pub fn from_raw(raw: &BTreeMap<String, f64>) -> Result<Self> {
        let mut hist = Self::new();
        for (key, &count) in raw {
            let class = parse_class_key(key)
                .ok_or_else(|| LandfragError::UnknownClass(key.clone()))?;
            hist.add(class, count);
        }
        Ok(hist)
    }

    pub fn add(&mut self, class: CoarseClass, count: f64) {
        *self.0.entry(class).or_insert(0.0) += count;
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CoarseClass, f64)> + '_ {
        self.0.iter().map(|(&c, &n)| (c, n))
    }
}

impl FromIterator<(CoarseClass, f64)> for ClassHistogram {
    fn from_iter<I: IntoIterator<Item = (CoarseClass, f64)>>(iter: I) -> Self {
        let mut hist = Self::new();
        for (class, count) in iter {
            hist.add(class, count);
        }
        hist
    }
}

fn parse_class_key(key: &str) -> Option<CoarseClass> {
    let key = key.trim();
    let id = match key.parse::<u8>() {
        Ok(id) => id,
        Err(_) => {
            let v: f64 = key.parse().ok()?;
            if v.fract() != 0.0 || !(0.0..=255.0).contains(&v) {
                return None;
            }
            v as u8
        }
    };
    CoarseClass::from_id(id)
}

/// Percent cover for every coarse class, indexed by [`CoarseClass::index`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Coverage(pub [f64; N_CLASSES]);

impl Coverage {
    pub fn get(&self, class: CoarseClass) -> f64 {
        self.0[class.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (CoarseClass, f64)> + '_ {
        CoarseClass::ALL.iter().map(|&c| (c, self.0[c.index()]))
    }

    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }

    pub fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Coverage(self.0.map(f))
    }
}

/// Percent cover per class: `100 × count / total`. Classes absent from the
/// histogram are 0.0. An empty histogram, or one whose counts sum to zero or
/// less, yields all zeros.
pub fn compute_coverage(hist: &ClassHistogram) -> Coverage {
    let mut cover = Coverage::default();
    let total = hist.total();
    if hist.is_empty() || total.is_nan() || total <= 0.0 {
        return cover;
    }
    for (class, count) in hist.iter() {
        cover.0[class.index()] = 100.0 * count / total;
    }
    cover
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn coverage_sums_to_hundred() {
        let hist: ClassHistogram = [
            (CoarseClass::Forest, 300.0),
            (CoarseClass::Cropland, 100.0),
            (CoarseClass::Water, 100.0),
        ]
        .into_iter()
        .collect();
        let cover = compute_coverage(&hist);
        assert_relative_eq!(cover.get(CoarseClass::Forest), 60.0);
        assert_relative_eq!(cover.get(CoarseClass::Cropland), 20.0);
        assert_relative_eq!(cover.get(CoarseClass::Water), 20.0);
        assert_eq!(cover.get(CoarseClass::Barren), 0.0);
        assert_relative_eq!(cover.sum(), 100.0, epsilon = 1e-9);
        assert_eq!(cover.iter().count(), N_CLASSES);
    }

    #[test]
    fn empty_histogram_gives_zero_cover() {
        let cover = compute_coverage(&ClassHistogram::new());
        assert!(cover.iter().all(|(_, pct)| pct == 0.0));
    }

    #[test]
    fn zero_total_histogram_is_treated_as_empty() {
        let hist: ClassHistogram = [(CoarseClass::Forest, 0.0)].into_iter().collect();
        let cover = compute_coverage(&hist);
        assert!(cover.iter().all(|(_, pct)| pct == 0.0));
    }

    #[test]
    fn raw_keys_parse_as_class_ids() {
        let raw: BTreeMap<String, f64> = [
            ("2".to_string(), 10.5),
            ("9.0".to_string(), 2.0),
            (" 1 ".to_string(), 1.0),
        ]
        .into_iter()
        .collect();
        let hist = ClassHistogram::from_raw(&raw).unwrap();
        let counts: Vec<_> = hist.iter().collect();
        assert_eq!(
            counts,
            vec![
                (CoarseClass::Cropland, 1.0),
                (CoarseClass::Forest, 10.5),
                (CoarseClass::Water, 2.0)
            ]
        );
    }

    #[test]
    fn unknown_histogram_key_is_an_error() {
        let raw: BTreeMap<String, f64> = [("42".to_string(), 1.0)].into_iter().collect();
        let err = ClassHistogram::from_raw(&raw).unwrap_err();
        assert!(matches!(err, LandfragError::UnknownClass(ref k) if k == "42"));

        let raw: BTreeMap<String, f64> = [("forest".to_string(), 1.0)].into_iter().collect();
        assert!(ClassHistogram::from_raw(&raw).is_err());
    }
}
