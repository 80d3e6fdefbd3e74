//! Per-site, per-scale orchestration.
//!
//! [`SitePipeline::process_site`] computes one record per scale for a site.
//! A failure abandons the remaining scales; records already finished are
//! kept. [`SitePipeline::run`] applies that to a batch, keeping records in
//! input order and collecting the failures.
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::acquire::{AcquireSettings, RasterAcquirer, RasterService};
use crate::config::PipelineConfig;
use crate::coords::Region;
use crate::error::{LandfragError, Result};
use crate::metrics::{compute_coverage, compute_metrics};
use crate::record::{ResultRecord, ResultTable};
use crate::site::Site;
use crate::source::select_source;

/// A site abandoned part-way. `completed` holds the records of the scales
/// that finished before the failure, in scale order.
#[derive(Error, Debug)]
#[error("site {site_id}: {error}")]
pub struct SiteError {
    pub site_id: i64,
    #[source]
    pub error: LandfragError,
    pub completed: Vec<ResultRecord>,
}

/// Serializable summary of a failed site.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteFailure {
    pub site_id: i64,
    pub message: String,
    /// Scales whose records made it into the table.
    pub completed_scales: usize,
}

impl From<&SiteError> for SiteFailure {
    fn from(err: &SiteError) -> Self {
        Self {
            site_id: err.site_id,
            message: err.error.to_string(),
            completed_scales: err.completed.len(),
        }
    }
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub table: ResultTable,
    pub failures: Vec<SiteFailure>,
}

pub struct SitePipeline<S> {
    acquirer: RasterAcquirer<S>,
    config: PipelineConfig,
}

impl<S: RasterService> SitePipeline<S> {
    pub fn new(service: S, config: PipelineConfig) -> Self {
        let acquirer = RasterAcquirer::new(service, AcquireSettings::from(&config));
        Self { acquirer, config }
    }

    /// All records for `site`, one per configured scale, in scale order.
    pub fn process_site(&self, site: &Site) -> std::result::Result<Vec<ResultRecord>, SiteError> {
        let mut records = Vec::with_capacity(self.config.scales.len());
        match self.collect_scales(site, &mut records) {
            Ok(()) => Ok(records),
            Err(error) => Err(SiteError {
                site_id: site.id,
                error,
                completed: records,
            }),
        }
    }

    /// Push one complete record per scale onto `records`, stopping at the
    /// first error.
    fn collect_scales(&self, site: &Site, records: &mut Vec<ResultRecord>) -> Result<()> {
        let cfg = &self.config;
        let source = select_source(site.year);
        let center = site.location();

        let Some(largest) = cfg.largest_scale() else {
            return Ok(());
        };
        let raster = self
            .acquirer
            .acquire_classified_raster(&source, &Region::circle(center, largest.radius_m))?;

        for scale in &cfg.scales {
            let region = Region::circle(center, scale.radius_m);
            let histogram = self.acquirer.histogram_for(&raster, &region)?;
            let grid = self.acquirer.pixel_grid_for(&raster, &region)?;

            let fragmentation = compute_metrics(&grid, cfg.resolution_m, cfg.target_class);
            let coverage = compute_coverage(&histogram);
            records.push(ResultRecord::new(
                site.id,
                &scale.label,
                &source,
                fragmentation,
                coverage,
            ));
        }
        Ok(())
    }

    /// Process every site, calling `on_site` after each one finishes. A
    /// failing site is logged and reported; its finished scales are kept.
    pub fn run<F>(&self, sites: &[Site], on_site: F) -> RunReport
    where
        F: Fn(&Site) + Sync,
        S: Sync,
    {
        let outcomes = self.process_all(sites, &on_site);

        let mut report = RunReport::default();
        for outcome in outcomes {
            match outcome {
                Ok(records) => report.table.extend(records),
                Err(err) => {
                    warn!(
                        site_id = err.site_id,
                        completed = err.completed.len(),
                        error = %err.error,
                        "site failed, skipping remaining scales"
                    );
                    report.failures.push(SiteFailure::from(&err));
                    report.table.extend(err.completed);
                }
            }
        }
        info!(
            sites = sites.len(),
            records = report.table.len(),
            failed = report.failures.len(),
            "run complete"
        );
        report
    }

    #[cfg(not(feature = "threading"))]
    fn process_all<F>(
        &self,
        sites: &[Site],
        on_site: &F,
    ) -> Vec<std::result::Result<Vec<ResultRecord>, SiteError>>
    where
        F: Fn(&Site) + Sync,
    {
        sites
            .iter()
            .map(|site| {
                let outcome = self.process_site(site);
                on_site(site);
                outcome
            })
            .collect()
    }

    /// Sites run on the rayon pool; `collect` keeps input order.
    #[cfg(feature = "threading")]
    fn process_all<F>(
        &self,
        sites: &[Site],
        on_site: &F,
    ) -> Vec<std::result::Result<Vec<ResultRecord>, SiteError>>
    where
        F: Fn(&Site) + Sync,
        S: Sync,
    {
        use rayon::prelude::*;

        sites
            .par_iter()
            .map(|site| {
                let outcome = self.process_site(site);
                on_site(site);
                outcome
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::acquire::tests::FakeService;
    use crate::coords::LatLon;
    use crate::taxonomy::{CoarseClass, N_CLASSES};

    /// 6×6 landscape: forest block in cropland with a water column.
    fn landscape_ids() -> Vec<u8> {
        let mut ids = vec![1u8; 36];
        for r in 1..4 {
            for c in 1..4 {
                ids[r * 6 + c] = 2;
            }
        }
        for r in 0..6 {
            ids[r * 6 + 5] = 9;
        }
        ids
    }

    fn pipeline(service: FakeService) -> SitePipeline<FakeService> {
        SitePipeline::new(service, PipelineConfig::default())
    }

    fn site(id: i64, lon: f64, lat: f64, year: i32) -> Site {
        Site { id, lon, lat, year }
    }

    #[test]
    fn one_record_per_scale_with_full_schema() {
        let pipeline = pipeline(FakeService::new(&landscape_ids(), 6));
        let records = pipeline.process_site(&site(1, -1.0, 52.0, 2005)).unwrap();

        let labels: Vec<_> = records.iter().map(|r| r.scale.as_str()).collect();
        assert_eq!(labels, ["1km", "2.5km", "5km", "10km"]);
        for r in &records {
            assert_eq!(r.site_id, 1);
            assert_eq!(r.source_label, "Annual 2005");
            assert_eq!(r.source_band, "b6");
            assert_eq!(r.coverage.iter().count(), N_CLASSES);
            assert!(r.coverage.iter().all(|(_, pct)| (0.0..=100.0).contains(&pct)));
            assert!((r.coverage.sum() - 100.0).abs() < 0.05);
            // 9 forest cells of 36 → 25 %.
            assert_eq!(r.coverage.get(CoarseClass::Forest), 25.0);
            assert_eq!(r.fragmentation.mean_patch_area_ha, 0.81);
            assert_eq!(r.fragmentation.largest_patch_index, 25.0);
            assert!(r.fragmentation.contagion > 0.0);
        }
    }

    #[test]
    fn raster_is_acquired_once_for_largest_scale() {
        let pipeline = pipeline(FakeService::new(&landscape_ids(), 6));
        pipeline.process_site(&site(1, 0.0, 0.0, 1983)).unwrap();

        let sent = pipeline.acquirer.service().classified.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].band, "b1");
        match sent[0].region {
            Region::Circle { radius_m, .. } => assert_eq!(radius_m, 10_000.0),
            other => panic!("unexpected region {other:?}"),
        }
    }

    #[test]
    fn empty_histogram_yields_zero_cover() {
        let mut service = FakeService::new(&landscape_ids(), 6);
        service.histogram = None;
        let pipeline = pipeline(service);
        let records = pipeline.process_site(&site(3, 0.0, 0.0, 2010)).unwrap();
        assert_eq!(records.len(), 4);
        for r in &records {
            assert!(r.coverage.iter().all(|(_, pct)| pct == 0.0));
        }
    }

    #[test]
    fn forest_free_landscape_defaults_forest_metrics() {
        let ids: Vec<u8> = (0..36).map(|i| if i % 6 < 3 { 1 } else { 9 }).collect();
        let pipeline = pipeline(FakeService::new(&ids, 6));
        let records = pipeline.process_site(&site(4, 0.0, 0.0, 2010)).unwrap();
        for r in &records {
            let f = r.fragmentation;
            assert_eq!(
                (f.patch_density, f.edge_density, f.mean_patch_area_ha, f.largest_patch_index),
                (0.0, 0.0, 0.0, 0.0)
            );
            assert!(f.contagion > 0.0);
            assert_eq!(r.coverage.get(CoarseClass::Forest), 0.0);
        }
    }

    #[test]
    fn failing_site_is_skipped_and_batch_continues() {
        let mut service = FakeService::new(&landscape_ids(), 6);
        service.broken_centers = vec![LatLon::new(10.0, 20.0)];
        let pipeline = pipeline(service);
        let sites = [site(1, 20.0, 10.0, 2001), site(2, 30.0, 5.0, 2001)];

        let seen = AtomicUsize::new(0);
        let report = pipeline.run(&sites, |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(seen.load(Ordering::SeqCst), 2);
        assert_eq!(report.table.len(), 4);
        assert!(report.table.records().iter().all(|r| r.site_id == 2));
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].site_id, 1);
        assert!(report.failures[0].message.contains("3 attempts"));
        assert_eq!(report.failures[0].completed_scales, 0);
        // Site 1 burnt three attempts on its first scale; site 2 one per scale.
        assert_eq!(pipeline.acquirer.service().fetch_calls(), 3 + 4);
    }

    #[test]
    fn failure_on_last_scale_keeps_earlier_scales() {
        let mut service = FakeService::new(&landscape_ids(), 6);
        service.max_export_radius_m = Some(7_500.0);
        let pipeline = pipeline(service);
        let sites = [site(1, -1.0, 52.0, 2005)];

        let err = pipeline.process_site(&sites[0]).unwrap_err();
        assert_eq!(err.site_id, 1);
        assert!(matches!(err.error, LandfragError::RasterAcquisition { attempts: 3, .. }));
        let labels: Vec<_> = err.completed.iter().map(|r| r.scale.as_str()).collect();
        assert_eq!(labels, ["1km", "2.5km", "5km"]);

        let report = pipeline.run(&sites, |_| {});
        assert_eq!(report.table.len(), 3);
        assert!(report.table.records().iter().all(|r| r.scale != "10km"));
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].completed_scales, 3);
    }

    #[test]
    fn run_keeps_input_order() {
        let pipeline = pipeline(FakeService::new(&landscape_ids(), 6));
        let sites: Vec<Site> = (1..=5).map(|id| site(id, id as f64, 0.0, 2000)).collect();
        let report = pipeline.run(&sites, |_| {});
        let ids: Vec<i64> = report.table.records().iter().map(|r| r.site_id).collect();
        let expected: Vec<i64> = (1..=5).flat_map(|id| [id; 4]).collect();
        assert_eq!(ids, expected);
        assert!(report.failures.is_empty());
    }
}
