/// Site statistics tool: reads study sites from CSV, computes land-cover
/// composition and forest fragmentation at every configured buffer scale,
/// and writes one CSV row per (site, scale).
///
/// Raster work happens on the remote service named by `--endpoint` (or the
/// config file); only the per-scale GeoTIFF exports are decoded locally.
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use landfrag_core::config::PipelineConfig;
use landfrag_core::{read_sites_file, HttpRasterService, Site, SiteFailure, SitePipeline};

#[derive(Parser, Debug)]
#[command(
    name = "site_stats",
    about = "Landscape composition and forest fragmentation around study sites"
)]
struct Args {
    /// Site table with ID, Longitude, Latitude and Study Year columns
    #[arg(short, long, default_value = "data/sites.csv")]
    input: PathBuf,

    /// Output CSV path
    #[arg(short, long, default_value = "Landscape_Statistics.csv")]
    output: PathBuf,

    /// Pipeline config JSON; defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Raster service base URL (overrides the config)
    #[arg(long)]
    endpoint: Option<String>,

    /// Process only this site ID
    #[arg(long)]
    site: Option<i64>,

    /// Write failed sites as JSON to this path
    #[arg(long)]
    failures: Option<PathBuf>,
}

#[derive(Serialize)]
struct FailureFile<'a> {
    attempted: usize,
    failed: &'a [SiteFailure],
}

fn load_config(args: &Args) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(endpoint) = &args.endpoint {
        config.service.endpoint = endpoint.clone();
    }
    Ok(config)
}

fn select_sites(all: Vec<Site>, filter: Option<i64>) -> Result<Vec<Site>> {
    let Some(id) = filter else {
        return Ok(all);
    };
    let sites: Vec<Site> = all.into_iter().filter(|s| s.id == id).collect();
    if sites.is_empty() {
        bail!("site {id} not found in input");
    }
    Ok(sites)
}

fn progress_bar(len: usize) -> ProgressBar {
    let bar = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar().template("  {bar:40.cyan/blue} {pos}/{len} sites {msg}") {
        bar.set_style(style);
    }
    bar
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    let sites = read_sites_file(&args.input)
        .with_context(|| format!("Cannot read sites from {}", args.input.display()))?;
    let sites = select_sites(sites, args.site)?;

    let service = HttpRasterService::new(&config.service).context("Failed to build HTTP client")?;
    info!(
        sites = sites.len(),
        scales = config.scales.len(),
        endpoint = service.endpoint(),
        "starting run"
    );
    let pipeline = SitePipeline::new(service, config);

    let bar = progress_bar(sites.len());
    let report = pipeline.run(&sites, |site| {
        bar.set_message(format!("(last: {})", site.id));
        bar.inc(1);
    });
    bar.finish_and_clear();

    if let Some(dir) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("Cannot create {}", dir.display()))?;
    }
    report
        .table
        .write_csv_file(&args.output)
        .with_context(|| format!("Cannot write {}", args.output.display()))?;
    info!(
        rows = report.table.len(),
        path = %args.output.display(),
        "wrote results"
    );

    if !report.failures.is_empty() {
        warn!(
            failed = report.failures.len(),
            "some sites failed; scales after each failure are absent from the output"
        );
    }
    if let Some(path) = &args.failures {
        let file = FailureFile {
            attempted: sites.len(),
            failed: &report.failures,
        };
        let text = serde_json::to_string_pretty(&file)?;
        fs::write(path, text).with_context(|| format!("Cannot write {}", path.display()))?;
    }

    Ok(())
}
