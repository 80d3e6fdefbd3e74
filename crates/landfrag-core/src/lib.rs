//! Landscape composition and forest-fragmentation statistics around study
//! sites, computed from a remotely hosted land-cover classification.
pub mod acquire;
pub mod config;
pub mod coords;
pub mod error;
pub mod grid;
pub mod metrics;
pub mod pipeline;
pub mod record;
pub mod site;
pub mod source;
pub mod taxonomy;

pub use acquire::{HttpRasterService, RasterAcquirer, RasterService};
pub use config::{PipelineConfig, SpatialScale};
pub use error::{LandfragError, Result};
pub use pipeline::{RunReport, SiteError, SiteFailure, SitePipeline};
pub use record::{ResultRecord, ResultTable};
pub use site::{read_sites, read_sites_file, Site};
pub use taxonomy::CoarseClass;
