pub mod composition;
pub mod fragmentation;
pub mod landscape;

pub use composition::{compute_coverage, ClassHistogram, Coverage};
pub use fragmentation::{compute_metrics, FragmentationMetrics};
pub use landscape::{ClassMetrics, Landscape};
