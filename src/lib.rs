pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod summary;
pub mod types;

// Layered boundaries: ports in `app`, adapters in `infra`
pub mod app;
pub mod infra;

pub use summary::{DatasetSummary, SummarySettings};
