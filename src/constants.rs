/// Store layout and default tuning values shared across the crate

// Hash fields kept under the dataset id
pub const LAST_PAGE_FIELD: &str = "last_page";
pub const SAMPLES_FIELD: &str = "samples";
pub const LAST_UPDATED_FIELD: &str = "summary_last_updated";

// Sorted-set key suffixes: `<dataset_id>/<suffix>`
pub const ACTIVITIES_SUFFIX: &str = "activities";
pub const BOUNDARY_SUFFIX: &str = "boundary";

// RPDE item state carrying the deletion marker
pub const DELETED_STATE: &str = "deleted";

pub const DEFAULT_SAMPLE_CAP: u64 = 500;
pub const ONE_YEAR_SECS: i64 = 365 * 24 * 60 * 60;
pub const DEFAULT_MAX_PAGES_PER_UPDATE: u32 = 1;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_DB_PATH: &str = "data/summary.db";
pub const DEFAULT_CONFIG_PATH: &str = "summary.toml";
