//! Harvest and reset metrics

use crate::metrics::summary_metric;

const PAGES_FETCHED: &str = summary_metric!(counter, "harvest", "pages_fetched");
const FETCH_ERRORS: &str = summary_metric!(counter, "harvest", "fetch_errors");
const FETCH_DURATION: &str = summary_metric!(histogram, "harvest", "fetch_duration_seconds");
const ITEMS_SAMPLED: &str = summary_metric!(counter, "harvest", "items_sampled");
const BOUNDARY_MISSES: &str = summary_metric!(counter, "harvest", "boundary_misses");
const RESETS: &str = summary_metric!(counter, "state", "resets");

pub struct SummaryMetrics;

impl SummaryMetrics {
    /// Register help text with the installed recorder
    pub fn describe() {
        ::metrics::describe_counter!(PAGES_FETCHED, "Feed pages fetched successfully");
        ::metrics::describe_counter!(FETCH_ERRORS, "Feed page fetches that failed");
        ::metrics::describe_histogram!(FETCH_DURATION, "Feed page fetch latency in seconds");
        ::metrics::describe_counter!(ITEMS_SAMPLED, "Feed items ranked into summaries");
        ::metrics::describe_counter!(
            BOUNDARY_MISSES,
            "Sampled items whose boundary could not be resolved"
        );
        ::metrics::describe_counter!(RESETS, "Summary reset operations, by kind");
    }

    pub fn record_page_fetched(duration_secs: f64) {
        ::metrics::counter!(PAGES_FETCHED).increment(1);
        ::metrics::histogram!(FETCH_DURATION).record(duration_secs);
    }

    pub fn record_fetch_error() {
        ::metrics::counter!(FETCH_ERRORS).increment(1);
    }

    pub fn record_items_sampled(count: u64) {
        ::metrics::counter!(ITEMS_SAMPLED).increment(count);
    }

    pub fn record_boundary_miss() {
        ::metrics::counter!(BOUNDARY_MISSES).increment(1);
    }

    pub fn record_reset(kind: &'static str) {
        ::metrics::counter!(RESETS, "kind" => kind).increment(1);
    }
}
