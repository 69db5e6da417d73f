use crate::clock::Clock;
use crate::constants::ONE_YEAR_SECS;
use crate::types::Page;
use std::sync::Arc;
use tracing::debug;

/// Decides whether a page still carries fresh data
#[derive(Clone)]
pub struct RecencyGate {
    clock: Arc<dyn Clock>,
    window_secs: i64,
}

impl RecencyGate {
    pub fn new(clock: Arc<dyn Clock>, window_secs: i64) -> Self {
        Self { clock, window_secs }
    }

    pub fn with_default_window(clock: Arc<dyn Clock>) -> Self {
        Self::new(clock, ONE_YEAR_SECS)
    }

    /// A page is recent when it holds at least one live item and its
    /// modification time lies within the window of now.
    pub fn is_recent(&self, page: &Page) -> bool {
        if page.live_items().next().is_none() {
            debug!("Page has no live items; treating as stale");
            return false;
        }
        let Some(modified) = page.modified else {
            debug!("Page has no modified timestamp; treating as stale");
            return false;
        };

        match self.clock.now().timestamp().checked_sub(modified) {
            Some(elapsed) => elapsed <= self.window_secs,
            None => {
                debug!("Page modified timestamp {} out of range; treating as stale", modified);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::types::Item;
    use serde_json::json;

    const PAGE_MODIFIED: i64 = 1_506_335_200;

    fn page(items: Vec<Item>, modified: Option<i64>) -> Page {
        Page {
            items,
            next_page: None,
            modified,
        }
    }

    fn gate_at(secs: i64) -> RecencyGate {
        RecencyGate::with_default_window(Arc::new(FixedClock::at_timestamp(secs)))
    }

    #[test]
    fn test_recent_page_within_window() {
        let live = page(vec![Item::with_data(json!({"activity": "Yoga"}))], Some(PAGE_MODIFIED));
        assert!(gate_at(1_506_335_263).is_recent(&live));
    }

    #[test]
    fn test_stale_page_far_in_future() {
        let live = page(vec![Item::with_data(json!({"activity": "Yoga"}))], Some(PAGE_MODIFIED));
        assert!(!gate_at(1_577_836_800).is_recent(&live));
    }

    #[test]
    fn test_deleted_only_page_is_never_recent() {
        let deletions = page(vec![Item::deleted(), Item::deleted()], Some(PAGE_MODIFIED));
        assert!(!gate_at(1_506_335_263).is_recent(&deletions));
        assert!(!gate_at(1_577_836_800).is_recent(&deletions));
        assert!(!gate_at(PAGE_MODIFIED).is_recent(&page(Vec::new(), Some(PAGE_MODIFIED))));
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let live = page(vec![Item::with_data(json!({}))], Some(PAGE_MODIFIED));
        assert!(gate_at(PAGE_MODIFIED + ONE_YEAR_SECS).is_recent(&live));
        assert!(!gate_at(PAGE_MODIFIED + ONE_YEAR_SECS + 1).is_recent(&live));
    }

    #[test]
    fn test_out_of_range_timestamp_is_stale() {
        let live = page(vec![Item::with_data(json!({"activity": "Yoga"}))], Some(i64::MIN));
        assert!(!gate_at(1_506_335_263).is_recent(&live));

        let far_ahead = page(vec![Item::with_data(json!({}))], Some(i64::MAX));
        assert!(gate_at(1_506_335_263).is_recent(&far_ahead));
    }

    #[test]
    fn test_custom_window_and_missing_timestamp() {
        let clock = Arc::new(FixedClock::at_timestamp(PAGE_MODIFIED + 120));
        let gate = RecencyGate::new(clock, 60);
        let live = page(vec![Item::with_data(json!({}))], Some(PAGE_MODIFIED));
        assert!(!gate.is_recent(&live));

        let undated = page(vec![Item::with_data(json!({}))], None);
        assert!(!gate_at(PAGE_MODIFIED).is_recent(&undated));
    }
}
