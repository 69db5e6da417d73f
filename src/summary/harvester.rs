use crate::app::ports::{FeedPort, GeocoderPort, StorePort};
use crate::constants::{LAST_PAGE_FIELD, SAMPLES_FIELD};
use crate::error::{Result, SummaryError};
use crate::metrics::SummaryMetrics;
use crate::summary::extract::{extract_activities, extract_boundary};
use crate::summary::rank_store::RankStore;
use crate::types::{Item, Page};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Result of harvesting a single page
#[derive(Debug, Clone)]
pub struct HarvestOutcome {
    /// URI the page was fetched from
    pub cursor: String,
    pub page: Page,
    /// Items ranked by this call
    pub sampled: u64,
    /// Persisted sample counter after this call
    pub samples_total: u64,
}

impl HarvestOutcome {
    pub fn next_page(&self) -> Option<&str> {
        self.page.next_page.as_deref()
    }
}

/// Reads the persisted sample counter; absent means zero
pub(crate) async fn read_samples(store: &dyn StorePort, dataset_id: &str) -> Result<u64> {
    match store.hash_get(dataset_id, SAMPLES_FIELD).await? {
        None => Ok(0),
        Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
            SummaryError::Store(format!(
                "Invalid {} value '{}' for {}: {}",
                SAMPLES_FIELD, raw, dataset_id, e
            ))
        }),
    }
}

/// Drives one page of harvesting for a dataset
pub struct Harvester {
    dataset_id: String,
    feed_root: String,
    store: Arc<dyn StorePort>,
    feed: Arc<dyn FeedPort>,
    geocoder: Option<Arc<dyn GeocoderPort>>,
    activities: RankStore,
    boundaries: RankStore,
}

impl Harvester {
    pub fn new(
        dataset_id: &str,
        feed_root: &str,
        store: Arc<dyn StorePort>,
        feed: Arc<dyn FeedPort>,
        geocoder: Option<Arc<dyn GeocoderPort>>,
        activities: RankStore,
        boundaries: RankStore,
    ) -> Self {
        Self {
            dataset_id: dataset_id.to_string(),
            feed_root: feed_root.to_string(),
            store,
            feed,
            geocoder,
            activities,
            boundaries,
        }
    }

    /// Page the next harvest starts from
    pub async fn cursor(&self) -> Result<String> {
        Ok(self
            .store
            .hash_get(&self.dataset_id, LAST_PAGE_FIELD)
            .await?
            .unwrap_or_else(|| self.feed_root.clone()))
    }

    /// Fetches the page at the cursor and ranks its live items until the
    /// persisted sample counter reaches `sample_cap`. The cursor advances to
    /// the page's next link whether or not the cap was hit.
    #[instrument(skip(self), fields(dataset = %self.dataset_id))]
    pub async fn harvest(&self, sample_cap: u64) -> Result<HarvestOutcome> {
        let cursor = self.cursor().await?;

        let started = Instant::now();
        let page = match self.feed.fetch(&cursor).await {
            Ok(page) => {
                SummaryMetrics::record_page_fetched(started.elapsed().as_secs_f64());
                page
            }
            Err(e) => {
                SummaryMetrics::record_fetch_error();
                return Err(e);
            }
        };
        debug!("Fetched {} items from {}", page.items.len(), cursor);

        let mut samples_total = read_samples(self.store.as_ref(), &self.dataset_id).await?;
        let mut sampled = 0u64;
        for item in page.live_items() {
            if samples_total >= sample_cap {
                debug!("Sample cap {} reached", sample_cap);
                break;
            }
            self.sample_item(item).await?;
            let counter = self
                .store
                .hash_incr(&self.dataset_id, SAMPLES_FIELD, 1)
                .await?;
            samples_total = u64::try_from(counter).unwrap_or(0);
            sampled += 1;
        }
        SummaryMetrics::record_items_sampled(sampled);

        if let Some(next) = page.next_page.as_deref() {
            self.store
                .hash_set(&self.dataset_id, LAST_PAGE_FIELD, next)
                .await?;
        }

        info!(
            "Harvested {} of {} items from {} ({} / {} samples)",
            sampled,
            page.items.len(),
            cursor,
            samples_total,
            sample_cap
        );

        Ok(HarvestOutcome {
            cursor,
            page,
            sampled,
            samples_total,
        })
    }

    async fn sample_item(&self, item: &Item) -> Result<()> {
        for name in extract_activities(item) {
            self.activities.increment(&name).await?;
        }

        if let Some(geocoder) = &self.geocoder {
            match extract_boundary(item, geocoder.as_ref()).await {
                Some(boundary) => self.boundaries.increment(&boundary).await?,
                None => SummaryMetrics::record_boundary_miss(),
            }
        }
        Ok(())
    }
}
