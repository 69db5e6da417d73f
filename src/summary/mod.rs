//! Per-dataset harvesting summary.
//!
//! [`DatasetSummary`] owns the store keys of one dataset and composes the
//! extraction, ranking, recency and harvesting pieces. Harvests and resets of
//! the same dataset are serialized through [`locks::dataset_lock`].

pub mod extract;
pub mod harvester;
pub mod locks;
pub mod normalize;
pub mod rank_store;
pub mod recency;

use crate::app::ports::{FeedPort, GeocoderPort, RegistryPort, StorePort};
use crate::clock::Clock;
use crate::constants::{
    DEFAULT_MAX_PAGES_PER_UPDATE, DEFAULT_SAMPLE_CAP, LAST_PAGE_FIELD, LAST_UPDATED_FIELD,
    ONE_YEAR_SECS, SAMPLES_FIELD,
};
use crate::error::{Result, SummaryError};
use crate::metrics::SummaryMetrics;
use crate::types::DatasetInfo;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{info, instrument};

pub use harvester::{HarvestOutcome, Harvester};
pub use rank_store::{Category, RankStore};
pub use recency::RecencyGate;

/// Tuning knobs for a dataset's harvesting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummarySettings {
    pub sample_cap: u64,
    pub recency_window_secs: i64,
    pub max_pages_per_update: u32,
}

impl Default for SummarySettings {
    fn default() -> Self {
        Self {
            sample_cap: DEFAULT_SAMPLE_CAP,
            recency_window_secs: ONE_YEAR_SECS,
            max_pages_per_update: DEFAULT_MAX_PAGES_PER_UPDATE,
        }
    }
}

/// Why an update stopped scanning pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    SampleCapReached,
    EmptyPage,
    EndOfFeed,
    StalePage,
    PageLimit,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StopReason::SampleCapReached => "sample cap reached",
            StopReason::EmptyPage => "empty page",
            StopReason::EndOfFeed => "end of feed",
            StopReason::StalePage => "page not recent",
            StopReason::PageLimit => "page limit reached",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateReport {
    pub dataset: String,
    pub pages_fetched: u32,
    pub items_sampled: u64,
    pub samples_total: u64,
    pub last_page: Option<String>,
    pub stop_reason: StopReason,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedName {
    pub name: String,
    pub score: f64,
}

/// Snapshot of a dataset's summary state
#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub dataset: String,
    pub title: String,
    pub feed_url: String,
    pub samples: u64,
    pub last_page: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    pub activities: Vec<RankedName>,
    pub boundaries: Vec<RankedName>,
}

pub struct DatasetSummary {
    info: DatasetInfo,
    settings: SummarySettings,
    store: Arc<dyn StorePort>,
    clock: Arc<dyn Clock>,
    activities: RankStore,
    boundaries: RankStore,
    gate: RecencyGate,
    harvester: Harvester,
    lock: Arc<AsyncMutex<()>>,
}

impl DatasetSummary {
    pub fn new(
        info: DatasetInfo,
        settings: SummarySettings,
        store: Arc<dyn StorePort>,
        feed: Arc<dyn FeedPort>,
        geocoder: Option<Arc<dyn GeocoderPort>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let activities = RankStore::new(store.clone(), &info.id, Category::Activities);
        let boundaries = RankStore::new(store.clone(), &info.id, Category::Boundary);
        let gate = RecencyGate::new(clock.clone(), settings.recency_window_secs);
        let harvester = Harvester::new(
            &info.id,
            &info.feed_url,
            store.clone(),
            feed,
            geocoder,
            activities.clone(),
            boundaries.clone(),
        );
        let lock = locks::dataset_lock(&info.id);

        Self {
            info,
            settings,
            store,
            clock,
            activities,
            boundaries,
            gate,
            harvester,
            lock,
        }
    }

    /// Resolves `dataset_id` through the registry before building the summary
    pub async fn open(
        registry: &dyn RegistryPort,
        dataset_id: &str,
        settings: SummarySettings,
        store: Arc<dyn StorePort>,
        feed: Arc<dyn FeedPort>,
        geocoder: Option<Arc<dyn GeocoderPort>>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let info = registry.lookup(dataset_id).await?;
        Ok(Self::new(info, settings, store, feed, geocoder, clock))
    }

    pub fn info(&self) -> &DatasetInfo {
        &self.info
    }

    pub fn settings(&self) -> &SummarySettings {
        &self.settings
    }

    fn key(&self) -> &str {
        &self.info.id
    }

    // ---- Harvesting ----

    /// Harvests a single page with an explicit sample cap
    pub async fn harvest(&self, sample_cap: u64) -> Result<HarvestOutcome> {
        let _guard = self.lock.lock().await;
        self.harvester.harvest(sample_cap).await
    }

    /// Scheduled entry point: harvest forward from the cursor, then stamp the
    /// last-updated time. Nothing is stamped if a harvest fails.
    #[instrument(skip(self), fields(dataset = %self.info.id))]
    pub async fn update(&self) -> Result<UpdateReport> {
        let _guard = self.lock.lock().await;
        let cap = self.settings.sample_cap;
        let max_pages = self.settings.max_pages_per_update.max(1);

        let mut pages_fetched = 0u32;
        let mut items_sampled = 0u64;
        let (samples_total, stop_reason) = loop {
            let outcome = self.harvester.harvest(cap).await?;
            pages_fetched += 1;
            items_sampled += outcome.sampled;

            let end_of_feed = match outcome.next_page() {
                None => true,
                Some(next) => next == outcome.cursor,
            };
            let stop = if outcome.samples_total >= cap {
                Some(StopReason::SampleCapReached)
            } else if outcome.page.items.is_empty() {
                Some(StopReason::EmptyPage)
            } else if end_of_feed {
                Some(StopReason::EndOfFeed)
            } else if !self.gate.is_recent(&outcome.page) {
                Some(StopReason::StalePage)
            } else if pages_fetched >= max_pages {
                Some(StopReason::PageLimit)
            } else {
                None
            };

            if let Some(reason) = stop {
                break (outcome.samples_total, reason);
            }
        };

        let updated_at = self.clock.now();
        self.store
            .hash_set(self.key(), LAST_UPDATED_FIELD, &updated_at.to_rfc3339())
            .await?;

        let report = UpdateReport {
            dataset: self.info.id.clone(),
            pages_fetched,
            items_sampled,
            samples_total,
            last_page: self.last_page().await?,
            stop_reason,
            updated_at,
        };
        info!(
            "Update of {} finished after {} page(s): {} sampled, stopped on {}",
            report.dataset, report.pages_fetched, report.items_sampled, report.stop_reason
        );
        Ok(report)
    }

    // ---- Read accessors ----

    pub async fn samples(&self) -> Result<u64> {
        harvester::read_samples(self.store.as_ref(), self.key()).await
    }

    pub async fn last_page(&self) -> Result<Option<String>> {
        self.store.hash_get(self.key(), LAST_PAGE_FIELD).await
    }

    pub async fn last_updated(&self) -> Result<Option<DateTime<Utc>>> {
        let Some(raw) = self.store.hash_get(self.key(), LAST_UPDATED_FIELD).await? else {
            return Ok(None);
        };
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| Some(ts.with_timezone(&Utc)))
            .map_err(|e| {
                SummaryError::Store(format!(
                    "Invalid {} value '{}' for {}: {}",
                    LAST_UPDATED_FIELD,
                    raw,
                    self.key(),
                    e
                ))
            })
    }

    pub async fn activities(&self) -> Result<Vec<(String, f64)>> {
        self.activities.scores().await
    }

    pub async fn boundaries(&self) -> Result<Vec<(String, f64)>> {
        self.boundaries.scores().await
    }

    pub async fn ranked_activities(&self, limit: Option<usize>) -> Result<Vec<String>> {
        self.activities.ranked(limit).await
    }

    pub async fn ranked_boundaries(&self, limit: Option<usize>) -> Result<Vec<String>> {
        self.boundaries.ranked(limit).await
    }

    pub async fn report(&self, limit: Option<usize>) -> Result<SummaryReport> {
        let top = |scores: Vec<(String, f64)>| -> Vec<RankedName> {
            scores
                .into_iter()
                .take(limit.unwrap_or(usize::MAX))
                .map(|(name, score)| RankedName { name, score })
                .collect()
        };

        Ok(SummaryReport {
            dataset: self.info.id.clone(),
            title: self.info.title.clone(),
            feed_url: self.info.feed_url.clone(),
            samples: self.samples().await?,
            last_page: self.last_page().await?,
            last_updated: self.last_updated().await?,
            activities: top(self.activities().await?),
            boundaries: top(self.boundaries().await?),
        })
    }

    // ---- Resets ----

    /// Forget everything: the next update starts from the feed root
    pub async fn restart(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.store.hash_delete(self.key(), SAMPLES_FIELD).await?;
        self.store.hash_delete(self.key(), LAST_PAGE_FIELD).await?;
        self.activities.clear().await?;
        self.boundaries.clear().await?;
        SummaryMetrics::record_reset("restart");
        info!("Restarted summary for {}", self.key());
        Ok(())
    }

    /// Forget counters and rankings but keep reading forward from the cursor
    pub async fn restart_from_last_page(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.store.hash_delete(self.key(), SAMPLES_FIELD).await?;
        self.activities.clear().await?;
        self.boundaries.clear().await?;
        SummaryMetrics::record_reset("restart_from_last_page");
        info!("Restarted summary for {} from its last page", self.key());
        Ok(())
    }

    pub async fn clear_samples(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.store.hash_delete(self.key(), SAMPLES_FIELD).await?;
        SummaryMetrics::record_reset("clear_samples");
        Ok(())
    }

    pub async fn clear_last_page(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.store.hash_delete(self.key(), LAST_PAGE_FIELD).await?;
        SummaryMetrics::record_reset("clear_last_page");
        Ok(())
    }

    pub async fn clear_activities(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.activities.clear().await?;
        SummaryMetrics::record_reset("clear_activities");
        Ok(())
    }

    pub async fn clear_boundaries(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.boundaries.clear().await?;
        SummaryMetrics::record_reset("clear_boundaries");
        Ok(())
    }
}
