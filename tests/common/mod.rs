#![allow(dead_code)]

use activity_summary::app::ports::{FeedPort, GeocoderPort, StorePort};
use activity_summary::clock::FixedClock;
use activity_summary::error::{Result, SummaryError};
use activity_summary::infra::memory_store::InMemoryStore;
use activity_summary::types::{DatasetInfo, Item, Page};
use activity_summary::{DatasetSummary, SummarySettings};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub const FEED_ROOT: &str = "https://feed.example/sessions";
pub const NOW: i64 = 1_506_335_263;
pub const RECENT: i64 = 1_506_335_000;

/// Feed serving canned pages by URI and recording every request
#[derive(Default)]
pub struct ScriptedFeed {
    pages: Mutex<HashMap<String, Page>>,
    failing: Mutex<Vec<String>>,
    pub requests: Mutex<Vec<String>>,
}

impl ScriptedFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(&self, uri: &str, page: Page) {
        self.pages.lock().unwrap().insert(uri.to_string(), page);
    }

    pub fn fail(&self, uri: &str) {
        self.failing.lock().unwrap().push(uri.to_string());
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedPort for ScriptedFeed {
    async fn fetch(&self, uri: &str) -> Result<Page> {
        self.requests.lock().unwrap().push(uri.to_string());
        if self.failing.lock().unwrap().iter().any(|u| u == uri) {
            return Err(SummaryError::Feed {
                url: uri.to_string(),
                status: 503,
            });
        }
        self.pages
            .lock()
            .unwrap()
            .get(uri)
            .cloned()
            .ok_or_else(|| SummaryError::Feed {
                url: uri.to_string(),
                status: 404,
            })
    }
}

/// Feed that parks every fetch until released, then answers from `inner`
pub struct GatedFeed {
    pub inner: ScriptedFeed,
    pub entered: Notify,
    pub release: Notify,
}

impl GatedFeed {
    pub fn new(inner: ScriptedFeed) -> Self {
        Self {
            inner,
            entered: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl FeedPort for GatedFeed {
    async fn fetch(&self, uri: &str) -> Result<Page> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.fetch(uri).await
    }
}

/// Geocoder answering from a fixed latitude → name table
#[derive(Default)]
pub struct TableGeocoder {
    names: HashMap<u64, String>,
    pub calls: Mutex<usize>,
}

impl TableGeocoder {
    pub fn new(entries: &[(f64, &str)]) -> Self {
        Self {
            names: entries
                .iter()
                .map(|(lat, name)| (lat.to_bits(), name.to_string()))
                .collect(),
            calls: Mutex::new(0),
        }
    }
}

#[async_trait]
impl GeocoderPort for TableGeocoder {
    async fn reverse_geocode(&self, latitude: f64, _longitude: f64) -> Result<Option<String>> {
        *self.calls.lock().unwrap() += 1;
        if latitude.is_nan() || latitude > 90.0 {
            return Err(SummaryError::Geocoder("out of range".to_string()));
        }
        Ok(self.names.get(&latitude.to_bits()).cloned())
    }
}

pub fn activity_item(activity: Value) -> Item {
    Item::with_data(json!({ "activity": activity }))
}

pub fn located_item(activity: &str, latitude: f64, longitude: f64) -> Item {
    Item::with_data(json!({
        "activity": { "prefLabel": activity },
        "location": { "geo": { "latitude": latitude, "longitude": longitude } }
    }))
}

pub fn page(items: Vec<Item>, next: Option<&str>, modified: i64) -> Page {
    Page {
        items,
        next_page: next.map(str::to_string),
        modified: Some(modified),
    }
}

pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub feed: Arc<ScriptedFeed>,
    pub geocoder: Arc<TableGeocoder>,
    pub summary: DatasetSummary,
}

/// Each harness gets its own dataset id so tests never share a lock
pub fn harness(dataset_id: &str, settings: SummarySettings, geocoder: TableGeocoder) -> Harness {
    harness_at(dataset_id, settings, geocoder, NOW)
}

pub fn harness_at(
    dataset_id: &str,
    settings: SummarySettings,
    geocoder: TableGeocoder,
    now: i64,
) -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let feed = Arc::new(ScriptedFeed::new());
    let geocoder = Arc::new(geocoder);
    let info = DatasetInfo {
        id: dataset_id.to_string(),
        title: "Example Sessions".to_string(),
        feed_url: FEED_ROOT.to_string(),
    };
    let summary = DatasetSummary::new(
        info,
        settings,
        store.clone() as Arc<dyn StorePort>,
        feed.clone() as Arc<dyn FeedPort>,
        Some(geocoder.clone() as Arc<dyn GeocoderPort>),
        Arc::new(FixedClock::at_timestamp(now)),
    );
    Harness {
        store,
        feed,
        geocoder,
        summary,
    }
}

pub fn settings(sample_cap: u64, max_pages_per_update: u32) -> SummarySettings {
    SummarySettings {
        sample_cap,
        max_pages_per_update,
        ..SummarySettings::default()
    }
}
