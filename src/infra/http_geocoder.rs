use crate::app::ports::GeocoderPort;
use crate::error::{Result, SummaryError};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Deserialize)]
pub struct MapitArea {
    pub name: String,
    #[serde(rename = "type", default)]
    pub area_type: Option<String>,
}

/// Picks the lowest-id area, restricted to `area_type` when one is given
pub fn pick_area(areas: HashMap<String, MapitArea>, area_type: Option<&str>) -> Option<String> {
    let mut candidates: Vec<(String, MapitArea)> = areas
        .into_iter()
        .filter(|(_, area)| match area_type {
            Some(wanted) => area.area_type.as_deref() == Some(wanted),
            None => true,
        })
        .collect();
    candidates.sort_by(|(a, _), (b, _)| match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        _ => a.cmp(b),
    });
    candidates.into_iter().next().map(|(_, area)| area.name)
}

/// Reverse geocoder for MapIt-style point lookups
/// (`{base_url}/point/4326/{lon},{lat}`).
///
/// Answers are cached per coordinate pair for the lifetime of the client.
pub struct HttpGeocoder {
    client: reqwest::Client,
    base_url: String,
    area_type: Option<String>,
    cache: Mutex<HashMap<(u64, u64), Option<String>>>,
}

impl HttpGeocoder {
    pub fn new(base_url: &str, area_type: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            area_type,
            cache: Mutex::new(HashMap::new()),
        })
    }

    pub fn point_url(&self, latitude: f64, longitude: f64) -> String {
        format!("{}/point/4326/{},{}", self.base_url, longitude, latitude)
    }

    fn cached(&self, key: (u64, u64)) -> Option<Option<String>> {
        self.cache.lock().ok()?.get(&key).cloned()
    }

    fn remember(&self, key: (u64, u64), value: Option<String>) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key, value);
        }
    }
}

#[async_trait]
impl GeocoderPort for HttpGeocoder {
    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> Result<Option<String>> {
        let key = (latitude.to_bits(), longitude.to_bits());
        if let Some(hit) = self.cached(key) {
            return Ok(hit);
        }

        let url = self.point_url(latitude, longitude);
        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        let boundary = if status == StatusCode::NOT_FOUND {
            None
        } else if !status.is_success() {
            return Err(SummaryError::Geocoder(format!(
                "{} returned status {}",
                url,
                status.as_u16()
            )));
        } else {
            let areas: HashMap<String, MapitArea> = resp.json().await?;
            pick_area(areas, self.area_type.as_deref())
        };

        debug!("Boundary for ({}, {}): {:?}", latitude, longitude, boundary);
        self.remember(key, boundary.clone());
        Ok(boundary)
    }
}
