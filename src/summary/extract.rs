//! Field extraction from feed items.
//!
//! `data.activity` arrives in several shapes: a bare string, an object carrying a
//! `prefLabel`, or a list mixing both. It is decoded into [`ActivityValue`] here so
//! the rest of the crate only ever sees plain names.

use crate::app::ports::GeocoderPort;
use crate::types::Item;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

/// A single activity reference
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ActivityEntry {
    Name(String),
    Labeled {
        #[serde(rename = "prefLabel")]
        pref_label: String,
    },
    Unrecognized(Value),
}

/// The `activity` field in any of its accepted shapes
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ActivityValue {
    List(Vec<ActivityEntry>),
    Single(ActivityEntry),
}

impl ActivityEntry {
    fn into_name(self) -> Option<String> {
        match self {
            ActivityEntry::Name(name) => Some(name),
            ActivityEntry::Labeled { pref_label } => Some(pref_label),
            ActivityEntry::Unrecognized(other) => {
                warn!("Skipping activity with unrecognized shape: {}", other);
                None
            }
        }
    }
}

impl ActivityValue {
    pub fn into_names(self) -> Vec<String> {
        match self {
            ActivityValue::Single(entry) => entry.into_name().into_iter().collect(),
            ActivityValue::List(entries) => entries
                .into_iter()
                .filter_map(ActivityEntry::into_name)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct GeoCoordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Raw activity names of an item, in feed order
pub fn extract_activities(item: &Item) -> Vec<String> {
    let Some(raw) = item.data.as_ref().and_then(|data| data.get("activity")) else {
        return Vec::new();
    };

    match ActivityValue::deserialize(raw) {
        Ok(value) => value.into_names(),
        Err(e) => {
            warn!("Could not decode activity field: {}", e);
            Vec::new()
        }
    }
}

/// Coordinates at `data.location.geo`, when both are numeric
pub fn extract_geo(item: &Item) -> Option<GeoCoordinates> {
    let geo = item.data.as_ref()?.get("location")?.get("geo")?;
    GeoCoordinates::deserialize(geo).ok()
}

/// Boundary containing the item's location.
///
/// Geocoder failures are logged and reported as no boundary.
pub async fn extract_boundary(item: &Item, geocoder: &dyn GeocoderPort) -> Option<String> {
    let geo = extract_geo(item)?;

    match geocoder.reverse_geocode(geo.latitude, geo.longitude).await {
        Ok(Some(name)) if !name.trim().is_empty() => Some(name),
        Ok(_) => {
            debug!(
                "No boundary found for ({}, {})",
                geo.latitude, geo.longitude
            );
            None
        }
        Err(e) => {
            warn!(
                "Reverse geocoding ({}, {}) failed: {}",
                geo.latitude, geo.longitude, e
            );
            None
        }
    }
}
