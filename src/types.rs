use crate::constants::DELETED_STATE;
use serde::{Deserialize, Serialize};

/// Raw `data` payload of a feed item, decoded lazily at the extraction boundary
pub type RawItemData = serde_json::Value;

/// A single RPDE feed item
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Item {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub modified: Option<serde_json::Value>,
    #[serde(default)]
    pub data: Option<RawItemData>,
}

impl Item {
    /// Items marked deleted carry no activity, location or recency signal
    pub fn is_deleted(&self) -> bool {
        self.state.as_deref() == Some(DELETED_STATE)
    }

    pub fn with_data(data: RawItemData) -> Self {
        Self {
            state: Some("updated".to_string()),
            data: Some(data),
            ..Default::default()
        }
    }

    pub fn deleted() -> Self {
        Self {
            state: Some(DELETED_STATE.to_string()),
            ..Default::default()
        }
    }
}

/// One page fetched from a feed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Page {
    pub items: Vec<Item>,
    /// URI of the following page, if the feed advertised one
    pub next_page: Option<String>,
    /// Unix seconds (UTC) of the page's most recent modification
    pub modified: Option<i64>,
}

impl Page {
    pub fn live_items(&self) -> impl Iterator<Item = &Item> {
        self.items.iter().filter(|item| !item.is_deleted())
    }
}

/// Registry entry describing where a dataset's feed lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub id: String,
    pub title: String,
    pub feed_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_deserializes_rpde_shape() {
        let item: Item = serde_json::from_value(json!({
            "id": "abc",
            "state": "updated",
            "kind": "SessionSeries",
            "modified": 1506335263,
            "data": {"activity": "Yoga"}
        }))
        .unwrap();

        assert!(!item.is_deleted());
        assert_eq!(item.data.unwrap()["activity"], "Yoga");
    }

    #[test]
    fn test_live_items_skip_deleted() {
        let page = Page {
            items: vec![Item::with_data(json!({})), Item::deleted()],
            next_page: None,
            modified: None,
        };

        assert_eq!(page.live_items().count(), 1);
    }
}
