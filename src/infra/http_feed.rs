use crate::app::ports::FeedPort;
use crate::error::{Result, SummaryError};
use crate::types::{Item, Page};
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::header::LAST_MODIFIED;
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

/// Wire shape of an RPDE page
#[derive(Debug, Deserialize)]
struct RpdePage {
    #[serde(default)]
    items: Vec<Item>,
    #[serde(default)]
    next: Option<String>,
}

/// Feed client speaking RPDE over HTTP
pub struct HttpFeed {
    client: reqwest::Client,
}

impl HttpFeed {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

fn parse_url(uri: &str) -> Result<Url> {
    Url::parse(uri).map_err(|e| SummaryError::FeedUrl {
        url: uri.to_string(),
        message: e.to_string(),
    })
}

/// Greatest numeric `modified` among live items, read as unix seconds
fn newest_item_modified(items: &[Item]) -> Option<i64> {
    items
        .iter()
        .filter(|item| !item.is_deleted())
        .filter_map(|item| match item.modified.as_ref()? {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        })
        .max()
}

/// Decodes an RPDE body fetched from `base`.
///
/// A relative `next` link is resolved against `base`. `last_modified`, when
/// the server sent one, takes precedence over item timestamps.
pub fn parse_page(base: &Url, body: &[u8], last_modified: Option<i64>) -> Result<Page> {
    let rpde: RpdePage = serde_json::from_slice(body)?;

    let next_page = match rpde.next.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(next) => Some(
            base.join(next)
                .map_err(|e| SummaryError::FeedUrl {
                    url: next.to_string(),
                    message: e.to_string(),
                })?
                .to_string(),
        ),
    };
    let modified = last_modified.or_else(|| newest_item_modified(&rpde.items));

    Ok(Page {
        items: rpde.items,
        next_page,
        modified,
    })
}

#[async_trait]
impl FeedPort for HttpFeed {
    #[instrument(skip(self))]
    async fn fetch(&self, uri: &str) -> Result<Page> {
        let url = parse_url(uri)?;
        let resp = self.client.get(url.clone()).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SummaryError::Feed {
                url: uri.to_string(),
                status: status.as_u16(),
            });
        }

        let last_modified = resp
            .headers()
            .get(LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| DateTime::parse_from_rfc2822(s).ok())
            .map(|ts| ts.timestamp());
        let body = resp.bytes().await?;
        debug!("Fetched {} bytes from {}", body.len(), uri);

        parse_page(&url, &body, last_modified)
    }
}
