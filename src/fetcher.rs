use std::time::Duration;

use chrono::{DateTime, Utc};
use feed_rs::parser;
use reqwest::Client;
use tracing::warn;

use crate::config::Source;
use crate::error::{FetchError, FetchErrorKind};

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// One entry as extracted from a feed, before it is tagged with its
/// source. `link` doubles as the display key and is unique within a
/// feed; `published` is `None` when the feed carries no usable date.
#[derive(Debug, Clone)]
pub struct RawItem {
    pub title: String,
    pub link: String,
    pub published: Option<DateTime<Utc>>,
    pub summary: Option<String>,
}

pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent("NewsRiver/1.0 (RSS Aggregator)")
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }

    /// Fetch and parse one source's feed, returning its items in feed
    /// order. Network errors, non-2xx responses and parse failures all
    /// surface as a `FetchError` for this source alone.
    pub async fn fetch(&self, source: &Source) -> Result<Vec<RawItem>, FetchError> {
        let response = self
            .client
            .get(&source.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| fetch_error(source, e.into()))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| fetch_error(source, e.into()))?;

        let parsed = parser::parse(&bytes[..]).map_err(|e| fetch_error(source, e.into()))?;

        Ok(raw_items(parsed))
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

fn fetch_error(source: &Source, kind: FetchErrorKind) -> FetchError {
    FetchError {
        source_id: source.id,
        url: source.url.clone(),
        kind,
    }
}

/// Convert a parsed feed into raw items, preserving feed order.
pub fn raw_items(feed: feed_rs::model::Feed) -> Vec<RawItem> {
    let mut items = Vec::with_capacity(feed.entries.len());

    for entry in feed.entries {
        let title = entry
            .title
            .as_ref()
            .map(|t| t.content.clone())
            .unwrap_or_else(|| "Untitled".to_string());

        let link = entry
            .links
            .first()
            .map(|l| l.href.clone())
            .unwrap_or_default();

        if link.is_empty() {
            warn!("Skipping entry with no link: {}", title);
            continue;
        }

        // Some feeds only carry an updated timestamp
        let published: Option<DateTime<Utc>> = entry.published.or(entry.updated);

        let summary = entry.summary.map(|s| s.content);

        items.push(RawItem {
            title,
            link,
            published,
            summary,
        });
    }

    items
}
