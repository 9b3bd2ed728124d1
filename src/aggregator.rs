use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::config::Source;
use crate::error::AllSourcesFailed;
use crate::fetcher::{Fetcher, RawItem};

/// A feed entry tagged with the source it came from.
#[derive(Debug, Clone)]
pub struct Item {
    pub source: Source,
    pub title: String,
    pub link: String,
    pub published: Option<DateTime<Utc>>,
    pub summary: Option<String>,
}

impl Item {
    fn tag(raw: RawItem, source: &Source) -> Self {
        Self {
            source: source.clone(),
            title: raw.title,
            link: raw.link,
            published: raw.published,
            summary: raw.summary,
        }
    }
}

pub struct Aggregator {
    fetcher: Arc<Fetcher>,
    sources: Vec<Source>,
}

impl Aggregator {
    pub fn new(fetcher: Arc<Fetcher>, sources: Vec<Source>) -> Self {
        Self { fetcher, sources }
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// Fetch every source concurrently and merge the results into one
    /// list sorted by publication time, newest first. Items without a
    /// timestamp sort last. Ties keep source-registry order, then the
    /// order the feed provided.
    ///
    /// A failing source contributes no items and does not fail the
    /// aggregation; only the case where every source failed is an error.
    pub async fn aggregate(&self) -> Result<Vec<Item>, AllSourcesFailed> {
        let mut tasks = JoinSet::new();
        for source in &self.sources {
            let fetcher = self.fetcher.clone();
            let source = source.clone();
            tasks.spawn(async move {
                let result = fetcher.fetch(&source).await;
                (source.id, result)
            });
        }

        // Re-bucket by registry index so the merge order never depends
        // on which fetch finished first.
        let mut fetched: Vec<Option<Vec<RawItem>>> = (0..self.sources.len()).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((id, Ok(raw))) => fetched[id] = Some(raw),
                Ok((id, Err(e))) => {
                    warn!("Failed to fetch '{}': {}", self.sources[id].name, e);
                }
                Err(e) => error!("Fetch task failed: {}", e),
            }
        }

        let succeeded = fetched.iter().filter(|f| f.is_some()).count();
        if succeeded == 0 && !self.sources.is_empty() {
            return Err(AllSourcesFailed {
                attempted: self.sources.len(),
            });
        }

        let mut items: Vec<Item> = Vec::new();
        for (source, raw) in self.sources.iter().zip(fetched) {
            if let Some(raw) = raw {
                items.extend(raw.into_iter().map(|r| Item::tag(r, source)));
            }
        }

        // Stable sort: None compares lowest, so undated items land at
        // the end of the descending order.
        items.sort_by(|a, b| b.published.cmp(&a.published));

        info!(
            "Aggregated {} items from {}/{} sources",
            items.len(),
            succeeded,
            self.sources.len()
        );

        Ok(items)
    }
}
