use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

struct Entry<T> {
    value: Arc<T>,
    expires_at: Instant,
}

/// Single-slot cache with a fixed time-to-live.
///
/// `get_or_refresh` returns the stored value while it is live. On expiry
/// the refresh lock collapses concurrent callers into one recomputation;
/// the rest wait and share its result. A failed recomputation never
/// replaces the slot: the previous value keeps being served (and retried
/// on every call, since its expiry is left in the past) until a refresh
/// succeeds, and with nothing to fall back on the error is returned.
pub struct TtlCache<T> {
    ttl: Duration,
    slot: RwLock<Option<Entry<T>>>,
    refresh: Mutex<()>,
}

impl<T> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    pub async fn get_or_refresh<F, Fut, E>(&self, compute: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.live().await {
            return Ok(value);
        }

        let _guard = self.refresh.lock().await;

        // Another caller may have refreshed while we waited for the lock
        if let Some(value) = self.live().await {
            return Ok(value);
        }

        match compute().await {
            Ok(value) => {
                let value = Arc::new(value);
                let mut slot = self.slot.write().await;
                *slot = Some(Entry {
                    value: value.clone(),
                    expires_at: Instant::now() + self.ttl,
                });
                info!("Cache refreshed, next expiry in {:?}", self.ttl);
                Ok(value)
            }
            Err(err) => {
                let slot = self.slot.read().await;
                match slot.as_ref() {
                    Some(entry) => {
                        warn!("Refresh failed, serving stale cache entry");
                        Ok(entry.value.clone())
                    }
                    None => Err(err),
                }
            }
        }
    }

    async fn live(&self) -> Option<Arc<T>> {
        let slot = self.slot.read().await;
        slot.as_ref()
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.value.clone())
    }
}
