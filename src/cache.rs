//! TTL-bounded cache slot shared by the catalog and snapshot caches.
//!
//! One policy object replaces the scattered `last_refreshed` globals this
//! kind of dashboard tends to grow: a value slot with a timestamp, an
//! injected notion of "now", and a single-flight refresh gate. The slot is
//! replaced wholesale so readers never observe a half-updated value, and a
//! failed refresh falls back to the last known good value while leaving the
//! timestamp expired, so the next caller retries.

use std::future::Future;
use std::sync::Arc;

use chrono::{Duration, NaiveDateTime};
use log::{debug, warn};
use parking_lot::RwLock;
use tokio::sync::Mutex;

struct Entry<T> {
    value: Arc<T>,
    refreshed_at: NaiveDateTime,
}

/// A cached value with a time-to-live and single-flight refresh.
pub struct TtlCache<T> {
    /// Name used in log lines ("catalog", "snapshot").
    name: &'static str,
    ttl: Duration,
    slot: RwLock<Option<Entry<T>>>,
    /// Serializes refreshes: the first expired caller rebuilds, concurrent
    /// callers wait here and then re-check the slot.
    refresh_gate: Mutex<()>,
}

impl<T> TtlCache<T> {
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self {
            name,
            ttl,
            slot: RwLock::new(None),
            refresh_gate: Mutex::new(()),
        }
    }

    /// Current value regardless of freshness.
    pub fn peek(&self) -> Option<Arc<T>> {
        self.slot.read().as_ref().map(|entry| Arc::clone(&entry.value))
    }

    /// Current value only if its age is under the TTL.
    pub fn fresh(&self, now: NaiveDateTime) -> Option<Arc<T>> {
        let slot = self.slot.read();
        let entry = slot.as_ref()?;
        if now.signed_duration_since(entry.refreshed_at) < self.ttl {
            Some(Arc::clone(&entry.value))
        } else {
            None
        }
    }

    /// Replace the slot wholesale and restart the TTL window.
    pub fn store(&self, value: T, now: NaiveDateTime) -> Arc<T> {
        let value = Arc::new(value);
        *self.slot.write() = Some(Entry {
            value: Arc::clone(&value),
            refreshed_at: now,
        });
        value
    }

    pub fn last_refreshed(&self) -> Option<NaiveDateTime> {
        self.slot.read().as_ref().map(|entry| entry.refreshed_at)
    }

    /// Serve the cached value, refreshing it first when expired.
    ///
    /// Single-flight: under concurrent expiry exactly one caller runs
    /// `refresh`, the rest wait on the gate and pick up its result. When a
    /// refresh fails and a previous value exists, the stale value is served
    /// and the error logged; with an empty slot the error propagates.
    pub async fn get_or_refresh<E, F, Fut>(
        &self,
        now: impl Fn() -> NaiveDateTime,
        refresh: F,
    ) -> Result<Arc<T>, E>
    where
        E: std::fmt::Display,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.fresh(now()) {
            return Ok(value);
        }

        let _gate = self.refresh_gate.lock().await;

        // Another caller may have refreshed while we waited on the gate.
        if let Some(value) = self.fresh(now()) {
            debug!("{} cache: refreshed by a concurrent caller", self.name);
            return Ok(value);
        }

        match refresh().await {
            Ok(value) => {
                debug!("{} cache: refreshed", self.name);
                Ok(self.store(value, now()))
            }
            Err(err) => match self.peek() {
                Some(stale) => {
                    warn!("{} cache: refresh failed, serving stale value: {err}", self.name);
                    Ok(stale)
                }
                None => Err(err),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::clock::{Clock, ManualClock};

    fn cache(ttl_secs: i64) -> TtlCache<u32> {
        TtlCache::new("test", Duration::seconds(ttl_secs))
    }

    fn start() -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2024, 7, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn warm_cache_skips_the_refresh_closure() {
        let cache = cache(60);
        let clock = ManualClock::new(start());
        let refreshes = AtomicU32::new(0);

        for _ in 0..3 {
            let value = cache
                .get_or_refresh(
                    || clock.now(),
                    || async {
                        refreshes.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, std::convert::Infallible>(7)
                    },
                )
                .await
                .unwrap();
            assert_eq!(*value, 7);
        }

        assert_eq!(refreshes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expiry_triggers_a_new_refresh() {
        let cache = cache(60);
        let clock = ManualClock::new(start());
        let refreshes = AtomicU32::new(0);

        let fetch = |value: u32| {
            let refreshes = &refreshes;
            move || async move {
                refreshes.fetch_add(1, Ordering::SeqCst);
                Ok::<_, std::convert::Infallible>(value)
            }
        };

        let first = cache.get_or_refresh(|| clock.now(), fetch(1)).await.unwrap();
        clock.advance(Duration::seconds(59));
        let second = cache.get_or_refresh(|| clock.now(), fetch(2)).await.unwrap();
        clock.advance(Duration::seconds(1));
        let third = cache.get_or_refresh(|| clock.now(), fetch(3)).await.unwrap();

        assert_eq!((*first, *second, *third), (1, 1, 3));
        assert_eq!(refreshes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_refresh_serves_the_previous_value() {
        let cache = cache(60);
        let clock = ManualClock::new(start());

        cache.store(42, clock.now());
        clock.advance(Duration::seconds(120));

        let value = cache
            .get_or_refresh(|| clock.now(), || async { Err("upstream down") })
            .await
            .unwrap();
        assert_eq!(*value, 42);

        // The slot stayed expired, so the next caller retries and can win.
        let value = cache
            .get_or_refresh(|| clock.now(), || async { Ok::<_, &str>(43) })
            .await
            .unwrap();
        assert_eq!(*value, 43);
    }

    #[tokio::test]
    async fn failed_refresh_with_empty_slot_propagates() {
        let cache = cache(60);
        let clock = ManualClock::new(start());

        let result = cache
            .get_or_refresh(|| clock.now(), || async { Err::<u32, _>("upstream down") })
            .await;
        assert_eq!(result.unwrap_err(), "upstream down");
    }

    #[tokio::test]
    async fn concurrent_expired_callers_share_one_refresh() {
        let cache = Arc::new(cache(60));
        let clock = ManualClock::new(start());
        let refreshes = Arc::new(AtomicU32::new(0));

        let run = |cache: Arc<TtlCache<u32>>, clock: ManualClock, refreshes: Arc<AtomicU32>| async move {
            cache
                .get_or_refresh(
                    || clock.now(),
                    || async {
                        refreshes.fetch_add(1, Ordering::SeqCst);
                        tokio::task::yield_now().await;
                        Ok::<_, std::convert::Infallible>(9)
                    },
                )
                .await
                .unwrap()
        };

        let (a, b) = tokio::join!(
            run(Arc::clone(&cache), clock.clone(), Arc::clone(&refreshes)),
            run(Arc::clone(&cache), clock.clone(), Arc::clone(&refreshes)),
        );

        assert_eq!((*a, *b), (9, 9));
        assert_eq!(refreshes.load(Ordering::SeqCst), 1);
    }
}
