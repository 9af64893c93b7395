//! Data acquisition loop
//!
//! Background task that keeps the shared snapshot current. Each tick it
//! either synthesizes a demo batch or decides whether a remote fetch is due,
//! enforcing the daily read ceiling and the quota cooldown. All decisions
//! happen under one brief store lock; the fetch itself runs outside any
//! lock and its outcome is merged back afterwards. No failure ends the
//! loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{Duration, Local, Utc};
use tokio::time::MissedTickBehavior;

use super::fetch::{FetchError, TelemetryFetcher};
use super::mock::synthetic_batch;
use super::record::ingest;
use crate::config::{AcquisitionConfig, DEMO_BATCH_SIZE};
use crate::store::StateStore;

enum TickDecision {
    /// Not due, or quota suppression still active
    Skip,
    /// Daily ceiling reached; quota flag set without calling the store
    QuotaPreempt,
    Fetch,
}

/// Keeps [`StateStore`] fed with remote or synthetic data
pub struct AcquisitionLoop {
    store: Arc<StateStore>,
    fetcher: Arc<dyn TelemetryFetcher>,
    config: AcquisitionConfig,
    stop: Arc<AtomicBool>,
}

impl AcquisitionLoop {
    pub fn new(
        store: Arc<StateStore>,
        fetcher: Arc<dyn TelemetryFetcher>,
        config: AcquisitionConfig,
    ) -> Self {
        Self {
            store,
            fetcher,
            config,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Cooperative stop; the loop exits at its next tick boundary
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    /// Run until the stop flag is raised. Intended to outlive the process
    /// in normal operation.
    pub async fn run(&self) {
        let period = self.config.interval().max(std::time::Duration::from_millis(1));
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            interval_secs = self.config.interval_secs,
            "acquisition loop started"
        );

        while !self.stop.load(Ordering::Relaxed) {
            interval.tick().await;
            self.tick().await;
        }

        tracing::info!("acquisition loop stopped");
    }

    /// One acquisition decision cycle
    pub async fn tick(&self) {
        let demo = self.store.update(|s| s.demo_mode);
        if demo {
            self.install_demo_batch();
            return;
        }

        let now = Utc::now();
        let today = Local::now().date_naive();
        let interval = Duration::seconds(self.config.interval_secs as i64);
        let cooldown = Duration::seconds(self.config.quota_cooldown_secs as i64);
        let ceiling = self.config.daily_read_ceiling;

        let decision = self.store.update(|s| {
            s.roll_daily(today);

            if s.quota_exceeded {
                let cooled = s
                    .quota_exceeded_at
                    .map(|at| now - at >= cooldown)
                    .unwrap_or(true);
                if !cooled {
                    return TickDecision::Skip;
                }
                s.quota_exceeded = false;
                s.quota_exceeded_at = None;
            }

            let due = s.last_fetch.map(|at| now - at >= interval).unwrap_or(true);
            if !due {
                return TickDecision::Skip;
            }

            if s.daily_reads >= ceiling {
                // A call now would almost certainly be rejected; refuse it
                // ourselves and start the cooldown.
                s.quota_exceeded = true;
                s.quota_exceeded_at = Some(now);
                return TickDecision::QuotaPreempt;
            }

            TickDecision::Fetch
        });

        match decision {
            TickDecision::Skip => {}
            TickDecision::QuotaPreempt => {
                tracing::warn!(ceiling, "daily read ceiling reached, fetches suppressed");
            }
            TickDecision::Fetch => self.fetch_and_merge().await,
        }
    }

    fn install_demo_batch(&self) {
        let batch = synthetic_batch(DEMO_BATCH_SIZE);
        self.store.update(|s| {
            s.records = batch;
            s.fetch_counter += 1;
            s.last_update = Some(Utc::now());
        });
        tracing::debug!("demo mode: installed synthetic batch");
    }

    async fn fetch_and_merge(&self) {
        let limit = self.config.page_limit;
        let result = self.fetcher.fetch(limit).await;
        let now = Utc::now();

        match result {
            Ok(page) if page.is_empty() => {
                // A transient query glitch can return an empty page; keep
                // serving the previous snapshot.
                tracing::debug!("fetch returned empty page, cache retained");
            }
            Ok(page) => {
                let fetched = page.len();
                let records = ingest(page, now);
                self.store.update(|s| {
                    s.records = records;
                    s.fetch_counter += 1;
                    s.daily_reads += limit as u64;
                    s.last_fetch = Some(now);
                    s.last_update = Some(now);
                });
                tracing::debug!(fetched, "snapshot refreshed");
            }
            Err(error) => {
                let quota = matches!(error, FetchError::Quota(_));
                self.store.update(|s| {
                    s.failed_fetches += 1;
                    if quota {
                        s.quota_exceeded = true;
                        s.quota_exceeded_at = Some(now);
                    }
                });
                tracing::warn!(%error, "fetch failed, serving cached snapshot");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use crate::telemetry::record::RawRecord;

    /// Returns scripted pages in order, then empty pages forever
    struct ScriptedFetcher {
        pages: Mutex<VecDeque<Result<Vec<RawRecord>, FetchError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedFetcher {
        fn new(pages: Vec<Result<Vec<RawRecord>, FetchError>>) -> Arc<Self> {
            Arc::new(Self {
                pages: Mutex::new(pages.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TelemetryFetcher for ScriptedFetcher {
        async fn fetch(&self, _limit: usize) -> Result<Vec<RawRecord>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.pages.lock().pop_front().unwrap_or(Ok(Vec::new()))
        }
    }

    fn page(len: usize) -> Result<Vec<RawRecord>, FetchError> {
        Ok(vec![RawRecord::default(); len])
    }

    fn test_config() -> AcquisitionConfig {
        AcquisitionConfig {
            // Always due: no pacing between test ticks.
            interval_secs: 0,
            ..AcquisitionConfig::default()
        }
    }

    fn make_loop(
        pages: Vec<Result<Vec<RawRecord>, FetchError>>,
        config: AcquisitionConfig,
    ) -> (AcquisitionLoop, Arc<StateStore>, Arc<ScriptedFetcher>) {
        let store = Arc::new(StateStore::new());
        let fetcher = ScriptedFetcher::new(pages);
        let looper = AcquisitionLoop::new(store.clone(), fetcher.clone(), config);
        (looper, store, fetcher)
    }

    #[tokio::test]
    async fn test_successful_fetch_replaces_cache() {
        let (looper, store, fetcher) = make_loop(vec![page(2)], test_config());

        looper.tick().await;

        let snap = store.snapshot();
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(snap.records.len(), 2);
        assert_eq!(snap.fetch_counter, 1);
        assert_eq!(snap.daily_reads, crate::config::FETCH_PAGE_LIMIT as u64);
        assert!(snap.last_fetch.is_some());
    }

    #[tokio::test]
    async fn test_empty_page_retains_cache() {
        let (looper, store, _) = make_loop(vec![page(3), page(0)], test_config());

        looper.tick().await;
        let first = store.snapshot();
        assert_eq!(first.records.len(), 3);

        looper.tick().await;
        let second = store.snapshot();
        assert_eq!(second.records, first.records);
        assert_eq!(second.fetch_counter, 1);
    }

    #[tokio::test]
    async fn test_quota_error_sets_flag_and_keeps_cache() {
        let (looper, store, _) = make_loop(
            vec![page(2), Err(FetchError::Quota("429".into()))],
            test_config(),
        );

        looper.tick().await;
        looper.tick().await;

        let snap = store.snapshot();
        assert!(snap.quota_exceeded);
        assert!(snap.quota_exceeded_at.is_some());
        assert_eq!(snap.failed_fetches, 1);
        assert_eq!(snap.records.len(), 2);
    }

    #[tokio::test]
    async fn test_transient_error_does_not_set_quota() {
        let (looper, store, _) = make_loop(
            vec![Err(FetchError::Transient("timeout".into()))],
            test_config(),
        );

        looper.tick().await;

        let snap = store.snapshot();
        assert!(!snap.quota_exceeded);
        assert_eq!(snap.failed_fetches, 1);
    }

    #[tokio::test]
    async fn test_active_quota_suppresses_fetches() {
        let (looper, store, fetcher) = make_loop(vec![page(2)], test_config());
        store.update(|s| {
            s.quota_exceeded = true;
            s.quota_exceeded_at = Some(Utc::now());
        });

        looper.tick().await;

        assert_eq!(fetcher.calls(), 0);
        assert!(store.snapshot().quota_exceeded);
    }

    #[tokio::test]
    async fn test_quota_flag_clears_after_cooldown() {
        let (looper, store, fetcher) = make_loop(vec![page(1)], test_config());
        store.update(|s| {
            s.quota_exceeded = true;
            s.quota_exceeded_at = Some(Utc::now() - Duration::hours(2));
        });

        looper.tick().await;

        let snap = store.snapshot();
        assert!(!snap.quota_exceeded);
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(snap.records.len(), 1);
    }

    #[tokio::test]
    async fn test_ceiling_preempts_before_the_call() {
        let config = AcquisitionConfig {
            daily_read_ceiling: 100,
            page_limit: 50,
            ..test_config()
        };
        let (looper, store, fetcher) = make_loop(vec![page(50), page(50), page(50)], config);

        looper.tick().await;
        looper.tick().await;
        // Counter now sits at the ceiling; this tick must refuse the call.
        looper.tick().await;

        let snap = store.snapshot();
        assert_eq!(fetcher.calls(), 2);
        assert!(snap.daily_reads <= 100);
        assert!(snap.quota_exceeded);
    }

    #[tokio::test]
    async fn test_demo_mode_never_touches_quota() {
        let (looper, store, fetcher) = make_loop(vec![page(2)], test_config());
        store.update(|s| {
            s.demo_mode = true;
            s.daily_reads = 77;
        });

        looper.tick().await;

        let snap = store.snapshot();
        assert_eq!(fetcher.calls(), 0);
        assert_eq!(snap.records.len(), DEMO_BATCH_SIZE);
        assert_eq!(snap.daily_reads, 77);
        assert!(!snap.quota_exceeded);
        assert_eq!(snap.fetch_counter, 1);
    }

    #[tokio::test]
    async fn test_not_due_skips_fetch() {
        let config = AcquisitionConfig {
            interval_secs: 3_600,
            ..AcquisitionConfig::default()
        };
        let (looper, store, fetcher) = make_loop(vec![page(1), page(1)], config);

        looper.tick().await;
        // Second tick arrives well inside the interval.
        looper.tick().await;

        assert_eq!(fetcher.calls(), 1);
        assert_eq!(store.snapshot().fetch_counter, 1);
    }
}
