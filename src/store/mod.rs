//! Shared state store
//!
//! One mutex guards the sensor snapshot and all acquisition bookkeeping.
//! Writers mutate through `update`, readers copy through `snapshot`; no
//! field is touched outside the lock, and neither call performs I/O while
//! holding it.

use chrono::{DateTime, Local, NaiveDate, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::telemetry::record::SensorRecord;

/// Everything the store guards, cloned out as one consistent view
#[derive(Debug, Clone)]
pub struct SharedState {
    /// Latest validated sensor records, newest first
    pub records: Vec<SensorRecord>,

    /// Successful fetches since startup
    pub fetch_counter: u64,

    /// Document reads charged against today's quota
    pub daily_reads: u64,

    /// Local date the daily counter was last reset
    pub last_reset: NaiveDate,

    /// Remote reads are suppressed while set
    pub quota_exceeded: bool,

    /// Instant the quota flag was set
    pub quota_exceeded_at: Option<DateTime<Utc>>,

    /// Fetch attempts that failed since startup
    pub failed_fetches: u64,

    /// Instant of the last successful fetch
    pub last_fetch: Option<DateTime<Utc>>,

    /// Instant the snapshot last changed (fetch or synthetic batch)
    pub last_update: Option<DateTime<Utc>>,

    /// Synthetic data replaces remote fetches while set
    pub demo_mode: bool,
}

impl Default for SharedState {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            fetch_counter: 0,
            daily_reads: 0,
            last_reset: Local::now().date_naive(),
            quota_exceeded: false,
            quota_exceeded_at: None,
            failed_fetches: 0,
            last_fetch: None,
            last_update: None,
            demo_mode: false,
        }
    }
}

impl SharedState {
    /// The most recent record, if any
    pub fn latest_record(&self) -> Option<&SensorRecord> {
        self.records.first()
    }

    /// Reset the daily counter when the local date has rolled over
    pub fn roll_daily(&mut self, today: NaiveDate) {
        if self.last_reset != today {
            self.daily_reads = 0;
            self.last_reset = today;
        }
    }

    /// Read-model for the presentation layer
    pub fn stats(&self) -> AcquisitionStats {
        AcquisitionStats {
            fetch_counter: self.fetch_counter,
            daily_reads: self.daily_reads,
            quota_exceeded: self.quota_exceeded,
            failed_fetches: self.failed_fetches,
            last_fetch: self.last_fetch,
            last_update: self.last_update,
            demo_mode: self.demo_mode,
            record_count: self.records.len(),
        }
    }
}

/// Acquisition bookkeeping exposed to pollers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionStats {
    pub fetch_counter: u64,
    pub daily_reads: u64,
    pub quota_exceeded: bool,
    pub failed_fetches: u64,
    pub last_fetch: Option<DateTime<Utc>>,
    pub last_update: Option<DateTime<Utc>>,
    pub demo_mode: bool,
    pub record_count: usize,
}

/// Mutex-guarded owner of [`SharedState`]
#[derive(Default)]
pub struct StateStore {
    inner: Mutex<SharedState>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a mutation atomically. The closure must not block or perform
    /// I/O; fetch and encode results are merged back through here after the
    /// fact.
    pub fn update<R>(&self, f: impl FnOnce(&mut SharedState) -> R) -> R {
        let mut state = self.inner.lock();
        f(&mut state)
    }

    /// A consistent copy of the whole state, never a partial view
    pub fn snapshot(&self) -> SharedState {
        self.inner.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use crate::telemetry::record::RawRecord;

    #[test]
    fn test_update_and_snapshot_are_consistent() {
        let store = StateStore::new();

        store.update(|s| {
            s.fetch_counter = 3;
            s.daily_reads = 150;
            s.records = vec![SensorRecord::from_raw(RawRecord::default(), Utc::now())];
        });

        let snap = store.snapshot();
        assert_eq!(snap.fetch_counter, 3);
        assert_eq!(snap.daily_reads, 150);
        assert_eq!(snap.records.len(), 1);

        // The snapshot is detached: further updates do not affect it.
        store.update(|s| s.fetch_counter = 9);
        assert_eq!(snap.fetch_counter, 3);
    }

    #[test]
    fn test_daily_counter_rolls_only_on_date_change() {
        let mut state = SharedState {
            daily_reads: 400,
            ..SharedState::default()
        };

        let same_day = state.last_reset;
        state.roll_daily(same_day);
        assert_eq!(state.daily_reads, 400);

        let next_day = same_day + Duration::days(1);
        state.roll_daily(next_day);
        assert_eq!(state.daily_reads, 0);
        assert_eq!(state.last_reset, next_day);
    }

    #[test]
    fn test_update_returns_closure_result() {
        let store = StateStore::new();
        let due = store.update(|s| {
            s.demo_mode = true;
            s.demo_mode
        });
        assert!(due);
    }

    #[test]
    fn test_stats_reflect_state() {
        let store = StateStore::new();
        store.update(|s| {
            s.quota_exceeded = true;
            s.failed_fetches = 2;
        });

        let stats = store.snapshot().stats();
        assert!(stats.quota_exceeded);
        assert_eq!(stats.failed_fetches, 2);
        assert_eq!(stats.record_count, 0);
    }
}
