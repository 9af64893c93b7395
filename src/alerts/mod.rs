//! Alert journal
//!
//! A bounded, deduplicating event log shared by every component that signals
//! an event, plus the bounded index of persisted recordings. Appends from
//! different tasks may interleave arbitrarily but are individually atomic.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::recorder::state::RecordingInfo;

/// Most alerts retained before the oldest are evicted.
pub const ALERT_CAPACITY: usize = 100;
/// Most recording descriptors retained.
pub const RECORDINGS_CAPACITY: usize = 20;

/// Classification of a logged event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    PanicButton,
    Emergency,
    RecordingStarted,
    RecordingSaved,
    RecordingError,
    CameraOnline,
    CameraOffline,
    Smoking,
    FireRisk,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::PanicButton => "panic_button",
            AlertKind::Emergency => "emergency",
            AlertKind::RecordingStarted => "recording_started",
            AlertKind::RecordingSaved => "recording_saved",
            AlertKind::RecordingError => "recording_error",
            AlertKind::CameraOnline => "camera_online",
            AlertKind::CameraOffline => "camera_offline",
            AlertKind::Smoking => "smoking",
            AlertKind::FireRisk => "fire_risk",
        }
    }
}

/// One logged event. Entries are never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEntry {
    pub timestamp: DateTime<Utc>,
    pub kind: AlertKind,
    pub source: String,
    pub detail: String,
}

#[derive(Default)]
struct AlertLogInner {
    entries: VecDeque<AlertEntry>,
    /// (kind, source) -> last appended (kind, source, detail) triple
    last_state: HashMap<(AlertKind, String), String>,
    recordings: VecDeque<RecordingInfo>,
}

/// Bounded, deduplicating alert journal
#[derive(Default)]
pub struct AlertLog {
    inner: Mutex<AlertLogInner>,
}

impl AlertLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event unless the (kind, source, detail) triple is identical
    /// to the last entry appended under the same (kind, source) key.
    pub fn append(&self, kind: AlertKind, source: &str, detail: &str) {
        let mut inner = self.inner.lock();

        let key = (kind, source.to_string());
        if inner.last_state.get(&key).map(String::as_str) == Some(detail) {
            return;
        }

        if inner.entries.len() == ALERT_CAPACITY {
            inner.entries.pop_front();
        }
        inner.entries.push_back(AlertEntry {
            timestamp: Utc::now(),
            kind,
            source: source.to_string(),
            detail: detail.to_string(),
        });
        inner.last_state.insert(key, detail.to_string());

        tracing::info!(kind = kind.as_str(), source, detail, "alert");
    }

    /// The `n` most recent entries, newest first
    pub fn recent(&self, n: usize) -> Vec<AlertEntry> {
        let inner = self.inner.lock();
        inner.entries.iter().rev().take(n).cloned().collect()
    }

    /// Total entries currently retained
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Empty the journal and the dedup map. Recordings are untouched.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.last_state.clear();
    }

    /// Prepend a saved-recording descriptor, evicting the oldest past capacity
    pub fn push_recording(&self, info: RecordingInfo) {
        let mut inner = self.inner.lock();
        inner.recordings.push_front(info);
        inner.recordings.truncate(RECORDINGS_CAPACITY);
    }

    /// The `n` most recent recording descriptors, newest first
    pub fn recordings(&self, n: usize) -> Vec<RecordingInfo> {
        let inner = self.inner.lock();
        inner.recordings.iter().take(n).cloned().collect()
    }
}
