//! Presentation read facade
//!
//! The poll-only contract for any display layer. Every accessor takes a
//! short lock on exactly one shared structure and returns detached copies,
//! so a renderer polling at its own cadence never blocks a producer.

use std::sync::Arc;

use crate::alerts::{AlertEntry, AlertLog};
use crate::capture::frame::{Frame, FrameSlot};
use crate::recorder::state::RecordingInfo;
use crate::store::{AcquisitionStats, SharedState, StateStore};

/// Cheap cloneable handle over the shared structures
#[derive(Clone)]
pub struct Dashboard {
    store: Arc<StateStore>,
    slot: Arc<FrameSlot>,
    alerts: Arc<AlertLog>,
}

impl Dashboard {
    pub fn new(store: Arc<StateStore>, slot: Arc<FrameSlot>, alerts: Arc<AlertLog>) -> Self {
        Self { store, slot, alerts }
    }

    /// Consistent copy of the sensor snapshot and acquisition bookkeeping
    pub fn snapshot(&self) -> SharedState {
        self.store.snapshot()
    }

    /// Most recently published camera frame, if the camera is live
    pub fn latest_frame(&self) -> Option<Frame> {
        self.slot.latest()
    }

    /// The `n` most recent alerts, newest first
    pub fn recent_alerts(&self, n: usize) -> Vec<AlertEntry> {
        self.alerts.recent(n)
    }

    /// The `n` most recent recording descriptors, newest first
    pub fn recordings(&self, n: usize) -> Vec<RecordingInfo> {
        self.alerts.recordings(n)
    }

    /// Fetch/quota counters for status panes
    pub fn acquisition_stats(&self) -> AcquisitionStats {
        self.store.snapshot().stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::AlertKind;
    use crate::capture::frame::Frame;

    #[test]
    fn test_reads_are_detached_copies() {
        let store = Arc::new(StateStore::new());
        let slot = Arc::new(FrameSlot::new());
        let alerts = Arc::new(AlertLog::new());
        let dashboard = Dashboard::new(store.clone(), slot.clone(), alerts.clone());

        assert!(dashboard.latest_frame().is_none());
        assert!(dashboard.recent_alerts(10).is_empty());

        store.update(|s| s.fetch_counter = 4);
        slot.publish(Frame::new(2, 2, vec![0; 16]));
        alerts.append(AlertKind::CameraOnline, "Camera", "up");

        let stats = dashboard.acquisition_stats();
        assert_eq!(stats.fetch_counter, 4);
        assert_eq!(dashboard.latest_frame().unwrap().seq, 1);
        assert_eq!(dashboard.recent_alerts(10).len(), 1);

        // The snapshot does not track later writes.
        let snapshot = dashboard.snapshot();
        store.update(|s| s.fetch_counter = 9);
        assert_eq!(snapshot.fetch_counter, 4);
    }
}
