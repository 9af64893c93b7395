//! Recording state and descriptors

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Phase of the emergency recording state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingPhase {
    /// Waiting for a panic edge
    #[default]
    Idle,
    /// Panic edge accepted, capture not yet confirmed
    Armed,
    /// Frames are being accumulated
    Capturing,
    /// Buffer detached, artifact being written
    Saving,
}

/// Descriptor for a persisted emergency recording
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingInfo {
    pub id: Uuid,

    /// Artifact file name, e.g. `emergency_20260806_142501.mp4`
    pub filename: String,

    /// Full path of the artifact on disk
    pub path: PathBuf,

    /// Instant the artifact was saved
    pub saved_at: DateTime<Utc>,

    /// Playback duration in seconds (frame count over playback rate)
    pub duration_secs: f64,

    /// Number of captured frames
    pub frame_count: usize,
}

impl RecordingInfo {
    /// Build a descriptor for `frame_count` frames played back at `fps`
    pub fn new(filename: String, path: PathBuf, frame_count: usize, fps: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename,
            path,
            saved_at: Utc::now(),
            duration_secs: frame_count as f64 / f64::from(fps.max(1)),
            frame_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_from_frame_count() {
        let info = RecordingInfo::new(
            "emergency_test.mp4".to_string(),
            PathBuf::from("/tmp/emergency_test.mp4"),
            300,
            10,
        );
        assert_eq!(info.duration_secs, 30.0);
        assert_eq!(info.frame_count, 300);
    }

    #[test]
    fn test_partial_second_duration() {
        let info = RecordingInfo::new(
            "emergency_test.mp4".to_string(),
            PathBuf::from("/tmp/emergency_test.mp4"),
            25,
            10,
        );
        assert!((info.duration_secs - 2.5).abs() < f64::EPSILON);
    }
}
