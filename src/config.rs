//! Application configuration
//!
//! Typed configuration for each background task, loadable from an optional
//! JSON file. Defaults encode the operational constants of the system.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppResult;

/// Seconds between acquisition ticks.
pub const FETCH_INTERVAL_SECS: u64 = 5;
/// Records requested per fetch page.
pub const FETCH_PAGE_LIMIT: usize = 50;
/// Daily document reads allowed before the loop refuses further fetches.
pub const DAILY_READ_CEILING: u64 = 49_000;
/// How long the quota flag suppresses fetches once set.
pub const QUOTA_COOLDOWN_SECS: u64 = 3_600;
/// Records produced per synthetic demo batch.
pub const DEMO_BATCH_SIZE: usize = 50;

/// Target playback and capture rate for emergency footage.
pub const RECORDING_FPS: u32 = 10;
/// Fixed length of an emergency recording.
pub const RECORDING_DURATION_SECS: u64 = 30;
/// Re-arming is suppressed for this long after a trigger.
pub const PANIC_COOLDOWN_SECS: u64 = 60;

/// Remote document-store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionConfig {
    /// Document-store query endpoint
    pub endpoint: String,

    /// Collection holding sensor documents
    pub collection: String,

    /// Seconds between ticks
    pub interval_secs: u64,

    /// Page size per fetch
    pub page_limit: usize,

    /// Daily read ceiling before pre-emptive quota suppression
    pub daily_read_ceiling: u64,

    /// Quota suppression window in seconds
    pub quota_cooldown_secs: u64,

    /// Start in demo mode (synthetic data, no remote reads)
    pub demo_mode: bool,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8086/query".to_string(),
            collection: "sensor_readings".to_string(),
            interval_secs: FETCH_INTERVAL_SECS,
            page_limit: FETCH_PAGE_LIMIT,
            daily_read_ceiling: DAILY_READ_CEILING,
            quota_cooldown_secs: QUOTA_COOLDOWN_SECS,
            demo_mode: false,
        }
    }
}

impl AcquisitionConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn quota_cooldown(&self) -> Duration {
        Duration::from_secs(self.quota_cooldown_secs)
    }
}

/// Camera capture settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Whether the frame producer starts with the process
    pub enabled: bool,

    /// Device index to capture from
    pub source: u32,

    /// Requested capture width
    pub width: u32,

    /// Requested capture height
    pub height: u32,

    /// Target frames per second
    pub fps: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            source: 0,
            width: 1280,
            height: 720,
            fps: RECORDING_FPS,
        }
    }
}

impl CameraConfig {
    /// Pacing interval between published frames
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(1_000 / u64::from(self.fps.max(1)))
    }
}

/// Emergency recorder settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecorderConfig {
    /// Directory receiving saved artifacts
    pub recordings_dir: PathBuf,

    /// Fixed recording length in seconds
    pub duration_secs: u64,

    /// Suppression window after a trigger, in seconds
    pub cooldown_secs: u64,

    /// Capture sample rate and encoded playback rate
    pub fps: u32,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            recordings_dir: PathBuf::from("emergency_recordings"),
            duration_secs: RECORDING_DURATION_SECS,
            cooldown_secs: PANIC_COOLDOWN_SECS,
            fps: RECORDING_FPS,
        }
    }
}

impl RecorderConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    /// Interval between capture samples while recording
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(1_000 / u64::from(self.fps.max(1)))
    }
}

/// Top-level application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub acquisition: AcquisitionConfig,
    pub camera: CameraConfig,
    pub recorder: RecorderConfig,
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_carry_operational_constants() {
        let config = AppConfig::default();
        assert_eq!(config.acquisition.interval_secs, 5);
        assert_eq!(config.acquisition.daily_read_ceiling, 49_000);
        assert_eq!(config.recorder.duration_secs, 30);
        assert_eq!(config.recorder.cooldown_secs, 60);
        assert_eq!(config.recorder.sample_interval(), Duration::from_millis(100));
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"acquisition": {"endpoint": "http://store.local/query", "collection": "sensor_readings", "interval_secs": 10, "page_limit": 25, "daily_read_ceiling": 1000, "quota_cooldown_secs": 60, "demo_mode": true}}"#,
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert!(config.acquisition.demo_mode);
        assert_eq!(config.acquisition.page_limit, 25);
        // Untouched sections fall back to defaults
        assert_eq!(config.recorder.fps, RECORDING_FPS);
    }
}
