//! Sensor record model
//!
//! Typed sensor records and the ingestion boundary that validates the loose
//! documents coming back from the remote store. The wire format is tolerant:
//! booleans may arrive as JSON booleans or as `"true"`/`"false"` strings, the
//! window flag as `"OPEN"`/`"CLOSED"`, and timestamps may be absent.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Window contact state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WindowState {
    Open,
    #[default]
    Closed,
}

impl<'de> Deserialize<'de> for WindowState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        if text.eq_ignore_ascii_case("open") {
            Ok(WindowState::Open)
        } else {
            Ok(WindowState::Closed)
        }
    }
}

/// Accept JSON booleans and the `"true"`/`"false"` strings the firmware emits
fn de_flex_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flex {
        Bool(bool),
        Text(String),
    }

    match Flex::deserialize(deserializer)? {
        Flex::Bool(value) => Ok(value),
        Flex::Text(text) => Ok(text.eq_ignore_ascii_case("true")),
    }
}

/// A sensor document as fetched, before validation
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,

    #[serde(default)]
    pub smoke: Option<u32>,

    #[serde(default)]
    pub air: Option<u32>,

    #[serde(default)]
    pub ldr: Option<u32>,

    #[serde(default, deserialize_with = "de_flex_bool")]
    pub motion_detected: bool,

    #[serde(default, deserialize_with = "de_flex_bool")]
    pub rain: bool,

    #[serde(default)]
    pub window: WindowState,

    #[serde(default, deserialize_with = "de_flex_bool")]
    pub panic: bool,

    #[serde(default, deserialize_with = "de_flex_bool")]
    pub emergency: bool,
}

/// A validated sensor reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorRecord {
    pub timestamp: DateTime<Utc>,
    pub smoke: Option<u32>,
    pub air: Option<u32>,
    pub ldr: Option<u32>,
    pub motion_detected: bool,
    pub rain: bool,
    pub window: WindowState,
    pub panic: bool,
    pub emergency: bool,
}

impl SensorRecord {
    /// Validate a raw document, stamping `fallback` when no timestamp came
    /// over the wire.
    pub fn from_raw(raw: RawRecord, fallback: DateTime<Utc>) -> Self {
        Self {
            timestamp: raw.timestamp.unwrap_or(fallback),
            smoke: raw.smoke,
            air: raw.air,
            ldr: raw.ldr,
            motion_detected: raw.motion_detected,
            rain: raw.rain,
            window: raw.window,
            panic: raw.panic,
            emergency: raw.emergency,
        }
    }

    /// Whether this reading carries an active safety trigger
    pub fn panic_active(&self) -> bool {
        self.panic || self.emergency
    }
}

/// Validate a fetched page into the exposed snapshot ordering.
///
/// Pages arrive newest-first; records without a timestamp are assigned
/// monotonically decreasing instants from `now` so the page ordering is
/// preserved. The result is sorted newest-first.
pub fn ingest(page: Vec<RawRecord>, now: DateTime<Utc>) -> Vec<SensorRecord> {
    let mut records: Vec<SensorRecord> = page
        .into_iter()
        .enumerate()
        .map(|(i, raw)| SensorRecord::from_raw(raw, now - Duration::seconds(i as i64)))
        .collect();
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    records
}
