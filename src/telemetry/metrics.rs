//! Derived presentation metrics
//!
//! Pure helpers the presentation layer applies to snapshots: energy
//! accounting, period filtering, and severity banding for gas readings.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::record::SensorRecord;

/// Power draw while motion keeps the site equipment active, in watts.
const ACTIVE_POWER_W: f64 = 50.0;
/// Standby power draw, in watts.
const STANDBY_POWER_W: f64 = 5.0;

/// Moderate band starts at this reading.
const SEVERITY_MODERATE: u32 = 2_000;
/// Poor band starts at this reading.
const SEVERITY_POOR: u32 = 3_000;

/// Energy consumed over `minutes`, in watt-hours
pub fn energy_usage_wh(motion_detected: bool, minutes: f64) -> f64 {
    let power = if motion_detected {
        ACTIVE_POWER_W
    } else {
        STANDBY_POWER_W
    };
    power * (minutes / 60.0)
}

/// Reporting window for aggregate views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Week,
    Month,
}

impl Period {
    fn window(&self) -> Duration {
        match self {
            Period::Day => Duration::days(1),
            Period::Week => Duration::weeks(1),
            Period::Month => Duration::days(30),
        }
    }
}

/// Records no older than the period window, order preserved
pub fn filter_by_period(
    records: &[SensorRecord],
    period: Period,
    now: DateTime<Utc>,
) -> Vec<SensorRecord> {
    let start = now - period.window();
    records
        .iter()
        .filter(|r| r.timestamp >= start)
        .cloned()
        .collect()
}

/// Severity band for smoke/air readings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Good,
    Moderate,
    Poor,
}

impl Severity {
    /// Band a raw gas/air reading
    pub fn band(reading: u32) -> Self {
        if reading < SEVERITY_MODERATE {
            Severity::Good
        } else if reading < SEVERITY_POOR {
            Severity::Moderate
        } else {
            Severity::Poor
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::record::RawRecord;

    fn record_at(now: DateTime<Utc>, age: Duration) -> SensorRecord {
        SensorRecord::from_raw(
            RawRecord {
                timestamp: Some(now - age),
                ..RawRecord::default()
            },
            now,
        )
    }

    #[test]
    fn test_energy_usage_bands() {
        // One hour active vs standby
        assert_eq!(energy_usage_wh(true, 60.0), 50.0);
        assert_eq!(energy_usage_wh(false, 60.0), 5.0);
        // Prorated over a 5-second status tick
        let tick = energy_usage_wh(true, 5.0 / 60.0);
        assert!((tick - 50.0 / 720.0).abs() < 1e-9);
    }

    #[test]
    fn test_filter_by_period() {
        let now = Utc::now();
        let records = vec![
            record_at(now, Duration::hours(1)),
            record_at(now, Duration::days(3)),
            record_at(now, Duration::days(12)),
        ];

        assert_eq!(filter_by_period(&records, Period::Day, now).len(), 1);
        assert_eq!(filter_by_period(&records, Period::Week, now).len(), 2);
        assert_eq!(filter_by_period(&records, Period::Month, now).len(), 3);
    }

    #[test]
    fn test_severity_bands() {
        assert_eq!(Severity::band(0), Severity::Good);
        assert_eq!(Severity::band(1_999), Severity::Good);
        assert_eq!(Severity::band(2_000), Severity::Moderate);
        assert_eq!(Severity::band(2_999), Severity::Moderate);
        assert_eq!(Severity::band(3_000), Severity::Poor);
    }
}
