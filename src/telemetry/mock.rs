//! Synthetic sensor data for demo mode
//!
//! Generates batches that look like several days of real site traffic:
//! records spaced hours apart, a light level following the local day/night
//! cycle, and independent draws for every other field. Demo batches never
//! carry a panic flag.

use chrono::{DateTime, Duration, Local, Timelike, Utc};
use rand::Rng;

use super::record::{SensorRecord, WindowState};

/// Local hours treated as daytime for the light sensor.
const DAYTIME_HOURS: std::ops::RangeInclusive<u32> = 6..=18;

/// Generate `count` synthetic records, newest first
pub fn synthetic_batch(count: usize) -> Vec<SensorRecord> {
    let mut rng = rand::thread_rng();
    let base = Local::now();
    let mut hours_offset: i64 = 0;
    let mut records = Vec::with_capacity(count);

    for _ in 0..count {
        let local_ts = base - Duration::hours(hours_offset);
        records.push(synthetic_record(local_ts.with_timezone(&Utc), local_ts.hour(), &mut rng));
        // Successive records drift 2-6 hours further into the past.
        hours_offset += rng.gen_range(2..=6);
    }

    records
}

fn synthetic_record(timestamp: DateTime<Utc>, local_hour: u32, rng: &mut impl Rng) -> SensorRecord {
    let ldr = if DAYTIME_HOURS.contains(&local_hour) {
        rng.gen_range(2_000..=4_000)
    } else {
        rng.gen_range(100..=500)
    };

    SensorRecord {
        timestamp,
        smoke: Some(rng.gen_range(500..=3_500)),
        air: Some(rng.gen_range(800..=3_000)),
        ldr: Some(ldr),
        motion_detected: rng.gen_bool(0.3),
        rain: rng.gen_bool(0.1),
        window: if rng.gen_bool(0.8) {
            WindowState::Closed
        } else {
            WindowState::Open
        },
        panic: false,
        emergency: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_batch_size_and_ordering() {
        let batch = synthetic_batch(50);
        assert_eq!(batch.len(), 50);
        for pair in batch.windows(2) {
            assert!(pair[0].timestamp > pair[1].timestamp);
        }
    }

    #[test]
    fn test_batch_spans_multiple_days() {
        let batch = synthetic_batch(50);
        let span = batch.first().unwrap().timestamp - batch.last().unwrap().timestamp;
        // At least 2 hours between records guarantees > 4 days over 50.
        assert!(span > Duration::days(2));
    }

    #[test]
    fn test_diurnal_light_bands() {
        for record in synthetic_batch(100) {
            let local_hour = record.timestamp.with_timezone(&Local).hour();
            let ldr = record.ldr.unwrap();
            if DAYTIME_HOURS.contains(&local_hour) {
                assert!((2_000..=4_000).contains(&ldr), "daytime ldr {ldr}");
            } else {
                assert!((100..=500).contains(&ldr), "nighttime ldr {ldr}");
            }
        }
    }

    #[test]
    fn test_demo_data_never_panics() {
        for record in synthetic_batch(100) {
            assert!(!record.panic_active());
        }
    }
}
