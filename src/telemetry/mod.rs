//! Telemetry subsystem
//!
//! Sensor record model, the remote fetch collaborator, the demo-mode
//! generator, and the acquisition loop that keeps the shared store fed.

pub mod acquisition;
pub mod fetch;
pub mod metrics;
pub mod mock;
pub mod record;

pub use acquisition::AcquisitionLoop;
pub use fetch::{FetchError, HttpDocumentStore, TelemetryFetcher};
pub use record::{RawRecord, SensorRecord, WindowState};
