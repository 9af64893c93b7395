//! Emergency recording subsystem
//!
//! The panic-triggered state machine and its descriptors.

pub mod emergency;
pub mod state;

pub use emergency::EmergencyRecorder;
pub use state::{RecordingInfo, RecordingPhase};
