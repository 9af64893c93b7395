//! Camera capture subsystem
//!
//! Frame hand-off, the capture-device seam, and the background producer.

pub mod device;
pub mod frame;
pub mod producer;

pub use device::{CaptureBackend, CaptureDevice, CaptureError, NokhwaBackend};
pub use frame::{Frame, FrameSlot};
pub use producer::FrameProducer;
