//! Camera frame producer
//!
//! Owns the capture device on a dedicated thread and publishes every frame
//! into the shared [`FrameSlot`]. Consumers never talk to the device; an
//! unavailable camera just means the slot stays empty. Start and stop are
//! idempotent and the stop signal is checked every loop iteration.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::Mutex;

use crate::alerts::{AlertKind, AlertLog};
use crate::capture::device::CaptureBackend;
use crate::capture::frame::FrameSlot;
use crate::config::CameraConfig;

/// Pause before retrying after a failed frame read.
const READ_BACKOFF: Duration = Duration::from_millis(50);

/// Single-instance background producer feeding [`FrameSlot`]
pub struct FrameProducer {
    slot: Arc<FrameSlot>,
    alerts: Arc<AlertLog>,
    backend: Arc<dyn CaptureBackend>,
    config: CameraConfig,
    running: Arc<AtomicBool>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl FrameProducer {
    pub fn new(
        slot: Arc<FrameSlot>,
        alerts: Arc<AlertLog>,
        backend: Arc<dyn CaptureBackend>,
        config: CameraConfig,
    ) -> Self {
        Self {
            slot,
            alerts,
            backend,
            config,
            running: Arc::new(AtomicBool::new(false)),
            thread: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Launch the capture loop. No-op if already running.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let running = self.running.clone();
        let slot = self.slot.clone();
        let alerts = self.alerts.clone();
        let backend = self.backend.clone();
        let config = self.config.clone();

        let handle = std::thread::spawn(move || {
            let mut device = match backend.open(&config) {
                Ok(device) => {
                    alerts.append(AlertKind::CameraOnline, "Camera", "capture device opened");
                    device
                }
                Err(error) => {
                    tracing::warn!(%error, "capture device unavailable, no frames will publish");
                    alerts.append(
                        AlertKind::CameraOffline,
                        "Camera",
                        &format!("open failed: {error}"),
                    );
                    running.store(false, Ordering::SeqCst);
                    return;
                }
            };

            let frame_interval = config.frame_interval();

            while running.load(Ordering::SeqCst) {
                match device.read_frame() {
                    Ok(frame) => {
                        slot.publish(frame);
                        std::thread::sleep(frame_interval);
                    }
                    Err(error) => {
                        // Keep the device; a single bad read is not a teardown.
                        tracing::debug!(%error, "frame read failed, backing off");
                        std::thread::sleep(READ_BACKOFF);
                    }
                }
            }

            tracing::info!("capture thread stopped");
            // Device handle released on drop.
        });

        *self.thread.lock() = Some(handle);
        tracing::info!(
            source = self.config.source,
            fps = self.config.fps,
            "frame producer started"
        );
    }

    /// Signal shutdown, join the capture thread, and clear the slot.
    /// No-op if not running.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        if let Some(handle) = self.thread.lock().take() {
            let _ = handle.join();
        }
        self.slot.clear();
        tracing::info!("frame producer stopped");
    }
}
