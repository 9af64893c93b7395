//! Panic-triggered emergency recorder
//!
//! Edge-triggered state machine: a false→true transition of the panic flag
//! arms a bounded recording, a dedicated task samples the latest camera
//! frame at the playback rate, and a timer forces the recording closed
//! after the configured duration no matter what the trigger does. The
//! frame buffer is owned by whichever capture path is active and is
//! detached wholesale before encoding so a new arming cycle can never
//! touch frames already being saved.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::time::MissedTickBehavior;

use super::state::{RecordingInfo, RecordingPhase};
use crate::alerts::{AlertKind, AlertLog};
use crate::capture::frame::{Frame, FrameSlot};
use crate::config::RecorderConfig;
use crate::encode::VideoEncoder;

const ALERT_SOURCE_CAMERA: &str = "Emergency Camera";
const ALERT_SOURCE_PANIC: &str = "PANIC BUTTON";
const ALERT_SOURCE_SECURITY: &str = "Security System";

/// Per-recording capture task handles. A fresh pair is created for every
/// arming cycle so a stale task can never act on a newer recording.
struct CaptureSession {
    stop: Arc<AtomicBool>,
    /// Set by the capture task once it is actually sampling; until then the
    /// fallback path in `tick` keeps appending frames.
    confirmed: Arc<AtomicBool>,
}

struct RecorderState {
    phase: RecordingPhase,
    last_panic: bool,
    last_trigger: Option<Instant>,
    started_at: Option<Instant>,
    session: Option<CaptureSession>,
}

impl Default for RecorderState {
    fn default() -> Self {
        Self {
            phase: RecordingPhase::Idle,
            last_panic: false,
            last_trigger: None,
            started_at: None,
            session: None,
        }
    }
}

/// Emergency recording state machine
#[derive(Clone)]
pub struct EmergencyRecorder {
    state: Arc<Mutex<RecorderState>>,
    frames: Arc<Mutex<Vec<Frame>>>,
    slot: Arc<FrameSlot>,
    alerts: Arc<AlertLog>,
    encoder: Arc<dyn VideoEncoder>,
    config: Arc<RecorderConfig>,
}

impl EmergencyRecorder {
    pub fn new(
        slot: Arc<FrameSlot>,
        alerts: Arc<AlertLog>,
        encoder: Arc<dyn VideoEncoder>,
        config: RecorderConfig,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(RecorderState::default())),
            frames: Arc::new(Mutex::new(Vec::new())),
            slot,
            alerts,
            encoder,
            config: Arc::new(config),
        }
    }

    pub fn phase(&self) -> RecordingPhase {
        self.state.lock().phase
    }

    /// Feed the latest panic reading into the trigger evaluation.
    ///
    /// Only a false→true edge arms; sustained true never re-fires, and a
    /// second edge inside the cooldown window is suppressed.
    pub fn observe(&self, panic_active: bool) {
        let armed = {
            let mut state = self.state.lock();
            let edge = panic_active && !state.last_panic;
            state.last_panic = panic_active;

            let cooldown_active = state
                .last_trigger
                .map(|at| at.elapsed() < self.config.cooldown())
                .unwrap_or(false);

            if !edge || cooldown_active || state.phase != RecordingPhase::Idle {
                false
            } else {
                state.last_trigger = Some(Instant::now());
                state.phase = RecordingPhase::Armed;
                true
            }
        };

        if !armed {
            return;
        }

        tracing::warn!("panic detected, emergency protocol initiated");
        self.alerts.append(
            AlertKind::PanicButton,
            ALERT_SOURCE_PANIC,
            "EMERGENCY! Panic button activated",
        );
        self.alerts.append(
            AlertKind::Emergency,
            ALERT_SOURCE_SECURITY,
            "Emergency mode activated - window closed, alarm triggered",
        );

        // Armed → Capturing only with footage to capture; the alerts above
        // stand either way.
        if self.slot.latest().is_none() {
            tracing::warn!("no camera frame available, recording skipped");
            self.state.lock().phase = RecordingPhase::Idle;
            return;
        }

        self.begin_capture();
    }

    fn begin_capture(&self) {
        let session = CaptureSession {
            stop: Arc::new(AtomicBool::new(false)),
            confirmed: Arc::new(AtomicBool::new(false)),
        };
        let stop = session.stop.clone();
        let confirmed = session.confirmed.clone();

        {
            let mut state = self.state.lock();
            state.phase = RecordingPhase::Capturing;
            state.started_at = Some(Instant::now());
            state.session = Some(session);
        }
        self.frames.lock().clear();

        self.alerts.append(
            AlertKind::RecordingStarted,
            ALERT_SOURCE_CAMERA,
            &format!(
                "Auto-recording started due to panic button ({} seconds)",
                self.config.duration_secs
            ),
        );

        // Without a runtime the per-tick fallback in `tick` carries the
        // recording alone, at the host's cadence.
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("no async runtime, relying on poll-tick capture");
            return;
        };

        let recorder = self.clone();
        handle.spawn(async move { recorder.capture_task(stop, confirmed).await });

        let recorder = self.clone();
        let duration = self.config.duration();
        handle.spawn(async move {
            tokio::time::sleep(duration).await;
            // Encoding blocks; keep it off the runtime workers.
            let _ = tokio::task::spawn_blocking(move || recorder.stop()).await;
        });
    }

    /// Samples the latest frame at the playback rate until stopped
    async fn capture_task(&self, stop: Arc<AtomicBool>, confirmed: Arc<AtomicBool>) {
        confirmed.store(true, Ordering::SeqCst);
        let period = self
            .config
            .sample_interval()
            .max(std::time::Duration::from_millis(1));
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while !stop.load(Ordering::SeqCst) {
            interval.tick().await;
            if stop.load(Ordering::SeqCst) {
                break;
            }
            if let Some(frame) = self.slot.latest() {
                self.frames.lock().push(frame);
            }
        }

        confirmed.store(false, Ordering::SeqCst);
        tracing::debug!("capture task ended");
    }

    /// Host-cadence poll: fallback frame capture while no task is confirmed,
    /// and duration enforcement for runtime-less hosts.
    pub fn tick(&self) {
        let (confirmed, expired) = {
            let state = self.state.lock();
            if state.phase != RecordingPhase::Capturing {
                return;
            }
            let confirmed = state
                .session
                .as_ref()
                .map(|s| s.confirmed.load(Ordering::SeqCst))
                .unwrap_or(false);
            let expired = state
                .started_at
                .map(|at| at.elapsed() >= self.config.duration())
                .unwrap_or(false);
            (confirmed, expired)
        };

        if !confirmed {
            if let Some(frame) = self.slot.latest() {
                self.frames.lock().push(frame);
            }
        }

        if expired {
            self.stop();
        }
    }

    /// Close the active recording and persist it. No-op unless Capturing.
    pub fn stop(&self) {
        let frames = {
            let mut state = self.state.lock();
            if state.phase != RecordingPhase::Capturing {
                return;
            }
            state.phase = RecordingPhase::Saving;
            if let Some(session) = state.session.take() {
                session.stop.store(true, Ordering::SeqCst);
            }
            // Detach the buffer before any encoding starts; the next arming
            // cycle gets a clean one.
            std::mem::take(&mut *self.frames.lock())
        };

        tracing::info!(frames = frames.len(), "emergency recording stopped");
        self.save(frames);

        let mut state = self.state.lock();
        state.phase = RecordingPhase::Idle;
        state.started_at = None;
    }

    /// Poll the store at the host cadence: evaluate the panic trigger and
    /// run the fallback capture path until the stop flag is raised.
    pub async fn run_trigger_loop(
        &self,
        store: Arc<crate::store::StateStore>,
        stop: Arc<AtomicBool>,
        interval: std::time::Duration,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while !stop.load(Ordering::Relaxed) {
            ticker.tick().await;
            let panic_active = store
                .snapshot()
                .latest_record()
                .map(|r| r.panic_active())
                .unwrap_or(false);
            self.observe(panic_active);
            self.tick();
        }

        tracing::info!("trigger loop stopped");
    }

    fn save(&self, frames: Vec<Frame>) {
        if frames.is_empty() {
            self.alerts.append(
                AlertKind::RecordingError,
                ALERT_SOURCE_CAMERA,
                "No frames captured - ensure camera is enabled",
            );
            return;
        }

        if let Err(error) = std::fs::create_dir_all(&self.config.recordings_dir) {
            tracing::error!(%error, "cannot create recordings directory");
            self.alerts.append(
                AlertKind::RecordingError,
                ALERT_SOURCE_CAMERA,
                &format!("Failed to save: {error}"),
            );
            return;
        }

        let filename = format!("emergency_{}.mp4", Utc::now().format("%Y%m%d_%H%M%S"));
        let path = self.config.recordings_dir.join(&filename);

        match self.encoder.encode(&frames, self.config.fps, &path) {
            Ok(()) => {
                let info = RecordingInfo::new(filename.clone(), path, frames.len(), self.config.fps);
                self.alerts.push_recording(info);
                self.alerts.append(
                    AlertKind::RecordingSaved,
                    ALERT_SOURCE_CAMERA,
                    &format!("Recording saved: {filename}"),
                );
            }
            Err(error) => {
                tracing::error!(%error, "failed to encode emergency recording");
                self.alerts.append(
                    AlertKind::RecordingError,
                    ALERT_SOURCE_CAMERA,
                    &format!("Failed to save: {error}"),
                );
            }
        }
    }
}
