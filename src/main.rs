//! sitewatch host process
//!
//! Wires the shared structures together, spawns the background loops, and
//! runs until interrupted. A presentation layer would poll the same
//! [`Dashboard`] handle this binary uses for its status log.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sitewatch::alerts::AlertLog;
use sitewatch::capture::{FrameProducer, FrameSlot, NokhwaBackend};
use sitewatch::config::AppConfig;
use sitewatch::encode::FfmpegEncoder;
use sitewatch::recorder::EmergencyRecorder;
use sitewatch::store::StateStore;
use sitewatch::telemetry::{AcquisitionLoop, HttpDocumentStore};
use sitewatch::Dashboard;

/// Cadence of the host's own poll loop (trigger evaluation, status log)
const HOST_TICK: Duration = Duration::from_secs(1);
/// Seconds between status log lines
const STATUS_LOG_SECS: u64 = 30;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sitewatch=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting sitewatch v{}", env!("CARGO_PKG_VERSION"));

    let config = match std::env::args().nth(1) {
        Some(path) => AppConfig::load(Path::new(&path))
            .with_context(|| format!("loading config from {path}"))?,
        None => AppConfig::default(),
    };

    let store = Arc::new(StateStore::new());
    let slot = Arc::new(FrameSlot::new());
    let alerts = Arc::new(AlertLog::new());

    store.update(|s| s.demo_mode = config.acquisition.demo_mode);

    // Acquisition loop
    let fetcher = Arc::new(HttpDocumentStore::new(&config.acquisition));
    let acquisition = Arc::new(AcquisitionLoop::new(
        store.clone(),
        fetcher,
        config.acquisition.clone(),
    ));
    let acquisition_stop = acquisition.stop_flag();
    tokio::spawn({
        let acquisition = acquisition.clone();
        async move { acquisition.run().await }
    });

    // Frame producer
    let producer = Arc::new(FrameProducer::new(
        slot.clone(),
        alerts.clone(),
        Arc::new(NokhwaBackend),
        config.camera.clone(),
    ));
    if config.camera.enabled {
        producer.start();
    }

    // Emergency recorder, fed by the host poll loop
    let recorder = EmergencyRecorder::new(
        slot.clone(),
        alerts.clone(),
        Arc::new(FfmpegEncoder),
        config.recorder.clone(),
    );
    let trigger_stop = Arc::new(AtomicBool::new(false));
    tokio::spawn({
        let recorder = recorder.clone();
        let store = store.clone();
        let stop = trigger_stop.clone();
        async move { recorder.run_trigger_loop(store, stop, HOST_TICK).await }
    });

    // Status log standing in for an attached presentation layer
    let dashboard = Dashboard::new(store.clone(), slot.clone(), alerts.clone());
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(STATUS_LOG_SECS));
        loop {
            interval.tick().await;
            let stats = dashboard.acquisition_stats();
            tracing::info!(
                fetches = stats.fetch_counter,
                daily_reads = stats.daily_reads,
                quota_exceeded = stats.quota_exceeded,
                demo_mode = stats.demo_mode,
                records = stats.record_count,
                "acquisition status"
            );
        }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown requested");

    trigger_stop.store(true, Ordering::Relaxed);
    acquisition_stop.store(true, Ordering::Relaxed);
    recorder.stop();
    producer.stop();

    Ok(())
}
