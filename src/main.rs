//! Application entry point — SiteSync adaptive hearing protection.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`HeadsetConfig`] from disk (default on first run) and validate.
//! 3. Connect the UDP speech relay (fatal on failure — no partial start).
//! 4. Start the cpal playback stream, fed by the shared playback queue.
//! 5. Spawn the dashboard renderer thread on the telemetry channel.
//! 6. Build the [`PipelineOrchestrator`] around the spectral suppressor.
//! 7. Install the Ctrl+C handler, then start the cpal capture stream — the
//!    orchestrator runs inside its callback, one pass per assembled block.
//! 8. Park the main thread until Ctrl+C, then drop the stream handles so
//!    both cpal streams stop before the terminal is restored.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Context;

use sitesync::{
    audio::{new_playback_queue, AudioCapture, AudioPlayback},
    config::HeadsetConfig,
    pipeline::{telemetry_channel, OutputRouter, PipelineOrchestrator},
    relay::UdpRelay,
    suppress::SpectralGateSuppressor,
    ui::console,
};

/// Playback queue depth in blocks.  Two blocks of slack absorbs scheduler
/// jitter between the capture and playback callbacks without adding
/// noticeable latency.
const QUEUE_DEPTH_BLOCKS: usize = 2;

fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("SiteSync headset starting up");

    // 2. Configuration
    let config = HeadsetConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        HeadsetConfig::default()
    });
    config.validate().context("invalid configuration")?;

    // 3. Speech relay — a headset without its comms uplink must not start.
    let relay = UdpRelay::connect(&config.relay.host, config.relay.port)
        .with_context(|| {
            format!(
                "failed to open speech relay to {}:{}",
                config.relay.host, config.relay.port
            )
        })?;

    // 4. Playback stream
    let queue = new_playback_queue(config.audio.block_size * QUEUE_DEPTH_BLOCKS);
    let playback = AudioPlayback::new(config.audio.sample_rate)
        .context("no usable output device")?;
    let _playback_handle = playback
        .start(Arc::clone(&queue))
        .context("failed to start playback stream")?;
    log::info!("Playback stream started ({} Hz)", config.audio.sample_rate);

    // 5. Dashboard renderer thread
    let (telemetry, telemetry_rx) = telemetry_channel();
    let renderer = thread::Builder::new()
        .name("dashboard".into())
        .spawn(move || console::run(telemetry_rx))
        .context("failed to spawn dashboard thread")?;

    // 6. Pipeline
    let router = OutputRouter::new(Arc::clone(&queue), Some(Box::new(relay)));
    let mut orchestrator = PipelineOrchestrator::new(
        &config,
        Box::new(SpectralGateSuppressor::new()),
        router,
        telemetry,
    );

    // 7. Ctrl+C first, so a signal can never catch the dashboard with the
    //    cursor still hidden; then the capture stream.
    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || {
            running.store(false, Ordering::SeqCst);
        })
        .context("failed to install Ctrl+C handler")?;
    }

    let capture = AudioCapture::new(config.audio.sample_rate)
        .context("no usable input device")?;
    log::info!(
        "Capture stream starting ({} Hz, {} ch, block {})",
        config.audio.sample_rate,
        capture.channels(),
        config.audio.block_size
    );
    let capture_handle = capture
        .start(config.audio.block_size, move |block| {
            orchestrator.process_block(block);
        })
        .context("failed to start capture stream")?;

    // 8. Run until Ctrl+C
    console::enter_dashboard();
    while running.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(100));
    }

    // Stop capture first: dropping the stream closes the telemetry sender,
    // which lets the renderer thread drain and exit.
    drop(capture_handle);
    let _ = renderer.join();
    console::leave_dashboard();
    println!("CONNECTION TERMINATED.");

    Ok(())
}
