//! Castbridge Sim - headless cast session simulator.
//!
//! Drives the cast session controller against an in-process simulated
//! renderer. Useful for exercising the session logic, the DLNA poller and
//! event delivery without any device on the network.

mod config;
mod renderer;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use castbridge_core::{
    BroadcastEventBridge, CastController, CastEvent, CastProtocol, LoggingEventEmitter,
    TokioSpawner, TrackMetadata,
};
use clap::Parser;
use tokio::signal;
use tokio::sync::broadcast;

use crate::config::SimConfig;
use crate::renderer::SimulatedRenderer;

/// Castbridge Sim - scripted cast session against a simulated renderer.
#[derive(Parser, Debug)]
#[command(name = "castbridge-sim")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (YAML).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(short, long, default_value = "info", env = "CASTBRIDGE_LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// Protocol to connect with (overrides config file).
    #[arg(short = 'p', long)]
    protocol: Option<CastProtocol>,

    /// Track length in seconds (overrides config file).
    #[arg(short = 'd', long)]
    duration: Option<f64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .init();

    log::info!("Castbridge Sim v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config =
        SimConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    // Apply CLI overrides
    if let Some(protocol) = args.protocol {
        config.protocol = protocol;
    }
    if let Some(duration) = args.duration {
        config.track_duration_secs = duration;
    }

    log::info!(
        "Configuration: protocol={}, track_duration={}s, poll_interval={}ms",
        config.protocol,
        config.track_duration_secs,
        config.poll_interval_ms
    );

    let cast_config = config.to_cast_config();
    cast_config
        .validate()
        .context("Invalid controller configuration")?;

    let renderer = Arc::new(SimulatedRenderer::new(config.fail_commands.clone()));
    let bridge = BroadcastEventBridge::new(cast_config.event_channel_capacity);
    bridge.set_external_emitter(Arc::new(LoggingEventEmitter));
    let events = bridge.subscribe();

    let controller = CastController::new(
        renderer.clone(),
        Arc::new(bridge),
        Arc::new(TokioSpawner::current()),
        cast_config,
    )
    .context("Failed to create cast controller")?;

    let _subscription = controller.subscribe(|session| {
        log::info!(
            "Session: connected={} playing={} track={:?} position={:.1}/{:.1}s",
            session.is_connected,
            session.is_playing,
            session.current_track_id,
            session.position_secs,
            session.duration_secs
        );
    });

    tokio::select! {
        result = run_script(&controller, &config, events) => result?,
        _ = shutdown_signal() => log::info!("Shutdown signal received, cleaning up..."),
    }

    controller.disconnect().await;
    log::info!("Renderer volume at exit: {:.2}", renderer.volume());
    log::info!("Shutdown complete");
    Ok(())
}

/// Connects, casts one track and walks through the transport commands.
async fn run_script(
    controller: &CastController,
    config: &SimConfig,
    mut events: broadcast::Receiver<CastEvent>,
) -> Result<()> {
    controller
        .connect_to_device(config.device(), config.protocol)
        .await
        .context("Failed to connect to simulated renderer")?;

    let metadata = TrackMetadata {
        title: "Simulated Track".to_string(),
        artist: "Castbridge".to_string(),
        album: "Sessions".to_string(),
        artwork_url: None,
        duration_secs: Some(config.track_duration_secs),
    };
    controller
        .cast_track(1, metadata)
        .await
        .context("Failed to cast track")?;

    let step = Duration::from_secs(2);

    tokio::time::sleep(step).await;
    controller.cast_pause().await;

    tokio::time::sleep(step).await;
    controller.cast_play().await;

    controller.cast_seek(config.track_duration_secs / 2.0).await;
    controller.cast_set_volume(config.volume_percent).await;

    match track_end_deadline(config.track_duration_secs) {
        Some(deadline) if controller.is_polling() => {
            log::info!("Waiting for the renderer to report the end of the track");
            if !wait_for_track_end(&mut events, deadline).await {
                log::warn!("No end of track reported within {:?}, stopping", deadline);
                controller.cast_stop().await;
            }
        }
        _ => {
            // Nothing reports the end of the track without polling and a duration.
            tokio::time::sleep(step).await;
            controller.cast_stop().await;
        }
    }

    let position = controller.cast_position();
    log::info!(
        "Final position: {:.1}/{:.1}s",
        position.position_secs,
        position.duration_secs
    );
    Ok(())
}

/// Extra time granted past the track duration for the renderer to report
/// its end.
const TRACK_END_GRACE: Duration = Duration::from_secs(10);

/// How long to wait for the end of a track of `duration_secs`, if it can end.
fn track_end_deadline(duration_secs: f64) -> Option<Duration> {
    if !duration_secs.is_finite() || duration_secs <= 0.0 {
        return None;
    }
    let duration = Duration::try_from_secs_f64(duration_secs).ok()?;
    Some(duration + TRACK_END_GRACE)
}

/// Returns `true` once a `TrackEnded` event arrives, `false` on timeout or
/// when the event channel closes.
async fn wait_for_track_end(
    events: &mut broadcast::Receiver<CastEvent>,
    deadline: Duration,
) -> bool {
    let wait = async {
        loop {
            match events.recv().await {
                Ok(CastEvent::TrackEnded { track_id, .. }) => {
                    log::info!("Track {:?} finished", track_id);
                    return true;
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::warn!("Event receiver lagged, skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return false,
            }
        }
    };
    tokio::time::timeout(deadline, wait).await.unwrap_or(false)
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
