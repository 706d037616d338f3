//! Nocturn GW
//!
//! Gateway to drive DAW channel strips and plugins from the Novation
//! Nocturn control surface.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod config;
mod daw;
mod engine;
mod events;
mod feedback;
mod focus;
mod functions;
mod layout;
mod mapping;
mod midi;
mod nocturn;
mod paths;
mod presets;

use crate::config::AppConfig;
use crate::engine::{actor::EngineActor, Engine};
use crate::feedback::SurfaceFeedback;
use crate::focus::FocusWatcher;
use crate::nocturn::NocturnSurface;
use crate::paths::AppPaths;
use crate::presets::ProfileStore;

/// Nocturn Gateway - drive DAW channel strips from the Novation Nocturn
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (defaults to the detected app dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Profile to activate at startup (overrides the configured default)
    #[arg(short, long)]
    profile: Option<String>,

    /// List available MIDI ports and exit
    #[arg(long)]
    list_ports: bool,

    /// Disable the focus watcher
    #[arg(long)]
    no_focus: bool,

    /// Run without the hardware surface (REPL-driven simulation)
    #[arg(long)]
    no_device: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let paths = AppPaths::detect();
    paths.ensure_directories()?;

    let _log_guard = init_logging(&args.log_level, &paths)?;

    info!("Starting Nocturn GW (data dir: {})", paths.base_dir().display());

    if args.list_ports {
        print_ports();
        return Ok(());
    }

    let config_path = args.config.clone().unwrap_or_else(|| paths.config.clone());
    let config = AppConfig::load(&config_path).await?;
    info!("Configuration loaded from {}", config_path.display());

    run_app(args, config, paths).await?;

    info!("Nocturn GW shutdown complete");
    Ok(())
}

async fn run_app(args: Args, config: AppConfig, paths: AppPaths) -> Result<()> {
    // Hardware surface, or degraded mode when absent/disabled
    let mut surface = if args.no_device {
        info!("Surface disabled (--no-device), running in simulation mode");
        None
    } else if !nocturn::detect() {
        warn!("No Nocturn attached - continuing without a surface");
        None
    } else {
        match NocturnSurface::connect() {
            Ok(surface) => Some(surface),
            Err(e) => {
                warn!("{} - continuing without a surface", e);
                None
            }
        }
    };

    let led_tx = surface.as_ref().map(|s| s.led_sender());
    let feedback = SurfaceFeedback::new(led_tx);

    // DAW-facing output port; a missing port degrades to log-only
    let midi_out: Box<dyn daw::MidiOut> = match daw::open_output(&config.midi) {
        Ok(out) => Box::new(out),
        Err(e) => {
            warn!("{:#} - MIDI output disabled", e);
            Box::new(daw::NullOut)
        }
    };

    let profiles_dir = config
        .profiles
        .dir
        .clone()
        .unwrap_or_else(|| paths.profiles_dir.clone());
    let store = ProfileStore::new(profiles_dir);

    let engine = Engine::new(
        store,
        midi_out,
        Box::new(feedback),
        Duration::from_millis(config.surface.pacing_ms),
    );
    let handle = EngineActor::spawn(engine);

    // DAW-facing input port; the connection must stay alive for the callback
    let _midi_in = match daw::open_input(&config.midi, handle.clone()) {
        Ok(conn) => Some(conn),
        Err(e) => {
            warn!("{:#} - MIDI input disabled", e);
            None
        }
    };

    // Surface events into the engine queue
    if let Some(surface) = surface.as_mut() {
        if let Some(event_rx) = surface.take_event_receiver() {
            let surface_handle = handle.clone();
            tokio::spawn(async move {
                while let Ok(event) = event_rx.recv_async().await {
                    surface_handle.surface_event(event);
                }
                info!("Surface event stream ended");
            });
        }
    }

    let _focus = if args.no_focus || !config.focus.enabled {
        info!("Focus watcher disabled");
        None
    } else {
        Some(FocusWatcher::spawn(
            config.focus.command.clone(),
            Duration::from_millis(config.focus.interval_ms),
            handle.clone(),
        )?)
    };

    let startup_profile = args
        .profile
        .clone()
        .unwrap_or_else(|| config.profiles.default_profile.clone());
    if startup_profile != "Global" {
        handle.switch_profile(startup_profile);
    }

    info!("Ready");

    tokio::select! {
        result = cli::run_repl(handle.clone()) => {
            if let Err(e) = result {
                warn!("Console error: {:#}", e);
            }
            info!("Console closed, shutting down");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    handle.shutdown();
    Ok(())
}

/// Logging: stderr fmt layer plus a daily-rolling file in the logs dir.
/// The returned guard must live as long as the process so the non-blocking
/// writer flushes on exit.
fn init_logging(
    level: &str,
    paths: &AppPaths,
) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let file_appender = tracing_appender::rolling::daily(&paths.logs_dir, "nocturn-gw.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false),
        )
        .init();

    Ok(guard)
}

fn print_ports() {
    match daw::list_input_ports() {
        Ok(ports) => {
            println!("MIDI inputs:");
            for name in ports {
                println!("  {}", name);
            }
        }
        Err(e) => warn!("Cannot list input ports: {:#}", e),
    }
    match daw::list_output_ports() {
        Ok(ports) => {
            println!("MIDI outputs:");
            for name in ports {
                println!("  {}", name);
            }
        }
        Err(e) => warn!("Cannot list output ports: {:#}", e),
    }
}
