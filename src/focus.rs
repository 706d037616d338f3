//! Focus watcher
//!
//! Polls a configurable probe command for the focused window title and
//! reports changes to the engine as profile-name hints. The probe is an
//! external command (`xdotool getactivewindow getwindowname` by default),
//! which keeps the gateway free of per-platform window-system bindings.
//!
//! Probe failures are expected while no window manager is reachable; they
//! are logged once per change and the watcher keeps polling.

use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::engine::EngineHandle;

/// Handle to the focus watcher thread. Dropping it stops the poll loop.
pub struct FocusWatcher {
    shutdown: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl FocusWatcher {
    /// Spawn the watcher. `command` is split on whitespace into program and
    /// arguments; `interval` is the poll cadence.
    pub fn spawn(
        command: String,
        interval: Duration,
        engine: EngineHandle,
    ) -> std::io::Result<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        let handle = thread::Builder::new()
            .name("focus-watcher".to_string())
            .spawn(move || poll_loop(command, interval, engine, shutdown_clone))?;

        Ok(Self {
            shutdown,
            handle: Some(handle),
        })
    }
}

impl Drop for FocusWatcher {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn poll_loop(
    command: String,
    interval: Duration,
    engine: EngineHandle,
    shutdown: Arc<AtomicBool>,
) {
    info!("Focus watcher started ({})", command);
    let mut last: Option<String> = None;
    let mut probe_failed = false;

    while !shutdown.load(Ordering::Relaxed) {
        match probe(&command) {
            Ok(title) => {
                probe_failed = false;
                let name = normalize_app_name(&title);
                if last.as_deref() != Some(&name) {
                    debug!("Focus changed: '{}' -> profile '{}'", title, name);
                    last = Some(name.clone());
                    engine.focus_changed(name);
                }
            }
            Err(e) => {
                if !probe_failed {
                    warn!("Focus probe failed: {}", e);
                    probe_failed = true;
                }
            }
        }

        thread::sleep(interval);
    }

    info!("Focus watcher stopped");
}

/// Run the probe command and return the first line of its stdout.
fn probe(command: &str) -> std::io::Result<String> {
    let mut parts = command.split_whitespace();
    let program = parts.next().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty focus command")
    })?;

    let output = Command::new(program).args(parts).output()?;
    if !output.status.success() {
        return Err(std::io::Error::other(format!(
            "probe exited with {}",
            output.status
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout.lines().next().unwrap_or("").to_string())
}

/// Reduce a raw window title or process name to a stable profile key:
/// drop path components, a trailing `.exe`, and surrounding whitespace.
/// An empty result becomes `"None"`, which the engine treats as generic
/// and answers by reverting to Global.
pub fn normalize_app_name(raw: &str) -> String {
    let trimmed = raw.trim();
    let base = trimmed
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(trimmed)
        .trim();

    let name = match base.to_lowercase().strip_suffix(".exe") {
        Some(_) => &base[..base.len() - 4],
        None => base,
    };

    if name.is_empty() {
        "None".to_string()
    } else {
        name.to_string()
    }
}
