//! Application path management for portable and installed modes.
//!
//! - **Portable mode**: a `.portable` marker file next to the executable
//!   keeps all data in that directory. Explicit opt-in, so a read-only
//!   install location is never written to by accident.
//! - **Installed mode** (default): data lives in the platform app-data
//!   directory (`%APPDATA%\Nocturn GW`, `~/.local/share/Nocturn GW`, ...).

use std::path::PathBuf;
use tracing::debug;

/// Application name used for directories in installed mode
const APP_NAME: &str = "Nocturn GW";

/// Resolved locations for config, profiles, and logs.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Path to the configuration file
    pub config: PathBuf,
    /// Directory holding profile documents
    pub profiles_dir: PathBuf,
    /// Directory for rolling log files
    pub logs_dir: PathBuf,
    /// Whether running in portable mode (data next to exe)
    pub is_portable: bool,
}

impl AppPaths {
    /// Detect the appropriate paths based on environment.
    ///
    /// Debug builds prefer a `config.yaml` in the current working directory
    /// so `cargo run` picks up the project's config directly. Otherwise the
    /// `.portable` marker decides between portable and installed mode.
    ///
    /// Called before logging is initialized, so early diagnostics go to
    /// stderr.
    pub fn detect() -> Self {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."));

        #[cfg(debug_assertions)]
        {
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            if cwd.join("config.yaml").exists() {
                eprintln!("[paths] DEV mode (config.yaml found in {})", cwd.display());
                return Self::rooted(cwd, true);
            }
        }

        if exe_dir.join(".portable").exists() {
            #[cfg(debug_assertions)]
            eprintln!("[paths] PORTABLE mode (.portable marker found)");
            return Self::rooted(exe_dir, true);
        }

        let app_data = dirs::data_dir()
            .unwrap_or_else(|| {
                eprintln!("[paths] WARNING: no platform data dir, falling back to exe dir");
                exe_dir
            })
            .join(APP_NAME);

        #[cfg(debug_assertions)]
        eprintln!("[paths] INSTALLED mode (data dir: {})", app_data.display());

        Self::rooted(app_data, false)
    }

    fn rooted(base: PathBuf, is_portable: bool) -> Self {
        Self {
            config: base.join("config.yaml"),
            profiles_dir: base.join("profiles"),
            logs_dir: base.join("logs"),
            is_portable,
        }
    }

    /// The base directory (for displaying in logs).
    pub fn base_dir(&self) -> PathBuf {
        self.config
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> anyhow::Result<()> {
        for dir in [&self.profiles_dir, &self.logs_dir] {
            if !dir.exists() {
                debug!("Creating directory: {}", dir.display());
                std::fs::create_dir_all(dir)?;
            }
        }

        if let Some(config_parent) = self.config.parent() {
            if !config_parent.exists() {
                std::fs::create_dir_all(config_parent)?;
            }
        }

        Ok(())
    }
}
