//! Configuration
//!
//! YAML configuration for the gateway: DAW-facing MIDI ports, surface
//! pacing, the focus watcher probe, and profile storage. A missing config
//! file is not an error; every field has a default so the gateway starts
//! useful out of the box.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub midi: MidiSettings,
    #[serde(default)]
    pub surface: SurfaceSettings,
    #[serde(default)]
    pub focus: FocusSettings,
    #[serde(default)]
    pub profiles: ProfileSettings,
}

/// DAW-facing MIDI port configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MidiSettings {
    /// Create virtual ports where the platform supports them; otherwise
    /// the port names below are matched against the system port list.
    #[serde(default = "default_true")]
    pub virtual_ports: bool,
    #[serde(default = "default_input_port")]
    pub input_port: String,
    #[serde(default = "default_output_port")]
    pub output_port: String,
}

/// Control surface tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SurfaceSettings {
    /// Delay between successive LED/value pushes during a full resync, in
    /// milliseconds. Keeps the USB transport from being overrun.
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
}

/// Focus watcher configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FocusSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Probe command printing the focused window title on its first line.
    #[serde(default = "default_focus_command")]
    pub command: String,
    #[serde(default = "default_focus_interval_ms")]
    pub interval_ms: u64,
}

/// Profile storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProfileSettings {
    /// Override for the profile directory; defaults to the app data dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    /// Profile activated at startup.
    #[serde(default = "default_profile")]
    pub default_profile: String,
}

impl Default for MidiSettings {
    fn default() -> Self {
        Self {
            virtual_ports: true,
            input_port: default_input_port(),
            output_port: default_output_port(),
        }
    }
}

impl Default for SurfaceSettings {
    fn default() -> Self {
        Self {
            pacing_ms: default_pacing_ms(),
        }
    }
}

impl Default for FocusSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            command: default_focus_command(),
            interval_ms: default_focus_interval_ms(),
        }
    }
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            dir: None,
            default_profile: default_profile(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file with validation. A missing file yields
    /// the defaults.
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: AppConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration for correctness and consistency.
    pub fn validate(&self) -> Result<()> {
        if !self.midi.virtual_ports {
            if self.midi.input_port.is_empty() {
                anyhow::bail!("MIDI input_port cannot be empty when virtual_ports is off");
            }
            if self.midi.output_port.is_empty() {
                anyhow::bail!("MIDI output_port cannot be empty when virtual_ports is off");
            }
        }

        if self.surface.pacing_ms > 100 {
            anyhow::bail!(
                "surface.pacing_ms of {} would make a full resync take seconds (max 100)",
                self.surface.pacing_ms
            );
        }

        if self.focus.enabled {
            if self.focus.command.trim().is_empty() {
                anyhow::bail!("focus.command cannot be empty while the focus watcher is enabled");
            }
            if self.focus.interval_ms < 100 {
                anyhow::bail!(
                    "focus.interval_ms of {} would poll too aggressively (min 100)",
                    self.focus.interval_ms
                );
            }
        }

        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_input_port() -> String {
    "Nocturn Studio In".to_string()
}

fn default_output_port() -> String {
    "Nocturn Studio Out".to_string()
}

fn default_pacing_ms() -> u64 {
    3
}

fn default_focus_command() -> String {
    "xdotool getactivewindow getwindowname".to_string()
}

fn default_focus_interval_ms() -> u64 {
    500
}

fn default_profile() -> String {
    "Global".to_string()
}
