//! DAW-facing MIDI ports
//!
//! The gateway presents itself to the DAW as a pair of MIDI ports: one the
//! DAW reads control messages from, one it can write feedback to. On unix
//! these are virtual ports other applications connect to directly; where
//! virtual ports are unavailable the configured port names are matched
//! against the system port list instead.

use anyhow::{Context, Result};
#[cfg(unix)]
use midir::os::unix::{VirtualInput, VirtualOutput};
use midir::{MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use tracing::{debug, info, warn};

use crate::config::MidiSettings;
use crate::engine::EngineHandle;
use crate::midi::{format_hex, MidiMessage};

pub const VIRTUAL_OUT_NAME: &str = "Nocturn Studio Out";
pub const VIRTUAL_IN_NAME: &str = "Nocturn Studio In";

/// Outbound MIDI seam. The engine only ever sees this trait; production
/// uses [`MidirOut`], tests record instead.
pub trait MidiOut: Send {
    fn send(&mut self, msg: &MidiMessage) -> Result<()>;
}

/// midir-backed output connection.
pub struct MidirOut {
    conn: MidiOutputConnection,
}

impl MidiOut for MidirOut {
    fn send(&mut self, msg: &MidiMessage) -> Result<()> {
        let data = msg.encode();
        self.conn
            .send(&data)
            .context("Failed to send MIDI message")?;
        debug!("Sent: {} | {}", format_hex(&data), msg);
        Ok(())
    }
}

/// Output for degraded mode when no port could be opened: log and discard.
pub struct NullOut;

impl MidiOut for NullOut {
    fn send(&mut self, msg: &MidiMessage) -> Result<()> {
        debug!("(no output port) {}", msg);
        Ok(())
    }
}

/// Open the port the DAW reads from.
pub fn open_output(settings: &MidiSettings) -> Result<MidirOut> {
    let midi_out = MidiOutput::new("Nocturn-GW-Out").context("Failed to create MIDI output")?;

    #[cfg(unix)]
    if settings.virtual_ports {
        info!("Creating virtual MIDI output '{}'", VIRTUAL_OUT_NAME);
        let conn = midi_out
            .create_virtual(VIRTUAL_OUT_NAME)
            .map_err(|e| anyhow::anyhow!("Failed to create virtual output port: {}", e))?;
        return Ok(MidirOut { conn });
    }

    #[cfg(not(unix))]
    if settings.virtual_ports {
        warn!("Virtual MIDI ports are not supported on this platform, matching port names instead");
    }

    let (port, name) = find_output_port(&midi_out, &settings.output_port)
        .ok_or_else(|| anyhow::anyhow!("Output port '{}' not found", settings.output_port))?;

    info!("Connecting to output port: {}", name);
    let conn = midi_out
        .connect(&port, "nocturn-gw")
        .map_err(|e| anyhow::anyhow!("Failed to connect to output port: {}", e))?;

    Ok(MidirOut { conn })
}

/// Open the port the DAW writes feedback to. Incoming messages go straight
/// into the engine queue from the transport callback; the connection must
/// be kept alive by the caller.
pub fn open_input(settings: &MidiSettings, handle: EngineHandle) -> Result<MidiInputConnection<()>> {
    let midi_in = MidiInput::new("Nocturn-GW-In").context("Failed to create MIDI input")?;

    #[cfg(unix)]
    if settings.virtual_ports {
        info!("Creating virtual MIDI input '{}'", VIRTUAL_IN_NAME);
        let conn = midi_in
            .create_virtual(
                VIRTUAL_IN_NAME,
                move |_timestamp, data, _| forward_inbound(&handle, data),
                (),
            )
            .map_err(|e| anyhow::anyhow!("Failed to create virtual input port: {}", e))?;
        return Ok(conn);
    }

    #[cfg(not(unix))]
    if settings.virtual_ports {
        warn!("Virtual MIDI ports are not supported on this platform, matching port names instead");
    }

    let (port, name) = find_input_port(&midi_in, &settings.input_port)
        .ok_or_else(|| anyhow::anyhow!("Input port '{}' not found", settings.input_port))?;

    info!("Connecting to input port: {}", name);
    let conn = midi_in
        .connect(
            &port,
            "nocturn-gw",
            move |_timestamp, data, _| forward_inbound(&handle, data),
            (),
        )
        .map_err(|e| anyhow::anyhow!("Failed to connect to input port: {}", e))?;

    Ok(conn)
}

/// Transport callback body: parse, forward, never block or panic.
fn forward_inbound(handle: &EngineHandle, data: &[u8]) {
    if let Some(message) = MidiMessage::parse(data) {
        handle.incoming_midi(message);
    } else {
        debug!("Unparsed inbound MIDI: {}", format_hex(data));
    }
}

/// List available MIDI input ports.
pub fn list_input_ports() -> Result<Vec<String>> {
    let midi_in = MidiInput::new("Nocturn-GW-Scanner")?;

    let mut port_names = Vec::new();
    for port in midi_in.ports() {
        if let Ok(name) = midi_in.port_name(&port) {
            port_names.push(name);
        }
    }

    Ok(port_names)
}

/// List available MIDI output ports.
pub fn list_output_ports() -> Result<Vec<String>> {
    let midi_out = MidiOutput::new("Nocturn-GW-Scanner")?;

    let mut port_names = Vec::new();
    for port in midi_out.ports() {
        if let Ok(name) = midi_out.port_name(&port) {
            port_names.push(name);
        }
    }

    Ok(port_names)
}

/// Case-insensitive substring match, forgiving about the suffixes some
/// backends append to port names.
fn matches_port(name: &str, pattern: &str) -> bool {
    !pattern.is_empty() && name.to_lowercase().contains(&pattern.to_lowercase())
}

fn find_input_port(midi_in: &MidiInput, pattern: &str) -> Option<(midir::MidiInputPort, String)> {
    for port in midi_in.ports() {
        if let Ok(name) = midi_in.port_name(&port) {
            if matches_port(&name, pattern) {
                debug!("Found port '{}' matching pattern '{}'", name, pattern);
                return Some((port, name));
            }
        }
    }
    None
}

fn find_output_port(
    midi_out: &MidiOutput,
    pattern: &str,
) -> Option<(midir::MidiOutputPort, String)> {
    for port in midi_out.ports() {
        if let Ok(name) = midi_out.port_name(&port) {
            if matches_port(&name, pattern) {
                debug!("Found port '{}' matching pattern '{}'", name, pattern);
                return Some((port, name));
            }
        }
    }
    None
}
