//! MIDI message types
//!
//! Parsing and encoding for the channel voice messages the gateway routes.

use std::fmt;

/// MIDI message types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    /// Note Off: channel (0-15), note (0-127), velocity (0-127)
    NoteOff { channel: u8, note: u8, velocity: u8 },

    /// Note On: channel (0-15), note (0-127), velocity (0-127)
    NoteOn { channel: u8, note: u8, velocity: u8 },

    /// Control Change: channel (0-15), cc (0-127), value (0-127)
    ControlChange { channel: u8, cc: u8, value: u8 },

    /// Pitch Bend: channel (0-15), value (0-16383, 14-bit)
    PitchBend { channel: u8, value: u16 },
}

impl MidiMessage {
    /// Parse a MIDI message from raw bytes.
    ///
    /// Returns `None` for truncated input and for message kinds the gateway
    /// does not route (system messages, aftertouch, program changes).
    pub fn parse(data: &[u8]) -> Option<Self> {
        let status = *data.first()?;

        // Running status would need state we don't keep
        if status < 0x80 {
            return None;
        }

        let message_type = status & 0xF0;
        let channel = status & 0x0F;

        match message_type {
            0x80 => {
                if data.len() < 3 {
                    return None;
                }
                Some(MidiMessage::NoteOff {
                    channel,
                    note: data[1] & 0x7F,
                    velocity: data[2] & 0x7F,
                })
            }
            0x90 => {
                // Note On with velocity 0 is a Note Off
                if data.len() < 3 {
                    return None;
                }
                let note = data[1] & 0x7F;
                let velocity = data[2] & 0x7F;

                if velocity == 0 {
                    Some(MidiMessage::NoteOff { channel, note, velocity: 0 })
                } else {
                    Some(MidiMessage::NoteOn { channel, note, velocity })
                }
            }
            0xB0 => {
                if data.len() < 3 {
                    return None;
                }
                Some(MidiMessage::ControlChange {
                    channel,
                    cc: data[1] & 0x7F,
                    value: data[2] & 0x7F,
                })
            }
            0xE0 => {
                if data.len() < 3 {
                    return None;
                }
                let lsb = (data[1] & 0x7F) as u16;
                let msb = (data[2] & 0x7F) as u16;
                Some(MidiMessage::PitchBend {
                    channel,
                    value: (msb << 7) | lsb,
                })
            }
            _ => None,
        }
    }

    /// Encode the message to MIDI bytes
    pub fn encode(&self) -> Vec<u8> {
        match *self {
            MidiMessage::NoteOff { channel, note, velocity } => {
                vec![0x80 | (channel & 0x0F), note & 0x7F, velocity & 0x7F]
            }
            MidiMessage::NoteOn { channel, note, velocity } => {
                vec![0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F]
            }
            MidiMessage::ControlChange { channel, cc, value } => {
                vec![0xB0 | (channel & 0x0F), cc & 0x7F, value & 0x7F]
            }
            MidiMessage::PitchBend { channel, value } => {
                let lsb = (value & 0x7F) as u8;
                let msb = ((value >> 7) & 0x7F) as u8;
                vec![0xE0 | (channel & 0x0F), lsb, msb]
            }
        }
    }

    /// Get the channel (0-15)
    pub fn channel(&self) -> u8 {
        match *self {
            MidiMessage::NoteOff { channel, .. }
            | MidiMessage::NoteOn { channel, .. }
            | MidiMessage::ControlChange { channel, .. }
            | MidiMessage::PitchBend { channel, .. } => channel,
        }
    }
}

impl fmt::Display for MidiMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MidiMessage::NoteOff { channel, note, velocity } => {
                write!(f, "NoteOff ch:{} n:{} v:{}", channel + 1, note, velocity)
            }
            MidiMessage::NoteOn { channel, note, velocity } => {
                write!(f, "NoteOn ch:{} n:{} v:{}", channel + 1, note, velocity)
            }
            MidiMessage::ControlChange { channel, cc, value } => {
                write!(f, "CC ch:{} cc:{} v:{}", channel + 1, cc, value)
            }
            MidiMessage::PitchBend { channel, value } => {
                write!(f, "PitchBend ch:{} v:{}", channel + 1, value)
            }
        }
    }
}

/// MIDI value conversion utilities
pub mod convert {
    /// Convert 14-bit value (0-16383) to 7-bit value (0-127)
    pub fn to_7bit(value_14bit: u16) -> u8 {
        ((value_14bit >> 7) & 0x7F) as u8
    }

    /// Convert 7-bit value (0-127) to 14-bit value so that 127 maps to the
    /// full-scale 16383
    pub fn to_14bit(value_7bit: u8) -> u16 {
        ((value_7bit as u16) << 7) | (value_7bit as u16)
    }
}

/// Format MIDI bytes as hex string for debugging
pub fn format_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
