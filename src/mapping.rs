//! MIDI mapping model
//!
//! A `Mapping` binds one physical control to one MIDI target with clamp
//! bounds and a display label. Mappings are immutable values: relabeling or
//! retargeting builds a new `Mapping`, so a table entry can never be mutated
//! through an alias held elsewhere (the functional overlay and the base
//! table may both reference the same binding).
//!
//! The enum spellings below are the wire spellings of the profile documents
//! (see `presets`), kept compatible with presets written by earlier
//! releases.

use serde::{Deserialize, Serialize};

/// What kind of MIDI (or reserved non-MIDI) target a mapping addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetKind {
    #[serde(rename = "MIDI_CC")]
    MidiCc,
    #[serde(rename = "MIDI_NOTE")]
    MidiNote,
    #[serde(rename = "MIDI_PITCHBEND")]
    MidiPitchBend,
    /// Reserved; never emitted by the engine.
    #[serde(rename = "KEYBOARD_SHORTCUT")]
    KeyboardShortcut,
}

/// Where a mapping sends its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingTarget {
    #[serde(rename = "type")]
    pub kind: TargetKind,
    /// MIDI channel 0-15
    #[serde(default)]
    pub channel: u8,
    /// CC number or note number, 0-127
    #[serde(default)]
    pub identifier: u8,
}

impl MappingTarget {
    pub fn cc(channel: u8, cc: u8) -> Self {
        Self {
            kind: TargetKind::MidiCc,
            channel,
            identifier: cc,
        }
    }

    pub fn note(channel: u8, note: u8) -> Self {
        Self {
            kind: TargetKind::MidiNote,
            channel,
            identifier: note,
        }
    }

    /// True when this target is a CC with the given controller number,
    /// regardless of channel. The learn-mode feedback pass matches on the
    /// controller number alone.
    pub fn matches_cc(&self, cc: u8) -> bool {
        self.kind == TargetKind::MidiCc && self.identifier == cc
    }

    /// Short human-readable form, used as the display label for mappings
    /// loaded from hardware profiles that carry no label of their own.
    pub fn describe(&self) -> String {
        match self.kind {
            TargetKind::MidiCc => format!("CC {}", self.identifier),
            TargetKind::MidiNote => format!("Note {}", self.identifier),
            TargetKind::MidiPitchBend => "Pitch Bend".to_string(),
            TargetKind::KeyboardShortcut => "Keystroke".to_string(),
        }
    }
}

/// How raw control values are interpreted before they reach the target.
///
/// `SwitchToggle` is carried as data for profile compatibility; the engine
/// passes buttons through as 127/0 and keeps no latched state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MappingMode {
    #[serde(rename = "ABSOLUTE")]
    Absolute,
    #[serde(rename = "RELATIVE_TWOS_COMP")]
    RelativeTwosComp,
    #[serde(rename = "RELATIVE_BINARY_OFFSET")]
    RelativeBinaryOffset,
    #[serde(rename = "RELATIVE_SIGNED_BIT")]
    RelativeSignedBit,
    #[serde(rename = "SWITCH_TOGGLE")]
    SwitchToggle,
    #[serde(rename = "SWITCH_MOMENTARY")]
    SwitchMomentary,
}

/// One control-to-target binding.
#[derive(Debug, Clone, PartialEq)]
pub struct Mapping {
    /// Display text. Starts as the target's short description; the
    /// functional overlay replaces it with the catalog label of the
    /// resolved function.
    pub label: String,
    pub target: MappingTarget,
    pub mode: MappingMode,
    pub min_val: u8,
    pub max_val: u8,
    pub enabled: bool,
}

impl Mapping {
    /// A mapping with the default mode and full 0-127 bounds.
    pub fn new(label: impl Into<String>, target: MappingTarget) -> Self {
        Self {
            label: label.into(),
            target,
            mode: MappingMode::Absolute,
            min_val: 0,
            max_val: 127,
            enabled: true,
        }
    }

    /// Same binding, different display label.
    pub fn with_label(&self, label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..self.clone()
        }
    }

    /// Same bounds and mode, different target (used when a learned binding
    /// replaces the target of an existing table entry).
    pub fn with_target(&self, target: MappingTarget) -> Self {
        Self {
            target,
            ..self.clone()
        }
    }

    /// Clamp an integrated value into this mapping's bounds.
    pub fn clamp(&self, value: i16) -> u8 {
        value.clamp(self.min_val as i16, self.max_val as i16) as u8
    }
}
