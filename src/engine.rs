//! Mapping and functional state engine
//!
//! Owns every piece of mutable gateway state: the mode/page/shift/learn
//! machine, hardware and functional value caches, the active mapping table
//! and the plugin parameter overlay. The engine is not safe for concurrent
//! mutation; exactly one consumer drives it, normally the actor in
//! [`actor`]. Everything it touches downstream (MIDI out, feedback sink)
//! is non-blocking, so producers never stall behind event handling.

pub mod actor;
mod input;
mod learn;
mod profiles;
mod resolve;
#[cfg(test)]
mod tests;

pub use actor::{EngineCommand, EngineHandle};

use std::collections::HashMap;
use std::time::Duration;

use tracing::warn;

use crate::daw::MidiOut;
use crate::events::ControlId;
use crate::feedback::FeedbackSink;
use crate::functions::ChannelFunction;
use crate::layout::ConsoleMode;
use crate::mapping::{Mapping, MappingTarget, TargetKind};
use crate::midi::{convert, MidiMessage};
use crate::presets::{MappingSpec, ProfileStore};

/// Profile names that never synthesize a default table.
const GENERIC_PROFILES: &[&str] = &["", "Global", "None"];

/// Snapshot of the console state, for status queries.
#[derive(Debug, Clone)]
pub struct EngineStatus {
    pub mode: &'static str,
    pub page: usize,
    pub page_count: usize,
    pub shift_active: bool,
    pub learn_mode: bool,
    pub profile: String,
    pub last_touched: Option<ControlId>,
}

pub struct Engine {
    // Console state machine
    mode: ConsoleMode,
    page: usize,
    shift_active: bool,
    learn_mode: bool,

    current_profile: String,
    last_touched: Option<ControlId>,

    /// Physical value per control, drives delta integration and LEDs
    values: HashMap<ControlId, u8>,

    /// Last value per channel function, survives mode/page swaps
    functional_values: HashMap<ChannelFunction, u8>,

    /// Current base table (Global or a loaded hardware profile)
    base: HashMap<ControlId, Mapping>,

    /// The Global table kept around so generic profile names can revert
    global_base: HashMap<ControlId, Mapping>,

    /// Effective table after the functional overlay
    active: HashMap<ControlId, Mapping>,

    /// Function bindings installed by a functional (plugin) profile
    plugin_map: HashMap<ChannelFunction, MappingSpec>,

    /// Function currently carried by each control in the active layout
    layout_functions: HashMap<ControlId, ChannelFunction>,

    store: ProfileStore,
    midi_out: Box<dyn MidiOut>,
    feedback: Box<dyn FeedbackSink>,

    /// Delay between successive feedback pushes during a full resync
    pacing: Duration,
}

impl Engine {
    pub fn new(
        store: ProfileStore,
        midi_out: Box<dyn MidiOut>,
        feedback: Box<dyn FeedbackSink>,
        pacing: Duration,
    ) -> Self {
        let values = ControlId::all().map(|id| (id, 0u8)).collect();
        let functional_values = ChannelFunction::ALL
            .iter()
            .map(|&f| (f, 64u8)) // center detent
            .collect();

        Self {
            mode: ConsoleMode::Eq,
            page: 0,
            shift_active: false,
            learn_mode: false,
            current_profile: "Global".to_string(),
            last_touched: None,
            values,
            functional_values,
            base: HashMap::new(),
            global_base: HashMap::new(),
            active: HashMap::new(),
            plugin_map: HashMap::new(),
            layout_functions: HashMap::new(),
            store,
            midi_out,
            feedback,
            pacing,
        }
    }

    /// Load the Global table (or synthesize one) and push the initial
    /// surface state.
    pub async fn initialize(&mut self) {
        self.base = match self.store.load("Global").await {
            Ok(Some(doc)) => profiles::table_from_doc(&doc),
            Ok(None) => profiles::default_table(),
            Err(e) => {
                warn!("Global profile unreadable, using defaults: {:#}", e);
                profiles::default_table()
            }
        };
        self.global_base = self.base.clone();

        self.rebuild_active();
        self.feedback.on_profile(&self.current_profile);
        self.resync_all_paced().await;
    }

    /// Arm or disarm learn mode. Persisting learned bindings is the
    /// caller's move (see [`Engine::save_current_profile`]).
    pub fn set_learn(&mut self, active: bool) {
        if self.learn_mode != active {
            self.learn_mode = active;
            self.feedback.on_learn(active);
        }
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            mode: self.mode.name(),
            page: self.page,
            page_count: self.mode.page_count(),
            shift_active: self.shift_active,
            learn_mode: self.learn_mode,
            profile: self.current_profile.clone(),
            last_touched: self.last_touched,
        }
    }

    /// Active table rows as (id, label, target description, value), for
    /// the console `mappings` listing.
    pub fn mapping_rows(&self) -> Vec<(ControlId, String, String, u8)> {
        let mut ids: Vec<ControlId> = self.active.keys().copied().collect();
        ids.sort();
        ids.into_iter()
            .map(|id| {
                let m = &self.active[&id];
                let value = self.values.get(&id).copied().unwrap_or(0);
                (id, m.label.clone(), m.target.describe(), value)
            })
            .collect()
    }

    fn status_line(&self) -> String {
        format!(
            "{} page {}/{}{}",
            self.mode.name(),
            self.page + 1,
            self.mode.page_count(),
            if self.shift_active { " [shift]" } else { "" }
        )
    }

    /// The active mapping for a control, ignoring disabled entries.
    fn mapping_for(&self, id: ControlId) -> Option<&Mapping> {
        self.active.get(&id).filter(|m| m.enabled)
    }

    /// Send one value to a mapping target. Errors are absorbed here; a
    /// failed send must never unwind into the event loop.
    fn emit(&mut self, target: MappingTarget, value: u8) {
        let msg = match target.kind {
            TargetKind::MidiCc => MidiMessage::ControlChange {
                channel: target.channel,
                cc: target.identifier,
                value,
            },
            TargetKind::MidiNote => {
                if value > 0 {
                    MidiMessage::NoteOn {
                        channel: target.channel,
                        note: target.identifier,
                        velocity: value,
                    }
                } else {
                    MidiMessage::NoteOff {
                        channel: target.channel,
                        note: target.identifier,
                        velocity: 0,
                    }
                }
            }
            TargetKind::MidiPitchBend => MidiMessage::PitchBend {
                channel: target.channel,
                value: convert::to_14bit(value),
            },
            TargetKind::KeyboardShortcut => {
                // accepted in profiles for compatibility, nothing to send
                return;
            }
        };

        if let Err(e) = self.midi_out.send(&msg) {
            warn!("MIDI send failed ({}): {:#}", msg, e);
        }
    }
}
