//! Inbound MIDI and learn mode
//!
//! One handler covers both concerns, and the order matters: a message that
//! is feedback for an existing mapping must be recognized first, so it can
//! never be mistaken for a new binding while learn mode is armed.

use tracing::{debug, info};

use super::Engine;
use crate::events::ControlId;
use crate::mapping::{Mapping, MappingTarget};
use crate::midi::MidiMessage;
use crate::presets::MappingSpec;

impl Engine {
    /// Handle one message from the DAW-facing input port.
    pub fn handle_incoming_midi(&mut self, msg: MidiMessage) {
        let MidiMessage::ControlChange { channel, cc, value } = msg else {
            debug!("Ignoring inbound {}", msg);
            return;
        };

        // Feedback pass: every enabled mapping on this CC number tracks the
        // incoming value, clamped into its own bounds.
        let matching: Vec<(ControlId, u8)> = self
            .active
            .iter()
            .filter(|(_, m)| m.enabled && m.target.matches_cc(cc))
            .map(|(&id, m)| (id, m.clamp(value as i16)))
            .collect();

        for &(id, clamped) in &matching {
            self.values.insert(id, clamped);
            if let Some(&function) = self.layout_functions.get(&id) {
                // keep the function's cache in step so the value survives
                // the next layout swap
                self.functional_values.insert(function, clamped);
            }
            self.feedback.on_value(id, clamped);
        }

        if !matching.is_empty() {
            return;
        }

        // Learn pass: unmatched CC + armed learn + a recorded touch makes a
        // new binding for the touched control.
        if self.learn_mode {
            if let Some(id) = self.last_touched {
                self.install_binding(id, MappingTarget::cc(channel, cc));
            }
        }
    }

    /// Replace the target of `id`'s mapping. Labels and bounds stay as they
    /// were; a control with no existing mapping gets a fresh one.
    ///
    /// Under a functional profile (`plugin_map` non-empty) a binding for a
    /// control carrying a resolved function belongs to that function, so it
    /// survives layout swaps and saves with the functional document. All
    /// other bindings go into both the active and base tables.
    fn install_binding(&mut self, id: ControlId, target: MappingTarget) {
        let active_mapping = match self.active.get(&id) {
            Some(existing) => existing.with_target(target),
            None => Mapping::new(target.describe(), target),
        };
        info!("Learned {} -> {}", id, target.describe());

        if !self.plugin_map.is_empty() {
            if let Some(&function) = self.layout_functions.get(&id) {
                self.plugin_map
                    .insert(function, MappingSpec::from_mapping(&active_mapping));
                self.active.insert(id, active_mapping);
                return;
            }
        }

        let base_mapping = match self.base.get(&id) {
            Some(existing) => existing.with_target(target),
            None => active_mapping.clone(),
        };
        self.active.insert(id, active_mapping);
        self.base.insert(id, base_mapping);

        if self.current_profile == "Global" {
            self.global_base = self.base.clone();
        }
    }

    pub fn learn_active(&self) -> bool {
        self.learn_mode
    }
}
