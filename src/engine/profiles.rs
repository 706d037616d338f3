//! Profile switching and persistence
//!
//! Profiles arrive by name, usually from the focus watcher. Loading is
//! non-fatal in every branch: missing documents fall back to a synthesized
//! default or the cached Global table, corrupt ones to Global.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use super::{Engine, GENERIC_PROFILES};
use crate::events::ControlId;
use crate::functions::ChannelFunction;
use crate::mapping::{Mapping, MappingTarget};
use crate::presets::{self, MappingSpec, ProfileDoc};

/// The factory mapping table: encoders and faders on a contiguous CC block,
/// buttons on a contiguous note block, all on channel 0.
pub(super) fn default_table() -> HashMap<ControlId, Mapping> {
    let mut table = HashMap::new();

    for n in 1..=8u8 {
        let target = MappingTarget::cc(0, 9 + n); // CC 10..=17
        table.insert(ControlId::Encoder(n), Mapping::new(target.describe(), target));
    }

    let dial = MappingTarget::cc(0, 18);
    table.insert(ControlId::SpeedDial, Mapping::new(dial.describe(), dial));

    let fader = MappingTarget::cc(0, 19);
    table.insert(ControlId::Crossfader, Mapping::new(fader.describe(), fader));

    for n in 1..=16u8 {
        let target = MappingTarget::note(0, 39 + n); // Note 40..=55
        table.insert(ControlId::Button(n), Mapping::new(target.describe(), target));
    }

    let dial_button = MappingTarget::note(0, 56);
    table.insert(
        ControlId::SpeedDialButton,
        Mapping::new(dial_button.describe(), dial_button),
    );

    table
}

/// Build a runtime table from a hardware-indexed document. Keys that are
/// not control ids are skipped with a warning, not errors.
pub(super) fn table_from_doc(doc: &ProfileDoc) -> HashMap<ControlId, Mapping> {
    let mut table = HashMap::new();
    for (key, spec) in doc {
        match ControlId::parse(key) {
            Some(id) => {
                let label = spec.target.describe();
                table.insert(id, spec.clone().into_mapping(label));
            }
            None => warn!("Ignoring unknown control id '{}' in profile", key),
        }
    }
    table
}

fn plugin_map_from_doc(doc: &ProfileDoc) -> HashMap<ChannelFunction, MappingSpec> {
    doc.iter()
        .filter_map(|(key, spec)| ChannelFunction::from_key(key).map(|f| (f, spec.clone())))
        .collect()
}

impl Engine {
    /// Switch the active profile. Ends with a full paced resync in every
    /// branch that changes anything.
    pub async fn switch_profile(&mut self, name: &str) {
        if name == self.current_profile {
            return;
        }

        match self.store.load(name).await {
            Ok(Some(doc)) if presets::is_functional(&doc) => {
                // plugin profile: function bindings over the Global base
                info!("Loading functional profile '{}'", name);
                self.plugin_map = plugin_map_from_doc(&doc);
                self.base = self.global_base.clone();
                self.current_profile = name.to_string();
            }
            Ok(Some(doc)) => {
                info!("Loading hardware profile '{}'", name);
                self.base = table_from_doc(&doc);
                self.plugin_map.clear();
                self.current_profile = name.to_string();
                if name == "Global" {
                    self.global_base = self.base.clone();
                }
            }
            Ok(None) if GENERIC_PROFILES.contains(&name) => {
                debug!("No profile for generic name '{}', reverting to Global", name);
                self.base = self.global_base.clone();
                self.plugin_map.clear();
                self.current_profile = "Global".to_string();
            }
            Ok(None) => {
                // first sighting of a real target: give it the factory
                // table and persist it as its baseline right away
                info!("Synthesizing default profile for '{}'", name);
                self.base = default_table();
                self.plugin_map.clear();
                self.current_profile = name.to_string();

                let doc = presets::doc_from_mappings(&self.base);
                if let Err(e) = self.store.save(name, &doc).await {
                    warn!("Failed to persist default profile '{}': {:#}", name, e);
                }
            }
            Err(e) => {
                warn!("Profile '{}' unreadable, falling back to Global: {:#}", name, e);
                self.base = self.global_base.clone();
                self.plugin_map.clear();
                self.current_profile = "Global".to_string();
            }
        }

        self.feedback.on_profile(&self.current_profile);
        self.resync_all_paced().await;
    }

    /// Persist the current profile under its name. A functional profile
    /// saves its function bindings; a hardware profile saves the base table.
    /// Invoked explicitly, typically when learn mode is disarmed.
    pub async fn save_current_profile(&mut self) {
        let doc = if self.plugin_map.is_empty() {
            presets::doc_from_mappings(&self.base)
        } else {
            presets::doc_from_functions(&self.plugin_map)
        };
        match self.store.save(&self.current_profile, &doc).await {
            Ok(()) => {
                info!("Saved profile '{}'", self.current_profile);
                if self.current_profile == "Global" {
                    self.global_base = self.base.clone();
                }
            }
            Err(e) => warn!("Failed to save profile '{}': {:#}", self.current_profile, e),
        }
    }
}
