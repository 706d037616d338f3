//! Functional layout resolution
//!
//! Rebuilds the effective mapping table from the base table, the static
//! layout for the current (mode, page, shift), and the plugin parameter
//! overlay, then pushes the resulting labels and values back out.

use tokio::time::sleep;

use super::Engine;
use crate::events::ControlId;
use crate::layout::{self, nav, ConsoleMode};

impl Engine {
    /// Recompute the active table for the current console state.
    ///
    /// Every control in the merged layout gets the catalog label of its
    /// resolved function; controls with a plugin binding additionally get
    /// the binding's target and range. Mappings are replaced, never
    /// mutated, so the base table stays pristine underneath.
    ///
    /// Returns the controls whose meaning may have changed: the union of
    /// the previous layout and the new one.
    pub(super) fn rebuild_active(&mut self) -> Vec<ControlId> {
        let mut affected: Vec<ControlId> = self.layout_functions.keys().copied().collect();

        self.active = self.base.clone();
        self.layout_functions.clear();

        for (id, assignment) in layout::merged(self.mode, self.page) {
            let function = assignment.resolve(self.shift_active);
            self.layout_functions.insert(id, function);

            let mapping = match self.plugin_map.get(&function) {
                Some(binding) => binding.clone().into_mapping(function.label().to_string()),
                None => match self.base.get(&id) {
                    Some(base) => base.with_label(function.label()),
                    None => continue, // function shown but nothing to drive
                },
            };
            self.active.insert(id, mapping);

            if !affected.contains(&id) {
                affected.push(id);
            }
        }

        affected
    }

    /// Rebuild and push labels/values for the affected controls, plus the
    /// navigation LEDs and the status line. Used for shift/page/mode
    /// changes, where pacing is unnecessary.
    pub(super) fn resync_layout(&mut self) {
        let affected = self.rebuild_active();

        for id in affected {
            self.push_control(id);
        }

        self.push_nav_leds();
        let line = self.status_line();
        self.feedback.on_status(&line);
    }

    /// Full surface refresh: every control, paced so the hardware
    /// transport is not overrun. Used after profile switches and at
    /// startup.
    pub(super) async fn resync_all_paced(&mut self) {
        self.rebuild_active();

        let mut ids: Vec<ControlId> = ControlId::all().collect();
        ids.sort();
        for id in ids {
            self.push_control(id);
            if !self.pacing.is_zero() {
                sleep(self.pacing).await;
            }
        }

        self.push_nav_leds();
        let line = self.status_line();
        self.feedback.on_status(&line);
    }

    /// Push one control's label and cached value. A control carrying a
    /// function shows the functional cache, so a function's value follows
    /// it wherever it surfaces; the physical cache is left alone and keeps
    /// integrating from where the control last was.
    fn push_control(&mut self, id: ControlId) {
        let label = self.active.get(&id).map(|m| m.label.clone());
        if let Some(label) = label {
            self.feedback.on_label(id, &label);
        }

        let value = match self.layout_functions.get(&id) {
            Some(function) => self.functional_values.get(function).copied().unwrap_or(64),
            None => self.values.get(&id).copied().unwrap_or(0),
        };
        self.feedback.on_value(id, value);
    }

    /// Mode and shift buttons mirror the console state on their LEDs.
    fn push_nav_leds(&mut self) {
        let (eq, dyn_) = match self.mode {
            ConsoleMode::Eq => (127, 0),
            ConsoleMode::Dynamics => (0, 127),
        };
        self.feedback.on_value(nav::MODE_EQ, eq);
        self.feedback.on_value(nav::MODE_DYN, dyn_);
        self.feedback
            .on_value(nav::SHIFT, if self.shift_active { 127 } else { 0 });
    }
}
