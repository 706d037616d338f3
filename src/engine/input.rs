//! Surface event handling
//!
//! Navigation buttons are intercepted before anything else sees the event;
//! in particular they never update the learn target. Everything else flows
//! through the active mapping table.

use super::Engine;
use crate::events::{ControlEvent, ControlId, EventKind};
use crate::layout::{nav, ConsoleMode};

impl Engine {
    /// Entry point for one decoded surface event.
    pub fn handle_event(&mut self, event: ControlEvent) {
        if nav::is_nav(event.id) {
            self.handle_nav(event.id, event.kind);
            return;
        }

        // remember the touch even when unmapped, learn targets by it
        self.last_touched = Some(event.id);

        match event.kind {
            EventKind::EncoderTurn { delta } => self.handle_turn(event.id, delta),
            EventKind::ButtonPress => self.handle_button(event.id, 127),
            EventKind::ButtonRelease => self.handle_button(event.id, 0),
            EventKind::CrossfaderMove { value } => self.handle_fader(event.id, value),
        }
    }

    fn handle_nav(&mut self, id: ControlId, kind: EventKind) {
        let pressed = matches!(kind, EventKind::ButtonPress);

        match id {
            nav::SHIFT => {
                // acts on both edges, LED mirrors the held state
                self.shift_active = pressed;
                self.feedback
                    .on_value(nav::SHIFT, if pressed { 127 } else { 0 });
                self.resync_layout();
            }
            nav::PAGE_DOWN if pressed => {
                if self.page > 0 {
                    self.page -= 1;
                } else if self.mode == ConsoleMode::Dynamics {
                    // wrap backwards into the other mode's last page
                    self.mode = ConsoleMode::Eq;
                    self.page = ConsoleMode::Eq.last_page();
                } else {
                    return; // already at the very first page
                }
                self.resync_layout();
            }
            nav::PAGE_UP if pressed => {
                if self.page + 1 < self.mode.page_count() {
                    self.page += 1;
                } else if self.mode == ConsoleMode::Eq {
                    self.mode = ConsoleMode::Dynamics;
                    self.page = 0;
                } else {
                    return; // already at the very last page
                }
                self.resync_layout();
            }
            nav::MODE_EQ if pressed => {
                self.mode = ConsoleMode::Eq;
                self.page = 0;
                self.resync_layout();
            }
            nav::MODE_DYN if pressed => {
                self.mode = ConsoleMode::Dynamics;
                self.page = 0;
                self.resync_layout();
            }
            // releases of page/mode buttons are swallowed here
            _ => {}
        }
    }

    fn handle_turn(&mut self, id: ControlId, delta: i8) {
        let old = self.values.get(&id).copied().unwrap_or(0);

        let Some(mapping) = self.mapping_for(id) else {
            return;
        };
        let target = mapping.target;
        let new = mapping.clamp(old as i16 + delta as i16);

        // a delta that clamps to the same value is a complete no-op
        if new == old {
            return;
        }

        self.values.insert(id, new);
        if let Some(&function) = self.layout_functions.get(&id) {
            self.functional_values.insert(function, new);
        }

        self.emit(target, new);
        self.feedback.on_value(id, new);
    }

    /// Buttons are stateless pass-through: 127 on press, 0 on release, no
    /// value-cache integration.
    fn handle_button(&mut self, id: ControlId, value: u8) {
        let Some(mapping) = self.mapping_for(id) else {
            return;
        };
        let target = mapping.target;

        self.emit(target, value);
        self.feedback.on_value(id, value);
    }

    fn handle_fader(&mut self, id: ControlId, value: u8) {
        let Some(mapping) = self.mapping_for(id) else {
            return;
        };
        let target = mapping.target;

        // already absolute, no integration
        self.values.insert(id, value);
        if let Some(&function) = self.layout_functions.get(&id) {
            self.functional_values.insert(function, value);
        }
        self.emit(target, value);
        self.feedback.on_value(id, value);
    }
}
