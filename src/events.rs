//! Control identity and event model
//!
//! Every physical control on the surface has a `ControlId`; everything the
//! user does to one arrives as a `ControlEvent`. Both are small immutable
//! values created by the protocol codec (or a test) and consumed once by the
//! engine.

use std::fmt;
use std::time::Instant;

/// Identifies one physical control on the surface.
///
/// The variant carries the control's category, so dispatch never has to
/// parse id strings. The textual form (`encoder_3`, `button_12`, ...) is
/// stable and used as the key in profile documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ControlId {
    /// Rotary encoder 1-8 (relative)
    Encoder(u8),
    /// The secondary speed-dial encoder (relative)
    SpeedDial,
    /// The crossfader (absolute)
    Crossfader,
    /// Momentary button 1-16
    Button(u8),
    /// The button under the speed dial
    SpeedDialButton,
}

impl ControlId {
    /// All controls in a stable order (encoders, speed dial, crossfader,
    /// buttons, speed-dial button). Used to build default mappings and to
    /// walk the surface during a resync.
    pub fn all() -> impl Iterator<Item = ControlId> {
        (1..=8)
            .map(ControlId::Encoder)
            .chain([ControlId::SpeedDial, ControlId::Crossfader])
            .chain((1..=16).map(ControlId::Button))
            .chain([ControlId::SpeedDialButton])
    }

    /// Parse the textual form back into an id. Returns `None` for anything
    /// that is not a known control.
    pub fn parse(s: &str) -> Option<ControlId> {
        match s {
            "speed_dial" => return Some(ControlId::SpeedDial),
            "crossfader" => return Some(ControlId::Crossfader),
            "button_speed_dial" => return Some(ControlId::SpeedDialButton),
            _ => {}
        }
        if let Some(n) = s.strip_prefix("encoder_") {
            let n: u8 = n.parse().ok()?;
            if (1..=8).contains(&n) {
                return Some(ControlId::Encoder(n));
            }
        }
        if let Some(n) = s.strip_prefix("button_") {
            let n: u8 = n.parse().ok()?;
            if (1..=16).contains(&n) {
                return Some(ControlId::Button(n));
            }
        }
        None
    }
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlId::Encoder(n) => write!(f, "encoder_{}", n),
            ControlId::SpeedDial => write!(f, "speed_dial"),
            ControlId::Crossfader => write!(f, "crossfader"),
            ControlId::Button(n) => write!(f, "button_{}", n),
            ControlId::SpeedDialButton => write!(f, "button_speed_dial"),
        }
    }
}

/// What the user did, by control category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Relative turn; delta is -64..=64 and never 0
    EncoderTurn { delta: i8 },
    ButtonPress,
    ButtonRelease,
    /// Absolute position 0-127
    CrossfaderMove { value: u8 },
}

/// One user action on one control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlEvent {
    pub id: ControlId,
    pub kind: EventKind,
    pub at: Instant,
}

impl ControlEvent {
    pub fn new(id: ControlId, kind: EventKind) -> Self {
        Self {
            id,
            kind,
            at: Instant::now(),
        }
    }

    pub fn turn(id: ControlId, delta: i8) -> Self {
        Self::new(id, EventKind::EncoderTurn { delta })
    }

    pub fn press(id: ControlId) -> Self {
        Self::new(id, EventKind::ButtonPress)
    }

    pub fn release(id: ControlId) -> Self {
        Self::new(id, EventKind::ButtonRelease)
    }

    pub fn fader(id: ControlId, value: u8) -> Self {
        Self::new(id, EventKind::CrossfaderMove { value })
    }
}
