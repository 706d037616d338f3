//! Functional console layout
//!
//! Static tables deciding which channel-strip function each encoder
//! represents for a given (mode, page), plus the fixed overlay for controls
//! whose function never varies. The tables are fully specified at compile
//! time; runtime state (mode, page, shift) lives in the engine.

use crate::events::ControlId;
use crate::functions::ChannelFunction;

/// The two console modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleMode {
    Eq,
    Dynamics,
}

impl ConsoleMode {
    /// Name used in status reports and logs.
    pub fn name(self) -> &'static str {
        match self {
            ConsoleMode::Eq => "EQ",
            ConsoleMode::Dynamics => "DYNAMICS",
        }
    }

    pub fn page_count(self) -> usize {
        match self {
            ConsoleMode::Eq => EQ_PAGES.len(),
            ConsoleMode::Dynamics => DYN_PAGES.len(),
        }
    }

    pub fn last_page(self) -> usize {
        self.page_count() - 1
    }
}

/// What an encoder means on a page: a base function and an optional Shift
/// variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    pub base: ChannelFunction,
    pub shift: Option<ChannelFunction>,
}

impl Assignment {
    /// The function this assignment resolves to under the given shift state.
    pub fn resolve(&self, shift_active: bool) -> ChannelFunction {
        if shift_active {
            self.shift.unwrap_or(self.base)
        } else {
            self.base
        }
    }
}

const fn plain(base: ChannelFunction) -> Assignment {
    Assignment { base, shift: None }
}

const fn shifted(base: ChannelFunction, shift: ChannelFunction) -> Assignment {
    Assignment {
        base,
        shift: Some(shift),
    }
}

/// EQ page 0: the four bands across encoder pairs, Q on Shift of each
/// band's Freq encoder.
const EQ_PAGE_BANDS: &[(ControlId, Assignment)] = &[
    (
        ControlId::Encoder(1),
        shifted(ChannelFunction::EqLowFreq, ChannelFunction::EqLowQ),
    ),
    (ControlId::Encoder(2), plain(ChannelFunction::EqLowGain)),
    (
        ControlId::Encoder(3),
        shifted(ChannelFunction::EqLoMidFreq, ChannelFunction::EqLoMidQ),
    ),
    (ControlId::Encoder(4), plain(ChannelFunction::EqLoMidGain)),
    (
        ControlId::Encoder(5),
        shifted(ChannelFunction::EqHiMidFreq, ChannelFunction::EqHiMidQ),
    ),
    (ControlId::Encoder(6), plain(ChannelFunction::EqHiMidGain)),
    (
        ControlId::Encoder(7),
        shifted(ChannelFunction::EqHighFreq, ChannelFunction::EqHighQ),
    ),
    (ControlId::Encoder(8), plain(ChannelFunction::EqHighGain)),
];

/// EQ page 1: filters and master section.
const EQ_PAGE_FILTERS: &[(ControlId, Assignment)] = &[
    (ControlId::Encoder(1), plain(ChannelFunction::FilterHp)),
    (ControlId::Encoder(2), plain(ChannelFunction::FilterLp)),
    (
        ControlId::Encoder(3),
        shifted(ChannelFunction::InputGain, ChannelFunction::PhaseReverse),
    ),
    (
        ControlId::Encoder(4),
        shifted(ChannelFunction::OutputGain, ChannelFunction::Bypass),
    ),
];

/// Dynamics page 0: compressor.
const DYN_PAGE_COMP: &[(ControlId, Assignment)] = &[
    (ControlId::Encoder(1), plain(ChannelFunction::CompThreshold)),
    (ControlId::Encoder(2), plain(ChannelFunction::CompRatio)),
    (ControlId::Encoder(3), plain(ChannelFunction::CompAttack)),
    (ControlId::Encoder(4), plain(ChannelFunction::CompRelease)),
    (ControlId::Encoder(5), plain(ChannelFunction::CompGain)),
];

/// Dynamics page 1: gate.
const DYN_PAGE_GATE: &[(ControlId, Assignment)] = &[
    (ControlId::Encoder(1), plain(ChannelFunction::GateThreshold)),
    (ControlId::Encoder(2), plain(ChannelFunction::GateRange)),
    (ControlId::Encoder(3), plain(ChannelFunction::GateRelease)),
];

const EQ_PAGES: &[&[(ControlId, Assignment)]] = &[EQ_PAGE_BANDS, EQ_PAGE_FILTERS];
const DYN_PAGES: &[&[(ControlId, Assignment)]] = &[DYN_PAGE_COMP, DYN_PAGE_GATE];

/// Controls bound to the same function in every mode and page.
pub const FIXED: &[(ControlId, ChannelFunction)] =
    &[(ControlId::Crossfader, ChannelFunction::OutputGain)];

/// The assignments of one page, or `None` when the page does not exist in
/// that mode.
pub fn page(mode: ConsoleMode, page: usize) -> Option<&'static [(ControlId, Assignment)]> {
    let pages = match mode {
        ConsoleMode::Eq => EQ_PAGES,
        ConsoleMode::Dynamics => DYN_PAGES,
    };
    pages.get(page).copied()
}

/// Fixed overlay merged with the page table, page index clamped into the
/// mode's range. This is the set of controls the functional console owns in
/// the given state.
pub fn merged(mode: ConsoleMode, page_index: usize) -> Vec<(ControlId, Assignment)> {
    let mut out: Vec<(ControlId, Assignment)> =
        FIXED.iter().map(|&(id, f)| (id, plain(f))).collect();
    let clamped = page_index.min(mode.last_page());
    if let Some(entries) = page(mode, clamped) {
        out.extend_from_slice(entries);
    }
    out
}

/// Console navigation buttons. These are intercepted by the engine and
/// never reach ordinary mapping resolution.
pub mod nav {
    use crate::events::ControlId;

    pub const SHIFT: ControlId = ControlId::Button(9);
    pub const PAGE_DOWN: ControlId = ControlId::Button(10);
    pub const PAGE_UP: ControlId = ControlId::Button(11);
    pub const MODE_EQ: ControlId = ControlId::Button(15);
    pub const MODE_DYN: ControlId = ControlId::Button(16);

    pub fn is_nav(id: ControlId) -> bool {
        matches!(id, SHIFT | PAGE_DOWN | PAGE_UP | MODE_EQ | MODE_DYN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_counts() {
        assert_eq!(ConsoleMode::Eq.page_count(), 2);
        assert_eq!(ConsoleMode::Dynamics.page_count(), 2);
        assert!(page(ConsoleMode::Eq, 2).is_none());
        assert!(page(ConsoleMode::Dynamics, 2).is_none());
    }

    #[test]
    fn test_eq_bands_cover_all_encoders() {
        let entries = page(ConsoleMode::Eq, 0).unwrap();
        assert_eq!(entries.len(), 8);
        // Q variants sit on the Freq encoders only
        for (id, a) in entries {
            match id {
                ControlId::Encoder(n) if n % 2 == 1 => assert!(a.shift.is_some(), "{}", id),
                _ => assert!(a.shift.is_none(), "{}", id),
            }
        }
    }

    #[test]
    fn test_resolve_shift() {
        let a = shifted(ChannelFunction::EqLowFreq, ChannelFunction::EqLowQ);
        assert_eq!(a.resolve(false), ChannelFunction::EqLowFreq);
        assert_eq!(a.resolve(true), ChannelFunction::EqLowQ);

        let p = plain(ChannelFunction::CompRatio);
        assert_eq!(p.resolve(true), ChannelFunction::CompRatio);
    }

    #[test]
    fn test_merged_includes_fixed_overlay() {
        let merged = merged(ConsoleMode::Dynamics, 1);
        assert!(merged
            .iter()
            .any(|&(id, a)| id == ControlId::Crossfader
                && a.base == ChannelFunction::OutputGain));
        // gate page entries follow the overlay
        assert_eq!(merged.len(), 1 + 3);
    }

    #[test]
    fn test_merged_clamps_page() {
        // page index past the end behaves like the last page
        assert_eq!(
            merged(ConsoleMode::Eq, 99),
            merged(ConsoleMode::Eq, ConsoleMode::Eq.last_page())
        );
    }

    #[test]
    fn test_nav_ids_are_buttons_outside_layout() {
        for id in [
            nav::SHIFT,
            nav::PAGE_DOWN,
            nav::PAGE_UP,
            nav::MODE_EQ,
            nav::MODE_DYN,
        ] {
            assert!(nav::is_nav(id));
            assert!(matches!(id, ControlId::Button(_)));
        }
        assert!(!nav::is_nav(ControlId::Button(1)));
        assert!(!nav::is_nav(ControlId::Encoder(1)));
    }
}
