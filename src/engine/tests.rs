//! Engine behavior tests
//!
//! Exercised with the recording MIDI output and feedback sink, a tempdir
//! profile store, and zero resync pacing.

use std::time::Duration;

use super::profiles::default_table;
use super::Engine;
use crate::daw::recording::RecordingMidiOut;
use crate::events::{ControlEvent, ControlId};
use crate::feedback::recording::{Feedback, RecordingFeedback};
use crate::functions::ChannelFunction;
use crate::layout::{nav, ConsoleMode};
use crate::mapping::{MappingMode, MappingTarget};
use crate::midi::MidiMessage;
use crate::presets::{MappingSpec, ProfileDoc, ProfileStore};

struct Harness {
    engine: Engine,
    midi: RecordingMidiOut,
    feedback: RecordingFeedback,
    store: ProfileStore,
    _tmp: tempfile::TempDir,
}

/// Fresh engine over an empty store, initialized, with the startup
/// traffic drained from both recorders.
async fn harness() -> Harness {
    let tmp = tempfile::tempdir().unwrap();
    let store = ProfileStore::new(tmp.path());
    let midi = RecordingMidiOut::new();
    let feedback = RecordingFeedback::new();

    let mut engine = Engine::new(
        store.clone(),
        Box::new(midi.clone()),
        Box::new(feedback.clone()),
        Duration::ZERO,
    );
    engine.initialize().await;

    midi.take();
    feedback.take();

    Harness {
        engine,
        midi,
        feedback,
        store,
        _tmp: tmp,
    }
}

fn cc(channel: u8, cc: u8, value: u8) -> MidiMessage {
    MidiMessage::ControlChange { channel, cc, value }
}

fn spec_cc(channel: u8, identifier: u8) -> MappingSpec {
    MappingSpec::from_mapping(&crate::mapping::Mapping::new(
        "",
        MappingTarget::cc(channel, identifier),
    ))
}

#[tokio::test]
async fn test_encoder_turns_integrate_and_emit() {
    let mut h = harness().await;
    let enc1 = ControlId::Encoder(1);

    h.engine.handle_event(ControlEvent::turn(enc1, 5));
    h.engine.handle_event(ControlEvent::turn(enc1, 10));

    // default table: encoder 1 -> CC 10 on channel 0
    let sent = h.midi.take();
    assert_eq!(
        sent,
        vec![cc(0, 10, 5), cc(0, 10, 15)],
        "one message per effective change"
    );
    assert_eq!(sent[0].encode(), vec![0xB0, 10, 5]);
    assert_eq!(sent[1].encode(), vec![0xB0, 10, 15]);

    assert_eq!(h.engine.values[&enc1], 15);
    assert!(h.feedback.values().contains(&(enc1, 15)));
}

#[tokio::test]
async fn test_encoder_sequence_clamps_to_bounds() {
    let mut h = harness().await;
    let enc2 = ControlId::Encoder(2);

    let deltas: [i8; 6] = [40, 40, 40, 40, -7, 3];
    for d in deltas {
        h.engine.handle_event(ControlEvent::turn(enc2, d));
    }

    // clamp(sum) with running clamping: 40, 80, 120, 127, 120, 123
    assert_eq!(h.engine.values[&enc2], 123);
    let sent = h.midi.take();
    assert_eq!(sent.len(), 6);
    assert_eq!(sent[3], cc(0, 11, 127));

    // pinned at the bound: no change, no message
    h.engine.values.insert(enc2, 127);
    h.engine.handle_event(ControlEvent::turn(enc2, 12));
    assert!(h.midi.take().is_empty(), "clamped no-op must not emit");
    assert_eq!(h.engine.values[&enc2], 127);
}

#[tokio::test]
async fn test_button_press_release_note_bytes() {
    let mut h = harness().await;
    let button1 = ControlId::Button(1);

    h.engine.handle_event(ControlEvent::press(button1));
    h.engine.handle_event(ControlEvent::release(button1));

    // default table: button 1 -> note 40 on channel 0
    let sent = h.midi.take();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].encode(), vec![0x90, 40, 127]);
    assert_eq!(sent[1].encode(), vec![0x80, 40, 0]);

    // stateless pass-through: the value cache is not integrated
    assert_eq!(h.engine.values[&button1], 0);
    assert_eq!(h.feedback.values(), vec![(button1, 127), (button1, 0)]);
}

#[tokio::test]
async fn test_crossfader_is_absolute() {
    let mut h = harness().await;
    let fader = ControlId::Crossfader;

    h.engine.handle_event(ControlEvent::fader(fader, 99));
    h.engine.handle_event(ControlEvent::fader(fader, 3));

    assert_eq!(h.midi.take(), vec![cc(0, 19, 99), cc(0, 19, 3)]);
    assert_eq!(h.engine.values[&fader], 3);
    // the fixed overlay binds the crossfader to Output Gain
    assert_eq!(
        h.engine.functional_values[&ChannelFunction::OutputGain],
        3
    );
}

#[tokio::test]
async fn test_unmapped_control_only_tracks_touch() {
    let mut h = harness().await;
    let button3 = ControlId::Button(3);
    h.engine.base.remove(&button3);
    h.engine.active.remove(&button3);

    h.engine.handle_event(ControlEvent::press(button3));

    assert!(h.midi.take().is_empty());
    assert!(h.feedback.values().is_empty());
    assert_eq!(h.engine.last_touched, Some(button3));
}

#[tokio::test]
async fn test_nav_buttons_never_reach_mappings() {
    let mut h = harness().await;
    h.engine.last_touched = Some(ControlId::Encoder(1));

    h.engine.handle_event(ControlEvent::press(nav::MODE_DYN));
    h.engine.handle_event(ControlEvent::release(nav::MODE_DYN));

    assert_eq!(h.engine.mode, ConsoleMode::Dynamics);
    assert_eq!(h.engine.page, 0);
    assert!(h.midi.take().is_empty(), "mode buttons are fully intercepted");
    assert_eq!(
        h.engine.last_touched,
        Some(ControlId::Encoder(1)),
        "nav events never become learn targets"
    );
}

#[tokio::test]
async fn test_page_navigation_wraps_between_modes() {
    let mut h = harness().await;
    assert_eq!(h.engine.mode, ConsoleMode::Eq);
    assert_eq!(h.engine.page, 0);

    h.engine.handle_event(ControlEvent::press(nav::PAGE_UP));
    assert_eq!((h.engine.mode, h.engine.page), (ConsoleMode::Eq, 1));

    // from the last EQ page, up crosses into Dynamics page 0
    h.engine.handle_event(ControlEvent::press(nav::PAGE_UP));
    assert_eq!((h.engine.mode, h.engine.page), (ConsoleMode::Dynamics, 0));

    // and back down returns to the last EQ page
    h.engine.handle_event(ControlEvent::press(nav::PAGE_DOWN));
    assert_eq!(
        (h.engine.mode, h.engine.page),
        (ConsoleMode::Eq, ConsoleMode::Eq.last_page())
    );
}

#[tokio::test]
async fn test_page_navigation_stops_at_outer_edges() {
    let mut h = harness().await;

    // EQ page 0 is the very first page
    h.engine.handle_event(ControlEvent::press(nav::PAGE_DOWN));
    assert_eq!((h.engine.mode, h.engine.page), (ConsoleMode::Eq, 0));

    h.engine.handle_event(ControlEvent::press(nav::MODE_DYN));
    h.engine.handle_event(ControlEvent::press(nav::PAGE_UP));
    assert_eq!(
        (h.engine.mode, h.engine.page),
        (ConsoleMode::Dynamics, ConsoleMode::Dynamics.last_page())
    );

    // Dynamics last page is the very last page
    h.engine.handle_event(ControlEvent::press(nav::PAGE_UP));
    assert_eq!(
        (h.engine.mode, h.engine.page),
        (ConsoleMode::Dynamics, ConsoleMode::Dynamics.last_page())
    );
}

#[tokio::test]
async fn test_shift_swaps_function_and_label() {
    let mut h = harness().await;
    let enc1 = ControlId::Encoder(1);

    assert_eq!(h.engine.active[&enc1].label, "EQ Low Freq");

    h.engine.handle_event(ControlEvent::press(nav::SHIFT));
    assert!(h.engine.shift_active);
    assert_eq!(h.engine.active[&enc1].label, "EQ Low Q");
    // encoder 2 has no shift variant, base function stays
    assert_eq!(h.engine.active[&ControlId::Encoder(2)].label, "EQ Low Gain");

    h.engine.handle_event(ControlEvent::release(nav::SHIFT));
    assert!(!h.engine.shift_active);
    assert_eq!(h.engine.active[&enc1].label, "EQ Low Freq");

    // shift held state mirrored on its own LED
    let values = h.feedback.values();
    assert!(values.contains(&(nav::SHIFT, 127)));
    assert!(values.contains(&(nav::SHIFT, 0)));
}

#[tokio::test]
async fn test_functional_value_survives_page_swap() {
    let mut h = harness().await;
    let enc1 = ControlId::Encoder(1);

    h.engine.handle_event(ControlEvent::turn(enc1, 10));
    assert_eq!(
        h.engine.functional_values[&ChannelFunction::EqLowFreq],
        10
    );

    h.engine.handle_event(ControlEvent::press(nav::PAGE_UP));
    // encoder 1 now carries High Pass, whose cache is still centered
    assert_eq!(h.engine.layout_functions[&enc1], ChannelFunction::FilterHp);
    h.feedback.take();

    h.engine.handle_event(ControlEvent::press(nav::PAGE_DOWN));
    // back on the bands page the encoder shows Low Freq's cached value
    assert!(h.feedback.values().contains(&(enc1, 10)));
}

#[tokio::test]
async fn test_incoming_cc_is_feedback_not_learn() {
    let mut h = harness().await;
    let enc1 = ControlId::Encoder(1);

    // armed and touched, so only the matching pass may claim the message
    h.engine.set_learn(true);
    h.engine.handle_event(ControlEvent::turn(enc1, 3));
    h.midi.take();
    h.feedback.take();

    h.engine.handle_incoming_midi(cc(0, 10, 77));

    assert_eq!(h.engine.values[&enc1], 77);
    assert_eq!(h.engine.functional_values[&ChannelFunction::EqLowFreq], 77);
    assert!(h.feedback.values().contains(&(enc1, 77)));
    assert_eq!(
        h.engine.active[&enc1].target,
        MappingTarget::cc(0, 10),
        "a matched message must never be rebound"
    );
    assert!(h.midi.take().is_empty(), "inbound feedback is not echoed");
}

#[tokio::test]
async fn test_learn_binds_unmatched_cc_to_last_touch() {
    let mut h = harness().await;
    let button3 = ControlId::Button(3);

    h.engine.set_learn(true);
    h.engine.handle_event(ControlEvent::press(button3));
    h.engine.handle_event(ControlEvent::release(button3));

    // CC 99 is bound nowhere in the default table
    h.engine.handle_incoming_midi(cc(5, 99, 1));

    assert_eq!(h.engine.active[&button3].target, MappingTarget::cc(5, 99));
    assert_eq!(
        h.engine.base[&button3].target,
        MappingTarget::cc(5, 99),
        "learned bindings survive layout rebuilds"
    );
}

#[tokio::test]
async fn test_learn_requires_arm_and_touch() {
    let mut h = harness().await;
    let before = h.engine.active.clone();

    // armed but nothing touched yet
    h.engine.set_learn(true);
    h.engine.handle_incoming_midi(cc(0, 99, 1));
    assert_eq!(h.engine.active, before);

    // touched but not armed
    h.engine.set_learn(false);
    h.engine.handle_event(ControlEvent::press(ControlId::Button(4)));
    h.engine.handle_incoming_midi(cc(0, 99, 1));
    assert_eq!(h.engine.active, before);
}

#[tokio::test]
async fn test_learn_ignores_non_cc_messages() {
    let mut h = harness().await;
    h.engine.set_learn(true);
    h.engine.handle_event(ControlEvent::press(ControlId::Button(4)));
    let before = h.engine.active.clone();

    h.engine.handle_incoming_midi(MidiMessage::NoteOn {
        channel: 0,
        note: 99,
        velocity: 100,
    });

    assert_eq!(h.engine.active, before);
}

#[tokio::test]
async fn test_switch_profile_synthesizes_and_persists_default() {
    let mut h = harness().await;

    h.engine.switch_profile("TAL-U-NO-LX").await;

    assert_eq!(h.engine.current_profile, "TAL-U-NO-LX");
    assert_eq!(h.engine.base, default_table());

    // persisted immediately as the new baseline
    let doc = h.store.load("TAL-U-NO-LX").await.unwrap().unwrap();
    assert_eq!(doc.len(), ControlId::all().count());
    assert_eq!(doc["encoder_1"].target, MappingTarget::cc(0, 10));
    assert_eq!(doc["button_16"].target, MappingTarget::note(0, 55));

    assert!(h
        .feedback
        .take()
        .contains(&Feedback::Profile("TAL-U-NO-LX".to_string())));
}

#[tokio::test]
async fn test_switch_generic_name_reverts_to_global() {
    let mut h = harness().await;

    // teach Global a binding so the revert is observable
    h.engine.set_learn(true);
    h.engine.handle_event(ControlEvent::press(ControlId::Button(5)));
    h.engine.handle_incoming_midi(cc(2, 100, 1));
    h.engine.set_learn(false);

    h.engine.switch_profile("SomeSynth").await;
    assert_eq!(h.engine.base, default_table());

    h.engine.switch_profile("None").await;
    assert_eq!(h.engine.current_profile, "Global");
    assert_eq!(
        h.engine.base[&ControlId::Button(5)].target,
        MappingTarget::cc(2, 100)
    );

    // no file was ever written for the generic name
    assert!(h.store.load("None").await.unwrap().is_none());
}

#[tokio::test]
async fn test_switch_profile_functional_doc_overlays_global() {
    let mut h = harness().await;

    let mut doc = ProfileDoc::new();
    doc.insert("EQ_LOW_FREQ".to_string(), spec_cc(0, 80));
    h.store.save("Serum", &doc).await.unwrap();

    h.engine.switch_profile("Serum").await;

    let enc1 = &h.engine.active[&ControlId::Encoder(1)];
    assert_eq!(enc1.target, MappingTarget::cc(0, 80));
    assert_eq!(enc1.label, "EQ Low Freq");

    // functions without a plugin binding keep the Global target, relabeled
    let enc2 = &h.engine.active[&ControlId::Encoder(2)];
    assert_eq!(enc2.target, MappingTarget::cc(0, 11));
    assert_eq!(enc2.label, "EQ Low Gain");

    // the fixed overlay applies too
    let fader = &h.engine.active[&ControlId::Crossfader];
    assert_eq!(fader.label, "Output Gain");

    // the base table underneath is still the Global one
    assert_eq!(h.engine.base, h.engine.global_base);
}

#[tokio::test]
async fn test_switch_profile_hardware_doc_replaces_base() {
    let mut h = harness().await;

    let mut doc = ProfileDoc::new();
    doc.insert("encoder_1".to_string(), spec_cc(3, 42));
    h.store.save("OldDeck", &doc).await.unwrap();

    h.engine.switch_profile("OldDeck").await;

    assert_eq!(h.engine.base.len(), 1);
    let enc1 = &h.engine.active[&ControlId::Encoder(1)];
    assert_eq!(enc1.target, MappingTarget::cc(3, 42));
    assert_eq!(enc1.label, "EQ Low Freq", "layout relabels loaded mappings");
}

#[tokio::test]
async fn test_corrupt_profile_falls_back_to_global() {
    let mut h = harness().await;
    tokio::fs::write(h.store.path_for("Broken"), b"{not json")
        .await
        .unwrap();

    h.engine.switch_profile("Broken").await;

    assert_eq!(h.engine.current_profile, "Global");
    assert_eq!(h.engine.base, h.engine.global_base);
}

#[tokio::test]
async fn test_switch_to_current_profile_is_noop() {
    let mut h = harness().await;
    h.engine.switch_profile("Global").await;
    assert!(h.feedback.take().is_empty());
    assert!(h.midi.take().is_empty());
}

#[tokio::test]
async fn test_resync_pushes_every_control() {
    let mut h = harness().await;
    h.engine.resync_all_paced().await;

    let values = h.feedback.values();
    for id in ControlId::all() {
        assert!(
            values.iter().any(|&(pushed, _)| pushed == id),
            "resync skipped {}",
            id
        );
    }

    let events = h.feedback.take();
    assert!(events
        .iter()
        .any(|f| matches!(f, Feedback::Status(line) if line.contains("EQ"))));
    assert!(events
        .iter()
        .any(|f| matches!(f, Feedback::Label(id, label) if *id == ControlId::Encoder(1) && label == "EQ Low Freq")));
}

#[tokio::test]
async fn test_save_current_profile_writes_learned_binding() {
    let mut h = harness().await;

    h.engine.set_learn(true);
    h.engine.handle_event(ControlEvent::press(ControlId::Button(7)));
    h.engine.handle_incoming_midi(cc(1, 101, 1));
    h.engine.set_learn(false);

    h.engine.save_current_profile().await;

    let doc = h.store.load("Global").await.unwrap().unwrap();
    assert_eq!(doc["button_7"].target, MappingTarget::cc(1, 101));
}

#[tokio::test]
async fn test_profile_with_inverted_bounds_still_clamps() {
    let mut h = harness().await;
    let enc1 = ControlId::Encoder(1);

    // hand-edited document with min and max swapped
    let mut doc = ProfileDoc::new();
    doc.insert(
        "encoder_1".to_string(),
        MappingSpec {
            target: MappingTarget::cc(0, 30),
            mode: MappingMode::Absolute,
            min_val: 100,
            max_val: 50,
        },
    );
    h.store.save("BadSynth", &doc).await.unwrap();

    h.engine.switch_profile("BadSynth").await;
    let mapping = &h.engine.active[&enc1];
    assert_eq!((mapping.min_val, mapping.max_val), (50, 100));
    h.midi.take();

    h.engine.handle_event(ControlEvent::turn(enc1, 5));
    h.engine.handle_event(ControlEvent::turn(enc1, 100));

    assert_eq!(h.midi.take(), vec![cc(0, 30, 50), cc(0, 30, 100)]);
    assert_eq!(h.engine.values[&enc1], 100);
}

#[tokio::test]
async fn test_learn_under_functional_profile_binds_function() {
    let mut h = harness().await;
    let enc1 = ControlId::Encoder(1);

    let mut doc = ProfileDoc::new();
    doc.insert("EQ_LOW_GAIN".to_string(), spec_cc(0, 81));
    h.store.save("Serum", &doc).await.unwrap();
    h.engine.switch_profile("Serum").await;

    // encoder 1 carries EQ Low Freq; learn an unmatched CC onto it
    h.engine.set_learn(true);
    h.engine.handle_event(ControlEvent::turn(enc1, 3));
    h.engine.handle_incoming_midi(cc(4, 99, 1));
    h.engine.set_learn(false);

    assert_eq!(
        h.engine.plugin_map[&ChannelFunction::EqLowFreq].target,
        MappingTarget::cc(4, 99)
    );
    assert_eq!(h.engine.active[&enc1].target, MappingTarget::cc(4, 99));
    assert_eq!(
        h.engine.base[&enc1].target,
        MappingTarget::cc(0, 10),
        "the Global table underneath is untouched"
    );

    // saving writes the functional document, both bindings included
    h.engine.save_current_profile().await;
    let saved = h.store.load("Serum").await.unwrap().unwrap();
    assert_eq!(saved["EQ_LOW_FREQ"].target, MappingTarget::cc(4, 99));
    assert_eq!(saved["EQ_LOW_GAIN"].target, MappingTarget::cc(0, 81));

    // and the binding survives leaving and re-entering the profile
    h.engine.switch_profile("Global").await;
    h.engine.switch_profile("Serum").await;
    assert_eq!(h.engine.active[&enc1].target, MappingTarget::cc(4, 99));
}

#[tokio::test]
async fn test_inbound_feedback_clamps_into_bounds() {
    let mut h = harness().await;
    let enc1 = ControlId::Encoder(1);

    if let Some(m) = h.engine.active.get_mut(&enc1) {
        m.max_val = 100;
    }

    h.engine.handle_incoming_midi(cc(0, 10, 127));

    assert_eq!(h.engine.values[&enc1], 100);
    assert_eq!(h.engine.functional_values[&ChannelFunction::EqLowFreq], 100);
    assert!(h.feedback.values().contains(&(enc1, 100)));
}

#[tokio::test]
async fn test_disabled_mapping_is_inert() {
    let mut h = harness().await;
    let enc1 = ControlId::Encoder(1);

    if let Some(m) = h.engine.active.get_mut(&enc1) {
        m.enabled = false;
    }

    h.engine.handle_event(ControlEvent::turn(enc1, 5));
    assert!(h.midi.take().is_empty());
    assert_eq!(h.engine.values[&enc1], 0);
}

#[tokio::test]
async fn test_status_snapshot() {
    let mut h = harness().await;
    h.engine.handle_event(ControlEvent::press(nav::MODE_DYN));
    h.engine.handle_event(ControlEvent::press(nav::PAGE_UP));
    h.engine.set_learn(true);

    let status = h.engine.status();
    assert_eq!(status.mode, "DYNAMICS");
    assert_eq!(status.page, 1);
    assert_eq!(status.page_count, 2);
    assert!(status.learn_mode);
    assert!(!status.shift_active);
    assert_eq!(status.profile, "Global");
}
