//! Nocturn wire protocol
//!
//! Report layout and LED addressing for the Novation Nocturn. The device
//! speaks a tiny vendor protocol over USB HID:
//!
//! Input reports (8 bytes, one event per report):
//!
//! | byte[1] code | control            | byte[2] raw value        |
//! |--------------|--------------------|--------------------------|
//! | 64..=71      | encoder 1-8        | biased relative delta    |
//! | 72           | crossfader         | absolute 0-127           |
//! | 74           | speed dial         | biased relative delta    |
//! | 81           | speed dial button  | >0 press, 0 release      |
//! | 112..=127    | button 1-16        | >0 press, 0 release      |
//!
//! Output packets are `[address, value]` pairs:
//!
//! | address  | LED                      |
//! |----------|--------------------------|
//! | 64..=71  | encoder ring 1-8         |
//! | 80       | speed dial ring          |
//! | 112..=127| button 1-16              |
//!
//! The device also accepts `[address, mode]` writes on 72..=79 and 81 during
//! init to put the encoder rings into plain fill mode. Those registers look
//! like an alternate encoder address table but are only honoured at init;
//! runtime ring updates go through 64..=71.

use crate::events::{ControlEvent, ControlId, EventKind};

/// Novation USB vendor id.
pub const VENDOR_ID: u16 = 0x1235;

/// Nocturn product id.
pub const PRODUCT_ID: u16 = 0x000A;

/// Input report size in bytes.
pub const REPORT_LEN: usize = 8;

/// Poll timeout for one read, in milliseconds.
pub const READ_TIMEOUT_MS: i32 = 10;

/// Packets written once after open: the magic wake-up sequence, then ring
/// mode for each encoder and the speed dial.
pub fn init_packets() -> Vec<Vec<u8>> {
    let mut packets = vec![vec![0x00, 0x00, 0xB0]];
    for reg in 72..=79u8 {
        packets.push(vec![reg, 0x01]);
    }
    packets.push(vec![81, 0x01]);
    packets
}

/// Decode one input report into a control event.
///
/// Short reports and unknown codes return `None`; both are ordinary
/// protocol noise and must never abort the read loop.
pub fn decode(report: &[u8]) -> Option<ControlEvent> {
    if report.len() < 3 {
        return None;
    }
    let code = report[1];
    let raw = report[2];

    match code {
        64..=71 => Some(ControlEvent::turn(
            ControlId::Encoder(code - 63),
            decode_delta(raw),
        )),
        72 => Some(ControlEvent::fader(ControlId::Crossfader, raw & 0x7F)),
        74 => Some(ControlEvent::turn(ControlId::SpeedDial, decode_delta(raw))),
        81 => Some(press_or_release(ControlId::SpeedDialButton, raw)),
        112..=127 => Some(press_or_release(ControlId::Button(code - 111), raw)),
        _ => None,
    }
}

fn press_or_release(id: ControlId, raw: u8) -> ControlEvent {
    if raw > 0 {
        ControlEvent::press(id)
    } else {
        ControlEvent::release(id)
    }
}

/// Decode the biased relative encoding the encoders use.
///
/// raw 0..=63 means a positive turn of `raw + 1` detents, raw 64..=127 a
/// negative turn of `raw - 128`. The +1 offset is asymmetric on purpose;
/// no raw value decodes to zero.
pub fn decode_delta(raw: u8) -> i8 {
    if raw < 64 {
        (raw + 1) as i8
    } else {
        (raw as i16 - 128) as i8
    }
}

/// LED ring / lamp address for a control, `None` for controls without one
/// (the crossfader is unlit).
pub fn led_address(id: ControlId) -> Option<u8> {
    match id {
        ControlId::Encoder(n) if (1..=8).contains(&n) => Some(63 + n),
        ControlId::Encoder(_) => None,
        ControlId::SpeedDial => Some(80),
        ControlId::Button(n) if (1..=16).contains(&n) => Some(111 + n),
        ControlId::Button(_) => None,
        ControlId::SpeedDialButton => None,
        ControlId::Crossfader => None,
    }
}

/// Encode an LED update as an `[address, value]` output packet.
pub fn led_packet(id: ControlId, value: u8) -> Option<[u8; 2]> {
    led_address(id).map(|addr| [addr, value & 0x7F])
}

/// Helper for tests and the REPL simulator: build the report the device
/// would send for a given code/value pair.
pub fn raw_report(code: u8, raw: u8) -> [u8; REPORT_LEN] {
    let mut report = [0u8; REPORT_LEN];
    report[1] = code;
    report[2] = raw;
    report
}
