//! Novation Nocturn driver
//!
//! Handles USB HID communication with the Nocturn control surface.

pub mod io;
pub mod protocol;

use flume::{Receiver, Sender};
use hidapi::HidApi;
use tracing::info;

use crate::events::{ControlEvent, ControlId};
use io::SurfaceIoThread;

#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("Failed to initialize HID subsystem: {0}")]
    HidInit(#[source] hidapi::HidError),

    #[error("Nocturn not found ({vid:04x}:{pid:04x}) - is it plugged in?")]
    NotFound {
        vid: u16,
        pid: u16,
        #[source]
        source: hidapi::HidError,
    },

    #[error("Failed to spawn surface I/O thread: {0}")]
    Thread(#[source] std::io::Error),
}

/// Nocturn driver for hardware communication.
///
/// Owns the I/O thread and the channels in and out of it. The engine side
/// takes the event receiver once; LED senders can be cloned freely.
pub struct NocturnSurface {
    io: SurfaceIoThread,

    /// Decoded events from the device, handed out once
    event_rx: Option<Receiver<ControlEvent>>,

    /// LED updates toward the device
    led_tx: Sender<(ControlId, u8)>,
}

impl NocturnSurface {
    /// Open the Nocturn and start its I/O thread.
    pub fn connect() -> Result<Self, SurfaceError> {
        let api = HidApi::new().map_err(SurfaceError::HidInit)?;

        let device = api
            .open(protocol::VENDOR_ID, protocol::PRODUCT_ID)
            .map_err(|source| SurfaceError::NotFound {
                vid: protocol::VENDOR_ID,
                pid: protocol::PRODUCT_ID,
                source,
            })?;

        let name = device
            .get_product_string()
            .ok()
            .flatten()
            .unwrap_or_else(|| "Nocturn".to_string());
        info!("Connected to {} ({:04x}:{:04x})", name, protocol::VENDOR_ID, protocol::PRODUCT_ID);

        let (event_tx, event_rx) = flume::bounded(256);
        let (led_tx, led_rx) = flume::bounded(256);

        let io = SurfaceIoThread::spawn(device, event_tx, led_rx).map_err(SurfaceError::Thread)?;

        Ok(Self {
            io,
            event_rx: Some(event_rx),
            led_tx,
        })
    }

    /// Take the control event receiver (can only be taken once).
    pub fn take_event_receiver(&mut self) -> Option<Receiver<ControlEvent>> {
        self.event_rx.take()
    }

    /// Sender for LED updates.
    pub fn led_sender(&self) -> Sender<(ControlId, u8)> {
        self.led_tx.clone()
    }

    /// Whether the I/O thread is still running.
    pub fn is_alive(&self) -> bool {
        self.io.is_alive()
    }
}

/// Check whether a Nocturn is attached, without claiming it.
pub fn detect() -> bool {
    match HidApi::new() {
        Ok(api) => api
            .device_list()
            .any(|d| d.vendor_id() == protocol::VENDOR_ID && d.product_id() == protocol::PRODUCT_ID),
        Err(_) => false,
    }
}
