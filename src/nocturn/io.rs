//! Surface I/O thread
//!
//! Dedicated thread owning the HID device handle. Reads input reports,
//! decodes them into control events for the engine, and drains pending LED
//! updates into output packets. hidapi reads block with a timeout, so the
//! loop doubles as the write pump.

use flume::{Receiver, Sender};
use hidapi::HidDevice;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, error, info, warn};

use super::protocol;
use crate::events::{ControlEvent, ControlId};

/// Handle to the surface I/O thread.
///
/// Owns the join handle and a shutdown flag. Dropping it signals the thread
/// and waits for it to stop.
pub struct SurfaceIoThread {
    shutdown: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
    alive: Arc<AtomicBool>,
}

impl SurfaceIoThread {
    /// Spawn the I/O thread for an opened Nocturn.
    ///
    /// - `device`: hidapi handle, already opened
    /// - `event_tx`: decoded control events for the engine
    /// - `led_rx`: pending LED updates from the feedback sink
    pub fn spawn(
        device: HidDevice,
        event_tx: Sender<ControlEvent>,
        led_rx: Receiver<(ControlId, u8)>,
    ) -> std::io::Result<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let alive = Arc::new(AtomicBool::new(true));
        let alive_clone = alive.clone();

        let handle = thread::Builder::new()
            .name("nocturn-io".to_string())
            .spawn(move || {
                Self::io_loop(device, event_tx, led_rx, shutdown_clone);
                alive_clone.store(false, Ordering::Relaxed);
            })?;

        Ok(Self {
            shutdown,
            handle: Some(handle),
            alive,
        })
    }

    /// Whether the I/O loop is still running.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Relaxed)
    }

    fn io_loop(
        device: HidDevice,
        event_tx: Sender<ControlEvent>,
        led_rx: Receiver<(ControlId, u8)>,
        shutdown: Arc<AtomicBool>,
    ) {
        info!("Surface I/O thread started");

        for packet in protocol::init_packets() {
            if let Err(e) = device.write(&packet) {
                error!("Surface init write failed: {}", e);
                return;
            }
        }

        let mut input_buf = [0u8; protocol::REPORT_LEN];

        loop {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }

            // Input: blocking read with a short timeout keeps the loop
            // responsive for the write side
            match device.read_timeout(&mut input_buf, protocol::READ_TIMEOUT_MS) {
                Ok(n) if n > 0 => {
                    if let Some(event) = protocol::decode(&input_buf[..n]) {
                        debug!("surface {} {:?}", event.id, event.kind);
                        if event_tx.try_send(event).is_err() {
                            warn!("Surface event channel full, dropping event");
                        }
                    }
                }
                Ok(_) => {} // timeout, no data
                Err(e) => {
                    error!("Surface read error: {}", e);
                    break; // device unplugged
                }
            }

            // Output: drain pending LED updates
            let mut write_failed = false;
            while let Ok((id, value)) = led_rx.try_recv() {
                if let Some(packet) = protocol::led_packet(id, value) {
                    if let Err(e) = device.write(&packet) {
                        error!("Surface write error: {}", e);
                        write_failed = true;
                        break;
                    }
                }
            }
            if write_failed {
                break;
            }
        }

        info!("Surface I/O thread stopped");
    }
}

impl Drop for SurfaceIoThread {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            debug!("Waiting for surface I/O thread to stop...");
            let _ = handle.join();
        }
    }
}
