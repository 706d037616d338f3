//! Engine feedback fan-out
//!
//! The engine reports value, label, status, profile and learn changes
//! through a [`FeedbackSink`]. The production sink forwards values to the
//! surface LED channel and puts the rest in the log; tests swap in a
//! recording sink.

use tracing::{debug, info, trace, warn};

use crate::events::ControlId;

/// Where engine feedback goes. One call per observable change; the engine
/// only emits when something actually changed.
pub trait FeedbackSink: Send {
    /// A control's cached value changed (also drives the surface LED).
    fn on_value(&mut self, id: ControlId, value: u8);

    /// A control's display label changed.
    fn on_label(&mut self, id: ControlId, label: &str);

    /// One-line console status (mode, page, shift).
    fn on_status(&mut self, line: &str);

    /// The active profile changed.
    fn on_profile(&mut self, name: &str);

    /// Learn mode was armed or disarmed.
    fn on_learn(&mut self, active: bool);
}

/// Production sink: values go to the surface LED channel when a surface is
/// attached, everything else goes to the log.
pub struct SurfaceFeedback {
    led_tx: Option<flume::Sender<(ControlId, u8)>>,
}

impl SurfaceFeedback {
    pub fn new(led_tx: Option<flume::Sender<(ControlId, u8)>>) -> Self {
        Self { led_tx }
    }
}

impl FeedbackSink for SurfaceFeedback {
    fn on_value(&mut self, id: ControlId, value: u8) {
        trace!("feedback {} = {}", id, value);
        if let Some(tx) = &self.led_tx {
            match tx.try_send((id, value)) {
                Ok(()) => {}
                Err(flume::TrySendError::Full(_)) => {
                    warn!("Surface feedback channel full, dropping {} = {}", id, value);
                }
                Err(flume::TrySendError::Disconnected(_)) => {
                    debug!("Surface feedback channel closed");
                    self.led_tx = None;
                }
            }
        }
    }

    fn on_label(&mut self, id: ControlId, label: &str) {
        debug!("{} -> {}", id, label);
    }

    fn on_status(&mut self, line: &str) {
        info!("{}", line);
    }

    fn on_profile(&mut self, name: &str) {
        info!("Profile: {}", name);
    }

    fn on_learn(&mut self, active: bool) {
        info!("Learn mode {}", if active { "armed" } else { "off" });
    }
}

#[cfg(test)]
pub(crate) mod recording {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq)]
    pub enum Feedback {
        Value(ControlId, u8),
        Label(ControlId, String),
        Status(String),
        Profile(String),
        Learn(bool),
    }

    /// Test sink. Clones share the same log, so a test can keep one clone
    /// and hand the other to the engine.
    #[derive(Clone, Default)]
    pub struct RecordingFeedback {
        log: Arc<Mutex<Vec<Feedback>>>,
    }

    impl RecordingFeedback {
        pub fn new() -> Self {
            Self::default()
        }

        /// Drain everything recorded so far.
        pub fn take(&self) -> Vec<Feedback> {
            std::mem::take(&mut *self.log.lock().unwrap())
        }

        /// Just the value updates, in order.
        pub fn values(&self) -> Vec<(ControlId, u8)> {
            self.log
                .lock()
                .unwrap()
                .iter()
                .filter_map(|f| match f {
                    Feedback::Value(id, v) => Some((*id, *v)),
                    _ => None,
                })
                .collect()
        }
    }

    impl FeedbackSink for RecordingFeedback {
        fn on_value(&mut self, id: ControlId, value: u8) {
            self.log.lock().unwrap().push(Feedback::Value(id, value));
        }

        fn on_label(&mut self, id: ControlId, label: &str) {
            self.log
                .lock()
                .unwrap()
                .push(Feedback::Label(id, label.to_string()));
        }

        fn on_status(&mut self, line: &str) {
            self.log.lock().unwrap().push(Feedback::Status(line.to_string()));
        }

        fn on_profile(&mut self, name: &str) {
            self.log.lock().unwrap().push(Feedback::Profile(name.to_string()));
        }

        fn on_learn(&mut self, active: bool) {
            self.log.lock().unwrap().push(Feedback::Learn(active));
        }
    }
}
