//! Engine actor
//!
//! Serializes every producer (surface reports, inbound MIDI, focus changes,
//! console commands) into one command channel drained by a single task, so
//! the engine itself never needs a lock. Fire-and-forget methods for the
//! hot paths, oneshot responses for queries.

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use super::{Engine, EngineStatus};
use crate::events::{ControlEvent, ControlId};
use crate::midi::MidiMessage;

/// Commands accepted by the engine actor.
pub enum EngineCommand {
    /// Decoded event from the control surface (or the console simulator)
    SurfaceEvent(ControlEvent),

    /// Message from the DAW-facing MIDI input port
    IncomingMidi(MidiMessage),

    /// The focused application changed; value is the derived profile name
    FocusChanged { name: String },

    /// Explicit profile switch from the console
    SwitchProfile { name: String },

    /// Arm or disarm learn mode
    SetLearn { active: bool },

    /// Persist the current profile now
    SaveProfile,

    GetStatus {
        response: oneshot::Sender<EngineStatus>,
    },
    GetMappings {
        response: oneshot::Sender<Vec<(ControlId, String, String, u8)>>,
    },

    Shutdown,
}

/// Actor owning the engine and its command queue.
pub struct EngineActor {
    engine: Engine,
    command_rx: mpsc::UnboundedReceiver<EngineCommand>,
}

impl EngineActor {
    /// Spawn the actor's run loop and return a handle for it.
    pub fn spawn(engine: Engine) -> EngineHandle {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

        let actor = EngineActor {
            engine,
            command_rx: cmd_rx,
        };

        tokio::spawn(actor.run());

        info!("Engine actor spawned");

        EngineHandle::new(cmd_tx)
    }

    /// Drain commands until shutdown. Each command runs to completion
    /// before the next is taken; the only awaits inside are the deliberate
    /// pacing sleeps of a full resync.
    async fn run(mut self) {
        debug!("Engine actor loop started");

        self.engine.initialize().await;

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                EngineCommand::SurfaceEvent(event) => {
                    self.engine.handle_event(event);
                }
                EngineCommand::IncomingMidi(msg) => {
                    self.engine.handle_incoming_midi(msg);
                }
                EngineCommand::FocusChanged { name } => {
                    debug!("Focus changed: {}", name);
                    self.engine.switch_profile(&name).await;
                }
                EngineCommand::SwitchProfile { name } => {
                    self.engine.switch_profile(&name).await;
                }
                EngineCommand::SetLearn { active } => {
                    let was_learning = self.engine.learn_active();
                    self.engine.set_learn(active);
                    // disarming persists what was learned
                    if was_learning && !active {
                        self.engine.save_current_profile().await;
                    }
                }
                EngineCommand::SaveProfile => {
                    self.engine.save_current_profile().await;
                }
                EngineCommand::GetStatus { response } => {
                    let _ = response.send(self.engine.status());
                }
                EngineCommand::GetMappings { response } => {
                    let _ = response.send(self.engine.mapping_rows());
                }
                EngineCommand::Shutdown => {
                    info!("Engine actor received shutdown command");
                    break;
                }
            }
        }

        info!("Engine actor loop terminated");
    }
}

/// Handle for interacting with the engine actor.
///
/// All methods are non-blocking for the caller; queries await a oneshot
/// response.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::UnboundedSender<EngineCommand>,
}

impl EngineHandle {
    pub fn new(cmd_tx: mpsc::UnboundedSender<EngineCommand>) -> Self {
        Self { cmd_tx }
    }

    /// Feed one surface event. Fire-and-forget, hot path.
    pub fn surface_event(&self, event: ControlEvent) {
        let _ = self.cmd_tx.send(EngineCommand::SurfaceEvent(event));
    }

    /// Feed one inbound MIDI message. Fire-and-forget, hot path.
    pub fn incoming_midi(&self, msg: MidiMessage) {
        let _ = self.cmd_tx.send(EngineCommand::IncomingMidi(msg));
    }

    /// Report a focus change (name already normalized to a profile name).
    pub fn focus_changed(&self, name: String) {
        let _ = self.cmd_tx.send(EngineCommand::FocusChanged { name });
    }

    pub fn switch_profile(&self, name: String) {
        let _ = self.cmd_tx.send(EngineCommand::SwitchProfile { name });
    }

    pub fn set_learn(&self, active: bool) {
        let _ = self.cmd_tx.send(EngineCommand::SetLearn { active });
    }

    pub fn save_profile(&self) {
        let _ = self.cmd_tx.send(EngineCommand::SaveProfile);
    }

    /// Current console status, `None` if the actor is gone.
    pub async fn status(&self) -> Option<EngineStatus> {
        let (response_tx, response_rx) = oneshot::channel();
        let cmd = EngineCommand::GetStatus {
            response: response_tx,
        };

        if self.cmd_tx.send(cmd).is_err() {
            return None;
        }

        response_rx.await.ok()
    }

    /// The active mapping table as display rows.
    pub async fn mappings(&self) -> Vec<(ControlId, String, String, u8)> {
        let (response_tx, response_rx) = oneshot::channel();
        let cmd = EngineCommand::GetMappings {
            response: response_tx,
        };

        if self.cmd_tx.send(cmd).is_err() {
            return Vec::new();
        }

        response_rx.await.ok().unwrap_or_default()
    }

    /// False once the actor's command channel is closed.
    pub fn is_alive(&self) -> bool {
        !self.cmd_tx.is_closed()
    }

    pub fn shutdown(&self) {
        let _ = self.cmd_tx.send(EngineCommand::Shutdown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<EngineHandle>();
    }

    #[tokio::test]
    async fn test_is_alive_tracks_channel() {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = EngineHandle::new(tx);
        assert!(handle.is_alive());

        drop(rx);
        assert!(!handle.is_alive());
    }
}
