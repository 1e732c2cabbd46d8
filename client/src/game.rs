//! Client-side session state: wires prediction, reconciliation and
//! remote interpolation to the message stream.

use crate::interpolator::RemoteInterpolator;
use crate::predictor::Predictor;
use log::{debug, info};
use shared::movement::InputSample;
use shared::protocol::{InputCommand, ServerMessage};

/// Everything the client tracks for one joined match.
pub struct ClientGame {
    pub predictor: Predictor,
    pub remotes: RemoteInterpolator,
    local_id: Option<String>,
    last_server_time: u64,
}

impl ClientGame {
    pub fn new() -> Self {
        ClientGame {
            predictor: Predictor::new(),
            remotes: RemoteInterpolator::new(),
            local_id: None,
            last_server_time: 0,
        }
    }

    /// The session id the server assigned us, once welcomed.
    pub fn local_id(&self) -> Option<&str> {
        self.local_id.as_deref()
    }

    pub fn last_server_time(&self) -> u64 {
        self.last_server_time
    }

    /// Applies one queued server message. Called at the start of the
    /// frame, before any local input is sampled.
    pub fn handle_message(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::Welcome { id } => {
                info!("Joined with session id {}", id);
                self.local_id = Some(id);
            }

            ServerMessage::State {
                players,
                server_time,
                ..
            } => {
                self.last_server_time = server_time;

                let Some(local_id) = self.local_id.clone() else {
                    // Snapshot raced ahead of the welcome; nothing to
                    // reconcile against yet.
                    debug!("state before welcome, ignoring");
                    return;
                };

                if let Some(entry) = players.iter().find(|entry| entry.id == local_id) {
                    self.predictor.reconcile(entry);
                }
                self.remotes.apply_snapshot(&players, &local_id);
            }
        }
    }

    /// One frame of local simulation: predicts the sampled input (once
    /// joined) and eases remote proxies. Returns the command to transmit.
    pub fn frame(&mut self, input: InputSample, dt: f32) -> Option<InputCommand> {
        self.remotes.update();

        // Inputs before the welcome would be dropped server-side anyway.
        self.local_id.as_ref()?;
        Some(self.predictor.predict(input, dt))
    }
}

impl Default for ClientGame {
    fn default() -> Self {
        ClientGame::new()
    }
}
