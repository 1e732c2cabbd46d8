//! Client-side prediction and reconciliation for the local player
//!
//! Inputs are applied optimistically through the shared movement simulator
//! the moment they are sampled, then retained until the server has folded
//! them into its authoritative state. When a snapshot arrives the local
//! state is hard-reset to the server's (the snapshot IS our history up to
//! the acknowledged sequence) and every still-unacknowledged input is
//! replayed on top, in strict sequence order. The visible position is
//! therefore always "authoritative-as-of-ack plus replay of local inputs
//! the server has not seen yet", which hides the round trip entirely.

use shared::movement::{step, InputSample, KinematicState};
use shared::protocol::{InputCommand, PlayerSnapshot};
use std::collections::VecDeque;

/// One locally applied input awaiting server acknowledgement.
#[derive(Debug, Clone, Copy)]
pub struct PendingInput {
    pub seq: u32,
    pub input: InputSample,
    pub dt: f32,
}

/// Owns the locally predicted state of this client's player.
#[derive(Debug)]
pub struct Predictor {
    state: KinematicState,
    next_seq: u32,
    pending: VecDeque<PendingInput>,
}

impl Predictor {
    pub fn new() -> Self {
        Predictor {
            state: KinematicState::spawn(),
            next_seq: 1,
            pending: VecDeque::new(),
        }
    }

    /// The state the renderer should draw the local player from.
    pub fn state(&self) -> &KinematicState {
        &self.state
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Applies one sampled input immediately and returns the command to
    /// transmit. The sample is retained until acknowledged.
    pub fn predict(&mut self, input: InputSample, dt: f32) -> InputCommand {
        let seq = self.next_seq;
        self.next_seq += 1;

        self.state = step(self.state, &input, dt);
        self.pending.push_back(PendingInput { seq, input, dt });

        InputCommand {
            seq,
            dt: Some(dt),
            input,
        }
    }

    /// Corrects the predicted state against the authoritative snapshot
    /// entry for this player.
    ///
    /// Replay must run in ascending sequence order: the simulator is
    /// state-dependent, so any other order reconstructs a different
    /// (wrong) final state.
    pub fn reconcile(&mut self, authoritative: &PlayerSnapshot) {
        self.state = authoritative.kinematic();

        let acked = authoritative.last_processed_input;
        while self
            .pending
            .front()
            .map_or(false, |pending| pending.seq <= acked)
        {
            self.pending.pop_front();
        }

        for pending in &self.pending {
            self.state = step(self.state, &pending.input, pending.dt);
        }
    }
}

impl Default for Predictor {
    fn default() -> Self {
        Predictor::new()
    }
}
