//! Wire protocol between client and server
//!
//! One JSON document per WebSocket text frame, tagged by a `type` field
//! and camelCase on the wire. Clients send `join` and `input`; the server
//! answers with `welcome` once and `state` every tick.

use crate::movement::{InputSample, KinematicState, Vec3};
use serde::{Deserialize, Serialize};

/// Room joined when a `join` message names no match id.
pub const DEFAULT_ROOM: &str = "public";
/// Display name used when a `join` message names no player.
pub const DEFAULT_NAME: &str = "Player";

/// Messages a client sends to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    Join {
        #[serde(default)]
        match_id: Option<String>,
        #[serde(default)]
        name: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Input {
        match_id: String,
        seq: u32,
        #[serde(default)]
        dt: Option<f32>,
        input: InputSample,
    },
}

/// Messages the server sends to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    Welcome {
        id: String,
    },
    #[serde(rename_all = "camelCase")]
    State {
        players: Vec<PlayerSnapshot>,
        /// Last input sequence processed for the receiving session.
        last_processed: u32,
        /// Server wall clock in milliseconds.
        server_time: u64,
    },
}

/// Public per-session state inside a `state` broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub id: String,
    pub name: String,
    pub pos: Vec3,
    pub vel: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub grounded: bool,
    pub last_processed_input: u32,
}

impl PlayerSnapshot {
    /// The kinematic portion of the snapshot, for reconciliation resets.
    pub fn kinematic(&self) -> KinematicState {
        KinematicState {
            pos: self.pos,
            vel: self.vel,
            yaw: self.yaw,
            pitch: self.pitch,
            grounded: self.grounded,
        }
    }
}

/// One queued input: the client-assigned sequence number, the sample, and
/// the elapsed time the client measured for it. `dt` of `None` means the
/// simulator falls back to [`crate::movement::TICK_DT`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputCommand {
    pub seq: u32,
    pub dt: Option<f32>,
    pub input: InputSample,
}
