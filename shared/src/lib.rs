//! # Shared Game Logic
//!
//! Code linked by both the server and the client: the deterministic
//! movement simulator and the wire protocol types.
//!
//! The movement simulator is the single implementation of the game's
//! physics. The server applies it to queued inputs inside the tick loop;
//! the client applies it for local prediction and again when replaying
//! unacknowledged inputs during reconciliation. Because both runtimes call
//! the exact same function with the exact same samples, prediction and
//! authority agree bit-for-bit and reconciliation only has to correct for
//! inputs the server has not seen yet.
//!
//! The protocol module defines the four JSON messages exchanged over the
//! WebSocket transport (`join`, `welcome`, `input`, `state`) together with
//! the per-player snapshot entry broadcast every tick.

pub mod movement;
pub mod protocol;

pub use movement::{
    step, InputSample, KinematicState, Vec3, AIR_FRICTION, ARENA_HALF_EXTENT, FLOOR_HEIGHT,
    GRAVITY, GROUND_FRICTION, JUMP_IMPULSE, SLIDE_ACCEL, SLIDE_BOOST, SLIDE_JUMP_SPEED_CAP,
    SLIDE_MAX_SPEED, TICK_DT, TICK_RATE, WALK_ACCEL, WALK_MAX_SPEED,
};
pub use protocol::{ClientMessage, InputCommand, PlayerSnapshot, ServerMessage, DEFAULT_ROOM};
