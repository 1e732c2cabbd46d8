//! # Authoritative Movement Server
//!
//! The server is the single source of truth for player movement. Clients
//! send inputs; the server buffers them per session, applies them through
//! the shared movement simulator on a fixed 30 Hz tick, and broadcasts an
//! authoritative snapshot of every room after each tick.
//!
//! ## Architecture
//!
//! All authoritative state lives on one game-loop task. Connection tasks
//! translate WebSocket frames into [`network::NetworkEvent`]s and push
//! them into the game loop's mailbox; the loop applies them between ticks.
//! Physics therefore runs strictly sequentially: the only data shared
//! between contexts is the event channel itself, so no locks guard the
//! rooms or sessions.
//!
//! ## Module Organization
//!
//! - [`room`]: sessions, rooms, the registry, and the per-tick
//!   drain/simulate/broadcast step.
//! - [`network`]: WebSocket accept loop, the per-connection
//!   Idle/Joined/Terminated state machine, and the event types.
//! - [`loadout`]: opaque weighted loadout rolls attached to sessions at
//!   join; the core never interprets the rolled identifiers.
//! - [`utils`]: wall-clock timestamps and session-id generation.
//!
//! ## Guarantees
//!
//! - A session's state always equals the spawn state advanced by every
//!   command the server has dequeued for it, in arrival order; no command
//!   is applied twice.
//! - Snapshots carry, per recipient, the last input sequence folded into
//!   the authoritative state, which is what client reconciliation keys on.
//! - Malformed or out-of-place messages never tear down the process; at
//!   worst they end the offending connection.

pub mod loadout;
pub mod network;
pub mod room;
pub mod utils;
