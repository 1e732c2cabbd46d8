//! Client library for the arena movement server
//!
//! The client owns no authority: it predicts the local player through the
//! shared movement simulator, reconciles against server snapshots, and
//! eases remote players between snapshots. `main.rs` drives these pieces
//! as a headless bot; a renderer would use the same modules.

pub mod game;
pub mod interpolator;
pub mod network;
pub mod predictor;
