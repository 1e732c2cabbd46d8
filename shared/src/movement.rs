//! Deterministic first-person movement simulation
//!
//! `step` is pure with respect to its explicit inputs: the same state,
//! input sample and delta time always produce the same output, which is
//! what lets client prediction and server authority agree exactly.

use serde::{Deserialize, Serialize};

/// Server simulation rate in ticks per second.
pub const TICK_RATE: u32 = 30;
/// Duration of one tick, also the fallback dt for inputs that carry none.
pub const TICK_DT: f32 = 1.0 / TICK_RATE as f32;

/// Horizontal acceleration while walking, units/s².
pub const WALK_ACCEL: f32 = 14.0;
/// Horizontal acceleration while sliding, units/s².
pub const SLIDE_ACCEL: f32 = 20.0;
/// Horizontal speed cap while walking.
pub const WALK_MAX_SPEED: f32 = 11.0;
/// Horizontal speed cap while sliding.
pub const SLIDE_MAX_SPEED: f32 = 16.0;
/// Vertical velocity applied on a grounded jump.
pub const JUMP_IMPULSE: f32 = 8.0;
/// Extra horizontal speed granted by a slide-jump.
pub const SLIDE_BOOST: f32 = 4.0;
/// Absolute ceiling on slide-jump horizontal speed.
pub const SLIDE_JUMP_SPEED_CAP: f32 = 18.0;
/// Downward acceleration, units/s².
pub const GRAVITY: f32 = 18.0;
/// Height at which the floor clamps vertical motion.
pub const FLOOR_HEIGHT: f32 = 1.2;
/// The arena is a square of this half-extent on both horizontal axes.
pub const ARENA_HALF_EXTENT: f32 = 55.0;
/// Horizontal friction coefficient while grounded.
pub const GROUND_FRICTION: f32 = 8.0;
/// Horizontal friction coefficient while airborne.
pub const AIR_FRICTION: f32 = 1.0;

/// A point or direction in 3D space. Y is up.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Vec3 { x, y, z }
    }

    /// Magnitude of the horizontal (x, z) components only.
    pub fn horizontal_speed(&self) -> f32 {
        (self.x * self.x + self.z * self.z).sqrt()
    }
}

/// The kinematic state of one player, mutated only by [`step`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KinematicState {
    pub pos: Vec3,
    pub vel: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub grounded: bool,
}

impl KinematicState {
    /// The state every session starts from: standing at the arena center.
    pub fn spawn() -> Self {
        KinematicState {
            pos: Vec3::new(0.0, FLOOR_HEIGHT, 0.0),
            vel: Vec3::default(),
            yaw: 0.0,
            pitch: 0.0,
            grounded: true,
        }
    }
}

/// One sampled frame of player intent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct InputSample {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub slide: bool,
    pub yaw: f32,
    pub pitch: f32,
}

/// Advances `state` by one input sample over `dt` seconds.
///
/// The movement basis derives from the yaw the state carried in, i.e. the
/// yaw of the previously applied command; the sample's yaw/pitch are
/// written into the state last, so look direction always reflects the most
/// recently applied command.
pub fn step(mut state: KinematicState, input: &InputSample, dt: f32) -> KinematicState {
    let accel = if input.slide { SLIDE_ACCEL } else { WALK_ACCEL };
    let max_speed = if input.slide {
        SLIDE_MAX_SPEED
    } else {
        WALK_MAX_SPEED
    };

    let forward = (state.yaw.sin(), -state.yaw.cos());
    let right = (state.yaw.cos(), state.yaw.sin());

    let mut wish_x = 0.0f32;
    let mut wish_z = 0.0f32;
    if input.forward {
        wish_x += forward.0;
        wish_z += forward.1;
    }
    if input.back {
        wish_x -= forward.0;
        wish_z -= forward.1;
    }
    if input.left {
        wish_x -= right.0;
        wish_z -= right.1;
    }
    if input.right {
        wish_x += right.0;
        wish_z += right.1;
    }

    let wish_len = (wish_x * wish_x + wish_z * wish_z).sqrt();
    if wish_len > 0.0 {
        state.vel.x += wish_x / wish_len * accel * dt;
        state.vel.z += wish_z / wish_len * accel * dt;
    }

    let horiz_speed = state.vel.horizontal_speed();
    if horiz_speed > max_speed {
        let scale = max_speed / horiz_speed;
        state.vel.x *= scale;
        state.vel.z *= scale;
    }

    if input.jump && state.grounded {
        state.vel.y = JUMP_IMPULSE;
        if input.slide {
            let boosted = (max_speed + SLIDE_BOOST).min(SLIDE_JUMP_SPEED_CAP);
            let speed = state.vel.horizontal_speed();
            if speed > 0.0 {
                let scale = boosted / speed;
                state.vel.x *= scale;
                state.vel.z *= scale;
            } else {
                // No direction to boost along; fall back to +x.
                state.vel.x = boosted;
                state.vel.z = 0.0;
            }
        }
        state.grounded = false;
    }

    state.vel.y -= GRAVITY * dt;

    state.pos.x += state.vel.x * dt;
    state.pos.y += state.vel.y * dt;
    state.pos.z += state.vel.z * dt;

    if state.pos.y < FLOOR_HEIGHT {
        state.pos.y = FLOOR_HEIGHT;
        if state.vel.y < 0.0 {
            state.vel.y = 0.0;
        }
        state.grounded = true;
    }

    state.pos.x = state.pos.x.clamp(-ARENA_HALF_EXTENT, ARENA_HALF_EXTENT);
    state.pos.z = state.pos.z.clamp(-ARENA_HALF_EXTENT, ARENA_HALF_EXTENT);

    let friction = if state.grounded {
        GROUND_FRICTION
    } else {
        AIR_FRICTION
    };
    state.vel.x -= state.vel.x * friction * dt;
    state.vel.z -= state.vel.z * friction * dt;

    state.yaw = input.yaw;
    state.pitch = input.pitch;

    state
}
