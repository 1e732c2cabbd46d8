//! Smoothing of remote players between authoritative snapshots
//!
//! Remote players only exist as 30 Hz snapshot entries; drawing them raw
//! would stutter. Each remote session gets a visual proxy eased toward its
//! latest known position by a fixed factor per frame. Facing comes
//! straight from the snapshot yaw, unsmoothed.

use shared::movement::Vec3;
use shared::protocol::PlayerSnapshot;
use std::collections::HashMap;

/// Per-frame easing factor toward the latest authoritative position.
pub const LERP_FACTOR: f32 = 0.2;

/// Visual stand-in for one remote player.
#[derive(Debug, Clone)]
pub struct RemoteProxy {
    pub name: String,
    /// Where the proxy is drawn this frame.
    pub visual_pos: Vec3,
    /// Latest authoritative position to ease toward.
    pub target_pos: Vec3,
    pub yaw: f32,
    pub grounded: bool,
}

/// The set of remote-player proxies for the current room.
#[derive(Debug, Default)]
pub struct RemoteInterpolator {
    proxies: HashMap<String, RemoteProxy>,
}

impl RemoteInterpolator {
    pub fn new() -> Self {
        RemoteInterpolator::default()
    }

    /// Ingests a snapshot: updates or creates a proxy per remote entry and
    /// drops proxies for sessions no longer present.
    pub fn apply_snapshot(&mut self, players: &[PlayerSnapshot], local_id: &str) {
        for entry in players {
            if entry.id == local_id {
                continue;
            }

            match self.proxies.get_mut(&entry.id) {
                Some(proxy) => {
                    proxy.target_pos = entry.pos;
                    proxy.yaw = entry.yaw;
                    proxy.grounded = entry.grounded;
                    proxy.name = entry.name.clone();
                }
                // New arrivals appear in place rather than easing in
                // from somewhere stale.
                None => {
                    self.proxies.insert(
                        entry.id.clone(),
                        RemoteProxy {
                            name: entry.name.clone(),
                            visual_pos: entry.pos,
                            target_pos: entry.pos,
                            yaw: entry.yaw,
                            grounded: entry.grounded,
                        },
                    );
                }
            }
        }

        self.proxies
            .retain(|id, _| players.iter().any(|entry| &entry.id == id));
    }

    /// Moves every proxy a fixed fraction toward its target. Called once
    /// per rendered frame.
    pub fn update(&mut self) {
        for proxy in self.proxies.values_mut() {
            proxy.visual_pos.x += (proxy.target_pos.x - proxy.visual_pos.x) * LERP_FACTOR;
            proxy.visual_pos.y += (proxy.target_pos.y - proxy.visual_pos.y) * LERP_FACTOR;
            proxy.visual_pos.z += (proxy.target_pos.z - proxy.visual_pos.z) * LERP_FACTOR;
        }
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&RemoteProxy> {
        self.proxies.get(id)
    }
}
