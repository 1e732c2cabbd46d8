//! Room and session registry plus the per-tick simulation step
//!
//! This module owns every piece of authoritative state. Sessions buffer
//! inputs as they arrive off the network; only [`Registry::tick`] applies
//! them, so all physics mutation is sequential on the game-loop task and
//! needs no locks.

use crate::loadout::{LoadoutTable, ABILITY, PRIMARY};
use crate::network::NetworkEvent;
use crate::utils;
use log::{debug, info, warn};
use shared::movement::{step, KinematicState, TICK_DT};
use shared::protocol::{InputCommand, PlayerSnapshot, ServerMessage};
use std::collections::{HashMap, VecDeque};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// One connected player inside a room.
#[derive(Debug)]
pub struct Session {
    pub id: String,
    pub name: String,
    pub state: KinematicState,
    /// Inputs waiting for the next tick, FIFO by arrival.
    pub pending: VecDeque<InputCommand>,
    /// Sequence number of the last command fed through the simulator.
    pub last_processed_input: u32,
    /// Opaque loadout ids attached at join; carried for display only.
    pub loadout: Vec<String>,
    sender: mpsc::UnboundedSender<Message>,
}

impl Session {
    pub fn new(id: String, name: String, sender: mpsc::UnboundedSender<Message>) -> Self {
        Session {
            id,
            name,
            state: KinematicState::spawn(),
            pending: VecDeque::new(),
            last_processed_input: 0,
            loadout: Vec::new(),
            sender,
        }
    }

    /// Buffers one command. Queues are unbounded; a flood all lands in the
    /// next tick (accepted simplification).
    pub fn enqueue(&mut self, command: InputCommand) {
        self.pending.push_back(command);
    }

    /// Applies every pending command in arrival order through the shared
    /// simulator. Commands are never re-sorted by sequence number.
    pub fn drain_inputs(&mut self) {
        while let Some(command) = self.pending.pop_front() {
            let dt = command.dt.unwrap_or(TICK_DT);
            self.state = step(self.state, &command.input, dt);
            self.last_processed_input = command.seq;
        }
    }

    pub fn snapshot_entry(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            pos: self.state.pos,
            vel: self.state.vel,
            yaw: self.state.yaw,
            pitch: self.state.pitch,
            grounded: self.state.grounded,
            last_processed_input: self.last_processed_input,
        }
    }

    /// Queues a message onto the session's connection. A closed channel
    /// means the connection already died; the pending Leave event cleans
    /// the session up, so the failure is only worth a debug line.
    pub fn send(&self, message: &ServerMessage) {
        match serde_json::to_string(message) {
            Ok(text) => {
                if self.sender.send(Message::Text(text)).is_err() {
                    debug!("session {}: connection gone, dropping outbound frame", self.id);
                }
            }
            Err(e) => warn!("session {}: failed to encode message: {}", self.id, e),
        }
    }
}

/// All sessions sharing one match id.
#[derive(Debug, Default)]
pub struct Room {
    pub sessions: HashMap<String, Session>,
}

impl Room {
    pub fn new() -> Self {
        Room::default()
    }

    /// One simulation tick: drain every session's queue, then fan the
    /// resulting snapshot out to every member with their own ack.
    pub fn tick(&mut self, server_time: u64) {
        for session in self.sessions.values_mut() {
            session.drain_inputs();
        }

        let players: Vec<PlayerSnapshot> =
            self.sessions.values().map(Session::snapshot_entry).collect();

        for session in self.sessions.values() {
            session.send(&ServerMessage::State {
                players: players.clone(),
                last_processed: session.last_processed_input,
                server_time,
            });
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Maps match ids to rooms. Rooms appear on first reference and are
/// evicted as soon as their last session leaves.
#[derive(Debug)]
pub struct Registry {
    rooms: HashMap<String, Room>,
    loadouts: LoadoutTable,
}

impl Registry {
    pub fn new() -> Self {
        Registry {
            rooms: HashMap::new(),
            loadouts: LoadoutTable::standard(),
        }
    }

    pub fn room_mut(&mut self, match_id: &str) -> &mut Room {
        self.rooms.entry(match_id.to_string()).or_insert_with(|| {
            info!("Created room {}", match_id);
            Room::new()
        })
    }

    /// Creates a session with a fresh identifier and the default spawn
    /// state, rolls its opaque loadout, and returns the new id.
    pub fn add_session(
        &mut self,
        match_id: &str,
        name: String,
        sender: mpsc::UnboundedSender<Message>,
    ) -> String {
        let id = utils::generate_session_id();
        let mut session = Session::new(id.clone(), name, sender);

        let mut rng = rand::thread_rng();
        for category in [PRIMARY, ABILITY] {
            match self.loadouts.roll(category, &mut rng) {
                Some(item) => {
                    debug!("session {}: rolled {} {}", id, category, item.name);
                    session.loadout.push(item.id.clone());
                }
                // "None available" is a no-op roll, not an error.
                None => debug!("session {}: no {} available to roll", id, category),
            }
        }

        info!("Session {} ({}) joined room {}", id, session.name, match_id);
        self.room_mut(match_id).sessions.insert(id.clone(), session);
        id
    }

    /// Removes a session; a miss on either lookup is a no-op. The room is
    /// evicted once its last session is gone.
    pub fn remove_session(&mut self, match_id: &str, session_id: &str) {
        if let Some(room) = self.rooms.get_mut(match_id) {
            if room.sessions.remove(session_id).is_some() {
                info!("Session {} left room {}", session_id, match_id);
            }
            if room.is_empty() {
                self.rooms.remove(match_id);
                info!("Evicted empty room {}", match_id);
            }
        }
    }

    /// Buffers an input for a session. Lookup misses (join not completed,
    /// or session already removed) drop the command silently.
    pub fn enqueue_input(&mut self, match_id: &str, session_id: &str, command: InputCommand) {
        if let Some(session) = self
            .rooms
            .get_mut(match_id)
            .and_then(|room| room.sessions.get_mut(session_id))
        {
            session.enqueue(command);
        }
    }

    /// Sends the welcome announcement for a freshly created session.
    pub fn send_welcome(&self, match_id: &str, session_id: &str) {
        if let Some(session) = self
            .rooms
            .get(match_id)
            .and_then(|room| room.sessions.get(session_id))
        {
            session.send(&ServerMessage::Welcome {
                id: session.id.clone(),
            });
        }
    }

    /// Applies one network event between ticks. The join reply carries
    /// the new session id back to the connection; a reply failure means
    /// the connection died mid-join and the session is torn down again.
    pub fn apply_event(&mut self, event: NetworkEvent) {
        match event {
            NetworkEvent::Join {
                match_id,
                name,
                sender,
                reply,
            } => {
                let session_id = self.add_session(&match_id, name, sender);
                // The welcome must reach the connection before any
                // snapshot can reference the new session.
                self.send_welcome(&match_id, &session_id);
                if let Err(session_id) = reply.send(session_id) {
                    self.remove_session(&match_id, &session_id);
                }
            }

            NetworkEvent::Input {
                match_id,
                session_id,
                command,
            } => self.enqueue_input(&match_id, &session_id, command),

            NetworkEvent::Leave {
                match_id,
                session_id,
            } => self.remove_session(&match_id, &session_id),
        }
    }

    /// Advances every room by one tick. Rooms never interact, so the
    /// sequential pass is race-free by construction.
    pub fn tick(&mut self, server_time: u64) {
        for room in self.rooms.values_mut() {
            room.tick(server_time);
        }
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn room(&self, match_id: &str) -> Option<&Room> {
        self.rooms.get(match_id)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::new()
    }
}
