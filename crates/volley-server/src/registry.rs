//! The room registry maps codes to live rooms. Registry mutations go
//! through the outer `RwLock`; per-room state sits behind its own mutex so
//! tick loops and input handling never hold the registry lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use volley_core::config::GameConfig;
use volley_core::match_state::PlayerSide;
use volley_core::net::messages::TableSize;
use volley_core::room::{Room, generate_room_code, is_valid_room_code};

/// Per-client sender for outbound text frames. Bounded so a slow client
/// drops snapshots instead of growing memory.
pub type ClientSender = mpsc::Sender<String>;

/// A room plus its connection channels and tick task handle.
#[derive(Debug)]
pub struct RoomEntry {
    pub room: Room,
    senders: [Option<ClientSender>; 2],
    pub ticker: Option<JoinHandle<()>>,
}

impl RoomEntry {
    pub fn sender(&self, side: PlayerSide) -> Option<&ClientSender> {
        self.senders[slot_index(side)].as_ref()
    }

    pub fn set_sender(&mut self, side: PlayerSide, sender: ClientSender) {
        self.senders[slot_index(side)] = Some(sender);
    }

    pub fn clear_sender(&mut self, side: PlayerSide) {
        self.senders[slot_index(side)] = None;
    }

    /// All currently attached senders, for broadcasts.
    pub fn senders(&self) -> impl Iterator<Item = &ClientSender> {
        self.senders.iter().flatten()
    }
}

fn slot_index(side: PlayerSide) -> usize {
    match side {
        PlayerSide::Player1 => 0,
        PlayerSide::Player2 => 1,
    }
}

pub type SharedRoom = Arc<Mutex<RoomEntry>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinError {
    RoomNotFound,
    RoomFull,
}

impl std::fmt::Display for JoinError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RoomNotFound => f.write_str("Room not found"),
            Self::RoomFull => f.write_str("Room is full"),
        }
    }
}

impl std::error::Error for JoinError {}

/// Whether a seat operation opened a new room or completed a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    Created,
    Paired,
}

/// Result of seating a connection in a room.
#[derive(Debug)]
pub struct RoomJoin {
    pub room: SharedRoom,
    pub code: String,
    pub side: PlayerSide,
    pub outcome: MatchOutcome,
    pub table_size: TableSize,
}

/// Manages all active rooms.
pub struct RoomRegistry {
    rooms: HashMap<String, SharedRoom>,
    game: GameConfig,
}

impl RoomRegistry {
    pub fn new(game: GameConfig) -> Self {
        Self {
            rooms: HashMap::new(),
            game,
        }
    }

    fn table_size(&self) -> TableSize {
        TableSize {
            width: self.game.width,
            height: self.game.height,
        }
    }

    /// Seat a connection in the first room with an open seat, or open a new
    /// room when none is waiting.
    pub fn quick_match(&mut self, connection_id: Uuid, sender: ClientSender) -> RoomJoin {
        let waiting = self.rooms.iter().find_map(|(code, room)| {
            let entry = room.lock().unwrap();
            entry.room.has_open_slot().then(|| code.clone())
        });

        if let Some(code) = waiting {
            let room = &self.rooms[&code];
            let mut entry = room.lock().unwrap();
            if let Ok(side) = entry.room.join(connection_id) {
                entry.set_sender(side, sender);
                drop(entry);
                return RoomJoin {
                    room: Arc::clone(room),
                    code,
                    side,
                    outcome: MatchOutcome::Paired,
                    table_size: self.table_size(),
                };
            }
        }

        self.create_room(connection_id, sender)
    }

    /// Open a fresh room with the connection seated as player 1.
    pub fn create_room(&mut self, connection_id: Uuid, sender: ClientSender) -> RoomJoin {
        let code = loop {
            let candidate = generate_room_code();
            if !self.rooms.contains_key(&candidate) {
                break candidate;
            }
        };

        let room = Room::new(code.clone(), connection_id, self.game.clone());
        let entry = RoomEntry {
            room,
            senders: [Some(sender), None],
            ticker: None,
        };
        let shared = Arc::new(Mutex::new(entry));
        self.rooms.insert(code.clone(), Arc::clone(&shared));

        RoomJoin {
            room: shared,
            code,
            side: PlayerSide::Player1,
            outcome: MatchOutcome::Created,
            table_size: self.table_size(),
        }
    }

    /// Seat a connection in the room with this code.
    pub fn join_room(
        &mut self,
        code: &str,
        connection_id: Uuid,
        sender: ClientSender,
    ) -> Result<RoomJoin, JoinError> {
        if !is_valid_room_code(code) {
            return Err(JoinError::RoomNotFound);
        }
        let room = self.rooms.get(code).ok_or(JoinError::RoomNotFound)?;

        let mut entry = room.lock().unwrap();
        let side = entry.room.join(connection_id).map_err(|_| JoinError::RoomFull)?;
        entry.set_sender(side, sender);
        drop(entry);

        Ok(RoomJoin {
            room: Arc::clone(room),
            code: code.to_string(),
            side,
            outcome: MatchOutcome::Paired,
            table_size: self.table_size(),
        })
    }

    pub fn get(&self, code: &str) -> Option<SharedRoom> {
        self.rooms.get(code).cloned()
    }

    /// Remove the room if every occupied seat has disconnected. Rechecked
    /// at call time so a reconnect-free rejoin window stays honest: a room
    /// that regained a player is left alone.
    pub fn evict_if_abandoned(&mut self, code: &str) -> bool {
        let Some(room) = self.rooms.get(code) else {
            return false;
        };

        let abandoned = {
            let mut entry = room.lock().unwrap();
            if entry.room.all_disconnected() {
                if let Some(handle) = entry.ticker.take() {
                    handle.abort();
                }
                true
            } else {
                false
            }
        };

        if abandoned {
            self.rooms.remove(code);
        }
        abandoned
    }

    /// (active rooms, connected players) for the health endpoint.
    pub fn stats(&self) -> (usize, usize) {
        let players = self
            .rooms
            .values()
            .map(|room| room.lock().unwrap().room.connected_count())
            .sum();
        (self.rooms.len(), players)
    }
}
