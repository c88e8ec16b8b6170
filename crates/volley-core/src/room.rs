//! Rooms pair two connections with one match. Room codes are the join
//! handle for private games; quick-match fills whichever room is waiting.

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::GameConfig;
use crate::match_state::{MatchState, PlayerSide};

/// Room codes are six characters drawn from an unambiguous-enough
/// uppercase alphanumeric alphabet.
pub const ROOM_CODE_LEN: usize = 6;
const ROOM_CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate a fresh random room code. Uniqueness is the registry's job;
/// at 36^6 codes collisions are retried, not prevented.
pub fn generate_room_code() -> String {
    let mut rng = rand::rng();
    (0..ROOM_CODE_LEN)
        .map(|_| {
            let idx = rng.random_range(0..ROOM_CODE_CHARSET.len());
            ROOM_CODE_CHARSET[idx] as char
        })
        .collect()
}

/// Shape check for client-supplied codes before any registry lookup.
pub fn is_valid_room_code(code: &str) -> bool {
    code.len() == ROOM_CODE_LEN && code.bytes().all(|b| ROOM_CODE_CHARSET.contains(&b))
}

/// One occupied seat in a room. `connected` goes false on disconnect but
/// the slot is kept so the seat survives until eviction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSlot {
    pub connection_id: Uuid,
    pub connected: bool,
}

/// Join rejection: both seats are taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomFull;

impl std::fmt::Display for RoomFull {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("room is full")
    }
}

impl std::error::Error for RoomFull {}

/// A two-seat room and its authoritative match.
#[derive(Debug)]
pub struct Room {
    pub code: String,
    slots: [Option<PlayerSlot>; 2],
    pub state: MatchState,
    pub config: GameConfig,
}

impl Room {
    /// Create a room with its creator seated as player 1.
    pub fn new(code: String, creator: Uuid, config: GameConfig) -> Self {
        Self::build(code, creator, MatchState::new(&config), config)
    }

    /// Deterministic variant for tests.
    pub fn with_seed(code: String, creator: Uuid, config: GameConfig, seed: u64) -> Self {
        let state = MatchState::with_seed(&config, seed);
        Self::build(code, creator, state, config)
    }

    fn build(code: String, creator: Uuid, state: MatchState, config: GameConfig) -> Self {
        Self {
            code,
            slots: [
                Some(PlayerSlot {
                    connection_id: creator,
                    connected: true,
                }),
                None,
            ],
            state,
            config,
        }
    }

    /// Seat a second player. Filling the room starts the match.
    pub fn join(&mut self, connection_id: Uuid) -> Result<PlayerSide, RoomFull> {
        if self.slots[1].is_some() {
            return Err(RoomFull);
        }
        self.slots[1] = Some(PlayerSlot {
            connection_id,
            connected: true,
        });
        self.state.begin();
        Ok(PlayerSide::Player2)
    }

    pub fn has_open_slot(&self) -> bool {
        self.slots[1].is_none()
    }

    pub fn slot(&self, side: PlayerSide) -> Option<&PlayerSlot> {
        self.slots[slot_index(side)].as_ref()
    }

    /// Which side a connection occupies, if it is seated here.
    pub fn side_of(&self, connection_id: Uuid) -> Option<PlayerSide> {
        for (idx, slot) in self.slots.iter().enumerate() {
            if let Some(slot) = slot
                && slot.connection_id == connection_id
            {
                return Some(if idx == 0 {
                    PlayerSide::Player1
                } else {
                    PlayerSide::Player2
                });
            }
        }
        None
    }

    /// Mark a seat disconnected and suspend play. The seat stays occupied;
    /// eviction is a separate, delayed decision.
    pub fn disconnect(&mut self, side: PlayerSide) {
        if let Some(slot) = self.slots[slot_index(side)].as_mut() {
            slot.connected = false;
        }
        self.state.pause();
    }

    /// True when every occupied seat has dropped its connection.
    pub fn all_disconnected(&self) -> bool {
        self.slots
            .iter()
            .flatten()
            .all(|slot| !slot.connected)
    }

    pub fn connected_count(&self) -> usize {
        self.slots
            .iter()
            .flatten()
            .filter(|slot| slot.connected)
            .count()
    }
}

fn slot_index(side: PlayerSide) -> usize {
    match side {
        PlayerSide::Player1 => 0,
        PlayerSide::Player2 => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::match_state::Phase;

    fn make_room() -> Room {
        Room::with_seed(
            "ABC123".into(),
            Uuid::new_v4(),
            GameConfig::default(),
            1,
        )
    }

    #[test]
    fn generated_codes_have_expected_shape() {
        for _ in 0..100 {
            let code = generate_room_code();
            assert!(is_valid_room_code(&code), "bad code {code}");
        }
    }

    #[test]
    fn code_validation_rejects_wrong_shapes() {
        assert!(is_valid_room_code("ABC123"));
        assert!(!is_valid_room_code("abc123"));
        assert!(!is_valid_room_code("ABC12"));
        assert!(!is_valid_room_code("ABC1234"));
        assert!(!is_valid_room_code("ABC 23"));
        assert!(!is_valid_room_code(""));
    }

    #[test]
    fn creator_is_player_one() {
        let creator = Uuid::new_v4();
        let room = Room::with_seed("ABC123".into(), creator, GameConfig::default(), 1);
        assert_eq!(room.side_of(creator), Some(PlayerSide::Player1));
        assert!(room.has_open_slot());
        assert_eq!(room.state.phase, Phase::Waiting);
    }

    #[test]
    fn second_join_starts_the_match() {
        let mut room = make_room();
        let joiner = Uuid::new_v4();
        let side = room.join(joiner).unwrap();
        assert_eq!(side, PlayerSide::Player2);
        assert_eq!(room.side_of(joiner), Some(PlayerSide::Player2));
        assert!(!room.has_open_slot());
        assert_eq!(room.state.phase, Phase::Running);
    }

    #[test]
    fn third_join_is_rejected() {
        let mut room = make_room();
        room.join(Uuid::new_v4()).unwrap();
        assert_eq!(room.join(Uuid::new_v4()), Err(RoomFull));
    }

    #[test]
    fn disconnect_pauses_and_keeps_the_seat() {
        let mut room = make_room();
        let joiner = Uuid::new_v4();
        room.join(joiner).unwrap();

        room.disconnect(PlayerSide::Player2);
        assert_eq!(room.state.phase, Phase::Paused);
        assert_eq!(room.connected_count(), 1);
        assert!(!room.all_disconnected());
        // Seat is retained, so the room still reads as full.
        assert!(!room.has_open_slot());

        room.disconnect(PlayerSide::Player1);
        assert!(room.all_disconnected());
    }

    #[test]
    fn lone_creator_disconnecting_abandons_the_room() {
        let mut room = make_room();
        room.disconnect(PlayerSide::Player1);
        assert!(room.all_disconnected());
    }

    #[test]
    fn unknown_connection_has_no_side() {
        let room = make_room();
        assert_eq!(room.side_of(Uuid::new_v4()), None);
    }
}
