//! Wire schema for the client/server event protocol. Events are JSON text
//! frames tagged by `event` with an adjacent `data` payload; field names
//! are camelCase on the wire.

use serde::{Deserialize, Serialize};

use crate::match_state::{PaddleDirection, PlayerSide, Scores};
use crate::physics::Ball;

/// Everything a client may send. Unknown events fail to parse and are
/// surfaced as protocol errors by the decoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Pair me with any waiting player, or open a new public room.
    QuickMatch,
    /// Open a private room and hand me its code.
    CreateRoom,
    /// Join the private room with this code.
    #[serde(rename_all = "camelCase")]
    JoinRoom { room_id: String },
    /// Nudge my paddle one step.
    PaddleMove { direction: PaddleDirection },
    /// Reset the match for a rematch.
    RestartMultiplayer,
}

/// Everything the server may send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Sent once on seating, telling the client its room and player number.
    #[serde(rename_all = "camelCase")]
    MultiplayerJoined {
        room_id: String,
        player_num: u8,
        game_config: TableSize,
    },
    /// The room has one seat filled and is idling for an opponent.
    WaitingForOpponent,
    /// The other seat just filled; play is starting.
    #[serde(rename_all = "camelCase")]
    OpponentJoined { player_num: u8 },
    /// Per-tick authoritative state broadcast.
    MultiplayerUpdate(Snapshot),
    /// The other player's connection dropped; the match is suspended.
    OpponentDisconnected,
    #[serde(rename_all = "camelCase")]
    Error { message: String },
}

/// Table dimensions sent on join (the wire's `gameConfig` payload) so
/// clients can scale their rendering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TableSize {
    pub width: f64,
    pub height: f64,
}

/// Full match view broadcast to both clients each tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub ball: Ball,
    pub paddles: Paddles,
    pub scores: Scores,
    pub game_started: bool,
    pub game_over: bool,
    pub winner: Option<PlayerSide>,
    pub rallies: u32,
    pub current_rally: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Paddles {
    pub left: PaddlePosition,
    pub right: PaddlePosition,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaddlePosition {
    pub y: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn client_events_parse_from_wire_json() {
        let quick: ClientEvent = serde_json::from_value(json!({"event": "quickMatch"})).unwrap();
        assert_eq!(quick, ClientEvent::QuickMatch);

        let join: ClientEvent =
            serde_json::from_value(json!({"event": "joinRoom", "data": {"roomId": "XK4T9Q"}}))
                .unwrap();
        assert_eq!(
            join,
            ClientEvent::JoinRoom {
                room_id: "XK4T9Q".into()
            }
        );

        let paddle: ClientEvent =
            serde_json::from_value(json!({"event": "paddleMove", "data": {"direction": "up"}}))
                .unwrap();
        assert_eq!(
            paddle,
            ClientEvent::PaddleMove {
                direction: PaddleDirection::Up
            }
        );
    }

    #[test]
    fn unknown_client_event_is_rejected() {
        let result = serde_json::from_value::<ClientEvent>(json!({"event": "teleportBall"}));
        assert!(result.is_err());
    }

    #[test]
    fn multiplayer_joined_uses_camel_case_fields() {
        let event = ServerEvent::MultiplayerJoined {
            room_id: "XK4T9Q".into(),
            player_num: 1,
            game_config: TableSize {
                width: 800.0,
                height: 600.0,
            },
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "multiplayerJoined");
        assert_eq!(value["data"]["roomId"], "XK4T9Q");
        assert_eq!(value["data"]["playerNum"], 1);
        // Table dimensions ride under the `gameConfig` key.
        assert_eq!(value["data"]["gameConfig"]["width"], 800.0);
        assert_eq!(value["data"]["gameConfig"]["height"], 600.0);
        assert!(value["data"].get("tableSize").is_none());
    }

    #[test]
    fn snapshot_serializes_with_wire_field_names() {
        let snap = Snapshot {
            ball: Ball {
                x: 400.0,
                y: 300.0,
                speed_x: 5.0,
                speed_y: -5.0,
                speed: 5.0,
            },
            paddles: Paddles {
                left: PaddlePosition { y: 250.0 },
                right: PaddlePosition { y: 250.0 },
            },
            scores: Scores {
                player1: 2,
                player2: 1,
            },
            game_started: true,
            game_over: false,
            winner: None,
            rallies: 3,
            current_rally: 4,
        };
        let event = ServerEvent::MultiplayerUpdate(snap);
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "multiplayerUpdate");
        let data = &value["data"];
        assert_eq!(data["ball"]["speedX"], 5.0);
        assert_eq!(data["paddles"]["left"]["y"], 250.0);
        assert_eq!(data["scores"]["player1"], 2);
        assert_eq!(data["gameStarted"], true);
        assert_eq!(data["gameOver"], false);
        assert_eq!(data["winner"], serde_json::Value::Null);
        assert_eq!(data["currentRally"], 4);
    }

    #[test]
    fn winner_serializes_as_player_string() {
        let value = serde_json::to_value(PlayerSide::Player2).unwrap();
        assert_eq!(value, "player2");
    }

    #[test]
    fn server_events_round_trip() {
        let events = [
            ServerEvent::WaitingForOpponent,
            ServerEvent::OpponentJoined { player_num: 2 },
            ServerEvent::OpponentDisconnected,
            ServerEvent::Error {
                message: "Room not found".into(),
            },
        ];
        for event in events {
            let text = serde_json::to_string(&event).unwrap();
            let back: ServerEvent = serde_json::from_str(&text).unwrap();
            assert_eq!(back, event);
        }
    }
}
