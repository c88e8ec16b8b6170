//! WebSocket gateway: seats connections into rooms and relays the event
//! protocol between clients and the authoritative simulation.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use volley_core::match_state::{PaddleDirection, PlayerSide};
use volley_core::net::messages::{ClientEvent, ServerEvent};
use volley_core::net::protocol::{MAX_MESSAGE_SIZE, decode_client_event, encode_server_event};

use crate::registry::{MatchOutcome, RoomJoin, SharedRoom};
use crate::state::{AppState, ConnectionGuard};
use crate::ticker;

pub async fn ws_handler(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> Result<axum::response::Response, StatusCode> {
    let max_ws = state.config.limits.max_ws_connections;
    let current = state.ws_connection_count.load(Ordering::Relaxed);
    if current >= max_ws {
        tracing::warn!(current, max = max_ws, "WS connection limit reached");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    Ok(ws
        .on_upgrade(move |socket| handle_socket(socket, state))
        .into_response())
}

/// The room this connection is seated in, once a seat event succeeds.
struct Binding {
    code: String,
    side: PlayerSide,
    room: SharedRoom,
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let _guard = ConnectionGuard::new(Arc::clone(&state.ws_connection_count));
    let connection_id = Uuid::new_v4();
    let (ws_sender, mut ws_receiver) = socket.split();

    let (tx, rx) = mpsc::channel::<String>(state.config.limits.client_message_buffer);
    spawn_writer(ws_sender, rx);

    let mut binding: Option<Binding> = None;
    read_loop(&mut ws_receiver, &state, connection_id, &tx, &mut binding).await;

    if let Some(binding) = binding {
        handle_disconnect(&state, &binding, connection_id).await;
    } else {
        tracing::debug!(%connection_id, "Unseated client disconnected");
    }
}

fn spawn_writer(
    mut ws_sender: futures::stream::SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<String>,
) {
    tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if ws_sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });
}

/// Queue an event on this connection's writer. Errors mean the socket is
/// gone; the read loop will notice on its own.
async fn send_event(tx: &mpsc::Sender<String>, event: &ServerEvent) {
    match encode_server_event(event) {
        Ok(text) => {
            let _ = tx.send(text).await;
        },
        Err(e) => tracing::warn!(error = %e, "Failed to encode server event"),
    }
}

/// Per-connection rate limiter (token bucket).
struct RateLimiter {
    tokens: f64,
    last_refill: tokio::time::Instant,
    max_tokens: f64,
    refill_rate: f64, // tokens per second
}

impl RateLimiter {
    fn new(max_tokens: f64, refill_rate: f64) -> Self {
        Self {
            tokens: max_tokens,
            last_refill: tokio::time::Instant::now(),
            max_tokens,
            refill_rate,
        }
    }

    /// Returns true if the message is allowed; false if rate-limited.
    fn allow(&mut self) -> bool {
        let now = tokio::time::Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.max_tokens);
        self.last_refill = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

async fn read_loop(
    ws_receiver: &mut futures::stream::SplitStream<WebSocket>,
    state: &AppState,
    connection_id: Uuid,
    tx: &mpsc::Sender<String>,
    binding: &mut Option<Binding>,
) {
    let rate = state.config.limits.ws_rate_limit_per_sec;
    let mut rate_limiter = RateLimiter::new(rate, rate);

    while let Some(Ok(msg)) = ws_receiver.next().await {
        let text = match msg {
            Message::Text(t) => t,
            Message::Close(_) => break,
            _ => continue,
        };

        if !rate_limiter.allow() {
            tracing::warn!(%connection_id, "Rate limited");
            continue;
        }

        if text.len() > MAX_MESSAGE_SIZE {
            continue;
        }

        let event = match decode_client_event(&text) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(%connection_id, error = %e, "Ignoring undecodable frame");
                continue;
            },
        };

        match event {
            ClientEvent::QuickMatch | ClientEvent::CreateRoom | ClientEvent::JoinRoom { .. } => {
                if binding.is_some() {
                    send_event(
                        tx,
                        &ServerEvent::Error {
                            message: "Already in a room".to_string(),
                        },
                    )
                    .await;
                    continue;
                }
                *binding = seat(state, event, connection_id, tx).await;
            },

            ClientEvent::PaddleMove { direction } => {
                let Some(binding) = binding.as_ref() else {
                    continue;
                };
                apply_paddle_move(binding, direction);
            },

            ClientEvent::RestartMultiplayer => {
                let Some(binding) = binding.as_ref() else {
                    continue;
                };
                restart_match(binding);
                tracing::info!(%connection_id, room = %binding.code, "Match restarted");
            },
        }
    }
}

/// Handle one of the three seat events. Returns the binding on success.
async fn seat(
    state: &AppState,
    event: ClientEvent,
    connection_id: Uuid,
    tx: &mpsc::Sender<String>,
) -> Option<Binding> {
    let join = {
        let mut rooms = state.rooms.write().await;
        match event {
            ClientEvent::QuickMatch => rooms.quick_match(connection_id, tx.clone()),
            ClientEvent::CreateRoom => rooms.create_room(connection_id, tx.clone()),
            ClientEvent::JoinRoom { ref room_id } => {
                match rooms.join_room(room_id, connection_id, tx.clone()) {
                    Ok(join) => join,
                    Err(e) => {
                        drop(rooms);
                        tracing::debug!(%connection_id, room = %room_id, error = %e, "Join rejected");
                        send_event(
                            tx,
                            &ServerEvent::Error {
                                message: e.to_string(),
                            },
                        )
                        .await;
                        return None;
                    },
                }
            },
            _ => return None,
        }
    };

    send_event(
        tx,
        &ServerEvent::MultiplayerJoined {
            room_id: join.code.clone(),
            player_num: join.side.player_num(),
            game_config: join.table_size,
        },
    )
    .await;

    match join.outcome {
        MatchOutcome::Created => {
            tracing::info!(%connection_id, room = %join.code, "Room opened, waiting for opponent");
            send_event(tx, &ServerEvent::WaitingForOpponent).await;
        },
        MatchOutcome::Paired => {
            tracing::info!(%connection_id, room = %join.code, "Opponent seated, match starting");
            announce_pairing(&join);
            ticker::start(&join.room);
        },
    }

    Some(Binding {
        code: join.code.clone(),
        side: join.side,
        room: Arc::clone(&join.room),
    })
}

/// Tell each seat its opponent arrived. Each side receives the opposing
/// player number, so both clients know which paddle the newcomer drives.
fn announce_pairing(join: &RoomJoin) {
    let entry = join.room.lock().unwrap();
    for side in [PlayerSide::Player1, PlayerSide::Player2] {
        let event = ServerEvent::OpponentJoined {
            player_num: side.opponent().player_num(),
        };
        if let Some(sender) = entry.sender(side) {
            match encode_server_event(&event) {
                Ok(text) => {
                    let _ = sender.try_send(text);
                },
                Err(e) => tracing::warn!(error = %e, "Failed to encode opponentJoined"),
            }
        }
    }
}

/// Paddle input applies immediately rather than waiting for a tick
/// boundary, so input latency is one network hop, not a frame.
fn apply_paddle_move(binding: &Binding, direction: PaddleDirection) {
    let mut entry = binding.room.lock().unwrap();
    let config = entry.room.config.clone();
    entry.room.state.move_paddle(binding.side, direction, &config);
}

fn restart_match(binding: &Binding) {
    {
        let mut entry = binding.room.lock().unwrap();
        let config = entry.room.config.clone();
        entry.room.state.restart(&config);

        // Push the reset state out immediately so clients redraw before the
        // next tick lands.
        let snapshot = entry.room.state.snapshot();
        match encode_server_event(&ServerEvent::MultiplayerUpdate(snapshot)) {
            Ok(text) => {
                for sender in entry.senders() {
                    let _ = sender.try_send(text.clone());
                }
            },
            Err(e) => tracing::warn!(error = %e, "Failed to encode restart snapshot"),
        }
    }
    ticker::start(&binding.room);
}

/// Seat teardown: suspend the match, notify the peer, and schedule a
/// delayed eviction check for the room.
async fn handle_disconnect(state: &AppState, binding: &Binding, connection_id: Uuid) {
    let peer = {
        let mut entry = binding.room.lock().unwrap();
        entry.room.disconnect(binding.side);
        entry.clear_sender(binding.side);
        if let Some(handle) = entry.ticker.take() {
            handle.abort();
        }
        entry.sender(binding.side.opponent()).cloned()
    };

    tracing::info!(%connection_id, room = %binding.code, "Player disconnected");

    if let Some(peer) = peer {
        match encode_server_event(&ServerEvent::OpponentDisconnected) {
            Ok(text) => {
                let _ = peer.try_send(text);
            },
            Err(e) => tracing::warn!(error = %e, "Failed to encode opponentDisconnected"),
        }
    }

    let registry = Arc::clone(&state.rooms);
    let code = binding.code.clone();
    let grace = Duration::from_secs(state.config.rooms.eviction_grace_secs);
    tokio::spawn(async move {
        tokio::time::sleep(grace).await;
        let mut rooms = registry.write().await;
        if rooms.evict_if_abandoned(&code) {
            tracing::info!(room = %code, "Evicted abandoned room");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rate_limiter_allows_within_budget() {
        let mut limiter = RateLimiter::new(5.0, 5.0);
        for _ in 0..5 {
            assert!(limiter.allow());
        }
        assert!(!limiter.allow(), "sixth burst message should be dropped");
    }

    #[tokio::test]
    async fn rate_limiter_refills_over_time() {
        tokio::time::pause();
        let mut limiter = RateLimiter::new(2.0, 2.0);
        assert!(limiter.allow());
        assert!(limiter.allow());
        assert!(!limiter.allow());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(limiter.allow(), "tokens should refill after a second");
    }
}
