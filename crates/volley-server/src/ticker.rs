//! Per-room simulation loop. Each running room owns one tokio task that
//! advances the match at the configured tick rate and broadcasts the
//! resulting snapshot to both seats.

use std::sync::Arc;
use std::time::Duration;

use volley_core::match_state::Phase;
use volley_core::net::messages::ServerEvent;
use volley_core::net::protocol::encode_server_event;

use crate::registry::SharedRoom;

/// Start the tick loop for a room. Idempotent: a room that already has a
/// live ticker keeps it.
pub fn start(room: &SharedRoom) {
    let mut entry = room.lock().unwrap();
    if entry.ticker.is_some() {
        return;
    }
    let tick = Duration::from_secs_f64(1.0 / entry.room.config.tick_rate_hz);
    let handle = tokio::spawn(run_ticker(Arc::clone(room), tick));
    entry.ticker = Some(handle);
}

/// Send a text frame to every attached seat. Slow clients lose frames
/// rather than stalling the loop.
pub fn broadcast(room: &SharedRoom, text: &str) {
    let entry = room.lock().unwrap();
    for sender in entry.senders() {
        if let Err(e) = sender.try_send(text.to_string()) {
            tracing::debug!(room = %entry.room.code, error = %e, "Dropping frame for slow client");
        }
    }
}

async fn run_ticker(room: SharedRoom, tick: Duration) {
    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        interval.tick().await;

        let (text, finished) = {
            let mut entry = room.lock().unwrap();
            let entry = &mut *entry;
            if entry.room.state.phase != Phase::Running {
                // Paused or already over; stop quietly. Restart spawns a
                // fresh ticker.
                entry.ticker = None;
                return;
            }

            entry.room.state.tick(&entry.room.config);
            let snapshot = entry.room.state.snapshot();
            let finished = entry.room.state.phase == Phase::GameOver;

            match encode_server_event(&ServerEvent::MultiplayerUpdate(snapshot)) {
                Ok(text) => (text, finished),
                Err(e) => {
                    tracing::error!(room = %entry.room.code, error = %e, "Failed to encode snapshot");
                    entry.ticker = None;
                    return;
                },
            }
        };

        broadcast(&room, &text);

        if finished {
            // The final snapshot carried gameOver and the winner.
            room.lock().unwrap().ticker = None;
            return;
        }
    }
}
