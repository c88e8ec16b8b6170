use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use volley_core::net::messages::{ClientEvent, ServerEvent};
use volley_core::net::protocol::{decode_server_event, encode_client_event};

use volley_server::build_app;
use volley_server::config::{LimitsConfig, ServerConfig};

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct TestServer {
    pub addr: SocketAddr,
    _server: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Start a test server with rate limiting loosened for burst-heavy tests.
    pub async fn new() -> Self {
        Self::from_config(test_config()).await
    }

    pub async fn from_config(config: ServerConfig) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (app, _state) = build_app(config);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Give the server a moment to start accepting
        tokio::time::sleep(Duration::from_millis(20)).await;

        Self {
            addr,
            _server: handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }
}

pub fn test_config() -> ServerConfig {
    ServerConfig {
        limits: LimitsConfig {
            ws_rate_limit_per_sec: 10_000.0,
            ..LimitsConfig::default()
        },
        ..ServerConfig::default()
    }
}

/// Connect a WebSocket client to the given URL.
pub async fn ws_connect(url: &str) -> WsStream {
    let (stream, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    stream
}

/// Send a ClientEvent as a text frame.
pub async fn ws_send(stream: &mut WsStream, event: &ClientEvent) {
    let text = encode_client_event(event).unwrap();
    stream.send(Message::Text(text.into())).await.unwrap();
}

/// Read the next ServerEvent from the stream (5s timeout).
pub async fn ws_read_event(stream: &mut WsStream) -> ServerEvent {
    let deadline = Duration::from_secs(5);
    tokio::time::timeout(deadline, async {
        loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => return decode_server_event(&text).unwrap(),
                Some(Ok(Message::Close(_))) => panic!("WebSocket closed unexpectedly"),
                Some(Err(e)) => panic!("WebSocket error: {e}"),
                None => panic!("WebSocket stream ended"),
                _ => continue,
            }
        }
    })
    .await
    .expect("Timed out waiting for WebSocket event")
}

/// Try to read a ServerEvent, returning None on timeout.
pub async fn ws_try_read_event(stream: &mut WsStream, timeout_ms: u64) -> Option<ServerEvent> {
    let deadline = Duration::from_millis(timeout_ms);
    tokio::time::timeout(deadline, async {
        loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => return decode_server_event(&text).unwrap(),
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => {
                    panic!("WebSocket error or closed")
                },
                _ => continue,
            }
        }
    })
    .await
    .ok()
}

/// Read events until one matches the predicate, skipping snapshot spam.
pub async fn ws_read_until(
    stream: &mut WsStream,
    mut pred: impl FnMut(&ServerEvent) -> bool,
) -> ServerEvent {
    let deadline = Duration::from_secs(5);
    tokio::time::timeout(deadline, async {
        loop {
            let event = ws_read_event(stream).await;
            if pred(&event) {
                return event;
            }
        }
    })
    .await
    .expect("Timed out waiting for matching event")
}

/// Quick-match this stream and return (room_id, player_num).
pub async fn ws_quick_match(stream: &mut WsStream) -> (String, u8) {
    ws_send(stream, &ClientEvent::QuickMatch).await;
    match ws_read_event(stream).await {
        ServerEvent::MultiplayerJoined {
            room_id,
            player_num,
            ..
        } => (room_id, player_num),
        other => panic!("Expected multiplayerJoined, got: {other:?}"),
    }
}
