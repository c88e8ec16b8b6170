use serde::Deserialize;

use volley_core::config::GameConfig;

/// Top-level server configuration, loaded from `volley.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub web_root: String,
    pub game: GameConfig,
    pub limits: LimitsConfig,
    pub rooms: RoomsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".to_string(),
            web_root: "web".to_string(),
            game: GameConfig::default(),
            limits: LimitsConfig::default(),
            rooms: RoomsConfig::default(),
        }
    }
}

/// Infrastructure limits (connection caps, buffer sizes, rate limits).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_ws_connections: usize,
    pub ws_rate_limit_per_sec: f64,
    pub client_message_buffer: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_ws_connections: 200,
            // Paddle input at one event per held-key frame stays under this.
            ws_rate_limit_per_sec: 120.0,
            client_message_buffer: 256,
        }
    }
}

/// Room lifecycle configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RoomsConfig {
    /// How long a fully disconnected room is kept before eviction.
    pub eviction_grace_secs: u64,
}

impl Default for RoomsConfig {
    fn default() -> Self {
        Self {
            eviction_grace_secs: 120,
        }
    }
}

impl ServerConfig {
    /// Validate configuration, logging errors for fatal issues.
    pub fn validate(&self) {
        if self.listen_addr.parse::<std::net::SocketAddr>().is_err() {
            tracing::error!(
                addr = %self.listen_addr,
                "listen_addr is not a valid socket address"
            );
            std::process::exit(1);
        }

        if self.limits.max_ws_connections == 0 {
            tracing::error!("limits.max_ws_connections must be > 0");
            std::process::exit(1);
        }
        if self.limits.ws_rate_limit_per_sec <= 0.0 {
            tracing::error!("limits.ws_rate_limit_per_sec must be > 0");
            std::process::exit(1);
        }
        if self.limits.client_message_buffer == 0 {
            tracing::error!("limits.client_message_buffer must be > 0");
            std::process::exit(1);
        }

        if self.rooms.eviction_grace_secs == 0 {
            tracing::error!("rooms.eviction_grace_secs must be > 0");
            std::process::exit(1);
        }

        if self.game.width <= 0.0 || self.game.height <= 0.0 {
            tracing::error!("game.width and game.height must be > 0");
            std::process::exit(1);
        }
        if self.game.tick_rate_hz <= 0.0 {
            tracing::error!("game.tick_rate_hz must be > 0");
            std::process::exit(1);
        }
        if self.game.paddle_height <= 0.0 || self.game.paddle_height > self.game.height {
            tracing::error!("game.paddle_height must fit the table");
            std::process::exit(1);
        }
        if self.game.winning_score == 0 {
            tracing::error!("game.winning_score must be > 0");
            std::process::exit(1);
        }
    }

    /// Load config from `volley.toml` if it exists, then apply env var overrides.
    pub fn load() -> Self {
        let mut config = match std::fs::read_to_string("volley.toml") {
            Ok(content) => match toml::from_str::<ServerConfig>(&content) {
                Ok(cfg) => {
                    tracing::info!("Loaded configuration from volley.toml");
                    cfg
                },
                Err(e) => {
                    tracing::warn!("Failed to parse volley.toml: {e}, using defaults");
                    ServerConfig::default()
                },
            },
            Err(_) => {
                tracing::info!("No volley.toml found, using defaults");
                ServerConfig::default()
            },
        };

        // Environment variable overrides
        if let Ok(addr) = std::env::var("VOLLEY_LISTEN_ADDR")
            && !addr.is_empty()
        {
            config.listen_addr = addr;
        }
        if let Ok(root) = std::env::var("VOLLEY_WEB_ROOT")
            && !root.is_empty()
        {
            config.web_root = root;
        }
        if let Ok(val) = std::env::var("VOLLEY_MAX_WS_CONNECTIONS")
            && let Ok(n) = val.parse::<usize>()
        {
            config.limits.max_ws_connections = n;
        }
        if let Ok(val) = std::env::var("VOLLEY_WS_RATE_LIMIT")
            && let Ok(n) = val.parse::<f64>()
        {
            config.limits.ws_rate_limit_per_sec = n;
        }
        if let Ok(val) = std::env::var("VOLLEY_EVICTION_GRACE_SECS")
            && let Ok(n) = val.parse::<u64>()
        {
            config.rooms.eviction_grace_secs = n;
        }

        config
    }
}
