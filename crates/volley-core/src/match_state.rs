//! The per-room state machine: one match's paddles, ball, scores, and
//! lifecycle. All mutation goes through the operations here; the physics
//! itself lives in [`crate::physics`].

use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::net::messages::{PaddlePosition, Paddles, Snapshot};
use crate::physics::{self, Ball, PaddleSide};

/// A player position within a room. Serialized with the wire names used in
/// snapshots and the winner field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerSide {
    #[serde(rename = "player1")]
    Player1,
    #[serde(rename = "player2")]
    Player2,
}

impl PlayerSide {
    pub fn player_num(self) -> u8 {
        match self {
            Self::Player1 => 1,
            Self::Player2 => 2,
        }
    }

    pub fn opponent(self) -> Self {
        match self {
            Self::Player1 => Self::Player2,
            Self::Player2 => Self::Player1,
        }
    }

    /// Player 1 defends the left paddle, player 2 the right.
    pub fn paddle(self) -> PaddleSide {
        match self {
            Self::Player1 => PaddleSide::Left,
            Self::Player2 => PaddleSide::Right,
        }
    }
}

/// Match lifecycle. `GameOver` is terminal until an explicit restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Waiting,
    Ready,
    Running,
    Paused,
    GameOver,
}

/// Paddle intents accepted from clients. Anything else fails to
/// deserialize and is dropped upstream as a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaddleDirection {
    Up,
    Down,
}

/// Per-player point counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores {
    pub player1: u32,
    pub player2: u32,
}

impl Scores {
    pub fn get(&self, side: PlayerSide) -> u32 {
        match side {
            PlayerSide::Player1 => self.player1,
            PlayerSide::Player2 => self.player2,
        }
    }

    fn increment(&mut self, side: PlayerSide) {
        match side {
            PlayerSide::Player1 => self.player1 += 1,
            PlayerSide::Player2 => self.player2 += 1,
        }
    }
}

/// Authoritative state of one match.
#[derive(Debug)]
pub struct MatchState {
    pub ball: Ball,
    pub left_paddle_y: f64,
    pub right_paddle_y: f64,
    pub scores: Scores,
    /// Completed point-ending exchanges.
    pub total_rallies: u32,
    /// Paddle bounces since the last point.
    pub current_rally: u32,
    pub phase: Phase,
    pub winner: Option<PlayerSide>,
    rng: SmallRng,
}

impl MatchState {
    pub fn new(config: &GameConfig) -> Self {
        Self::with_rng(config, SmallRng::from_os_rng())
    }

    /// Deterministic construction for tests.
    pub fn with_seed(config: &GameConfig, seed: u64) -> Self {
        Self::with_rng(config, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(config: &GameConfig, rng: SmallRng) -> Self {
        let paddle_y = config.height / 2.0 - config.paddle_height / 2.0;
        let mut state = Self {
            ball: Ball {
                x: 0.0,
                y: 0.0,
                speed_x: 0.0,
                speed_y: 0.0,
                speed: 0.0,
            },
            left_paddle_y: paddle_y,
            right_paddle_y: paddle_y,
            scores: Scores::default(),
            total_rallies: 0,
            current_rally: 0,
            phase: Phase::Waiting,
            winner: None,
            rng,
        };
        state.reset_ball(config);
        state
    }

    /// Random serve sign, the only nondeterminism in the simulation.
    fn random_sign(&mut self) -> f64 {
        use rand::Rng;
        if self.rng.random_bool(0.5) { 1.0 } else { -1.0 }
    }

    /// Recenter the ball and serve in a random direction: independent signs
    /// on both axes give a 45-degree spread, randomized left/right.
    pub fn reset_ball(&mut self, config: &GameConfig) {
        let sx = self.random_sign();
        let sy = self.random_sign();
        self.ball = Ball {
            x: config.width / 2.0,
            y: config.height / 2.0,
            speed_x: config.initial_ball_speed * sx,
            speed_y: config.initial_ball_speed * sy,
            speed: config.initial_ball_speed,
        };
    }

    /// Transition `Waiting -> Ready -> Running` once the second slot fills.
    pub fn begin(&mut self) {
        if self.phase == Phase::Waiting {
            self.phase = Phase::Ready;
        }
        if self.phase == Phase::Ready {
            self.phase = Phase::Running;
        }
    }

    /// A disconnect mid-match suspends play; the scheduler stops with it.
    pub fn pause(&mut self) {
        if self.phase == Phase::Running {
            self.phase = Phase::Paused;
        }
    }

    /// Apply a paddle intent immediately (not queued to a tick boundary),
    /// clamped into the table.
    pub fn move_paddle(&mut self, side: PlayerSide, direction: PaddleDirection, config: &GameConfig) {
        let paddle_y = match side.paddle() {
            PaddleSide::Left => &mut self.left_paddle_y,
            PaddleSide::Right => &mut self.right_paddle_y,
        };
        *paddle_y = match direction {
            PaddleDirection::Up => (*paddle_y - config.paddle_speed).max(0.0),
            PaddleDirection::Down => (*paddle_y + config.paddle_speed).min(config.paddle_max_y()),
        };
    }

    /// One simulation step. No-op unless the match is running.
    ///
    /// Order matters for determinism: advance, wall reflection, then paddle
    /// checks against both paddles (on the already-reflected position),
    /// then the scoring check.
    pub fn tick(&mut self, config: &GameConfig) {
        if self.phase != Phase::Running {
            return;
        }

        physics::advance_ball(&mut self.ball);
        physics::reflect_off_walls(&mut self.ball, config);

        for (paddle_y, side) in [
            (self.left_paddle_y, PaddleSide::Left),
            (self.right_paddle_y, PaddleSide::Right),
        ] {
            if physics::check_paddle_collision(&self.ball, paddle_y, side, config) {
                physics::resolve_paddle_collision(&mut self.ball, paddle_y, side, config);
                self.current_rally += 1;
            }
        }

        if let Some(scorer) = physics::check_scoring(&self.ball, config) {
            self.score_point(scorer, config);
        }
    }

    /// Record a point: bump the scorer, close the rally, and either end the
    /// match at the winning threshold or serve a fresh ball.
    fn score_point(&mut self, scorer: PlayerSide, config: &GameConfig) {
        self.scores.increment(scorer);
        self.total_rallies += 1;
        self.current_rally = 0;

        if self.scores.get(scorer) >= config.winning_score {
            self.phase = Phase::GameOver;
            self.winner = Some(scorer);
        } else {
            self.reset_ball(config);
        }
    }

    /// Rematch: zero the scores and rally counters, serve a fresh ball, and
    /// run again. Valid from any phase.
    pub fn restart(&mut self, config: &GameConfig) {
        self.scores = Scores::default();
        self.total_rallies = 0;
        self.current_rally = 0;
        self.winner = None;
        self.reset_ball(config);
        self.phase = Phase::Running;
    }

    /// The full serializable view broadcast to both clients each tick.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            ball: self.ball,
            paddles: Paddles {
                left: PaddlePosition { y: self.left_paddle_y },
                right: PaddlePosition { y: self.right_paddle_y },
            },
            scores: self.scores,
            game_started: self.phase == Phase::Running,
            game_over: self.phase == Phase::GameOver,
            winner: self.winner,
            rallies: self.total_rallies,
            current_rally: self.current_rally,
        }
    }
}
