//! Pure ball/paddle physics. No state beyond what the caller passes in, so
//! every function here is deterministic given its inputs.

use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::match_state::PlayerSide;

/// Ball kinematics. `speed` is the scalar magnitude bound that paddle
/// bounces grow and cap; `speed_x`/`speed_y` are the per-tick velocity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ball {
    pub x: f64,
    pub y: f64,
    pub speed_x: f64,
    pub speed_y: f64,
    pub speed: f64,
}

/// Which paddle a collision test refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaddleSide {
    Left,
    Right,
}

impl PaddleSide {
    /// Outward x direction for a ball leaving this paddle.
    fn direction(self) -> f64 {
        match self {
            Self::Left => 1.0,
            Self::Right => -1.0,
        }
    }
}

/// Advance the ball one fixed timestep (one tick = one frame of motion).
pub fn advance_ball(ball: &mut Ball) {
    ball.x += ball.speed_x;
    ball.y += ball.speed_y;
}

/// Reflect the ball off the top/bottom walls, clamping it back into the
/// table. Pure reflection, no energy loss.
pub fn reflect_off_walls(ball: &mut Ball, config: &GameConfig) {
    if ball.y <= 0.0 || ball.y >= config.ball_max_y() {
        ball.speed_y = -ball.speed_y;
        ball.y = ball.y.clamp(0.0, config.ball_max_y());
    }
}

/// AABB-style paddle test: the ball must be inside the paddle's horizontal
/// collision band, moving toward that paddle, and vertically overlapping it.
pub fn check_paddle_collision(
    ball: &Ball,
    paddle_y: f64,
    side: PaddleSide,
    config: &GameConfig,
) -> bool {
    let in_band = match side {
        PaddleSide::Left => ball.x <= config.left_paddle_face() && ball.speed_x < 0.0,
        PaddleSide::Right => ball.x >= config.right_paddle_face() && ball.speed_x > 0.0,
    };
    in_band
        && ball.y + config.ball_size >= paddle_y
        && ball.y <= paddle_y + config.paddle_height
}

/// Rebound the ball off a paddle.
///
/// The normalized intersection offset `u in [-1, 1]` (paddle center minus
/// ball center over half the paddle height) maps to a bounce angle of
/// `u * max_bounce_angle`; the scalar speed grows by `speed_growth` up to
/// `max_ball_speed`. The ball is repositioned flush against the paddle face
/// so the same contact cannot re-trigger next tick.
pub fn resolve_paddle_collision(
    ball: &mut Ball,
    paddle_y: f64,
    side: PaddleSide,
    config: &GameConfig,
) {
    let half = config.paddle_height / 2.0;
    let offset = (paddle_y + half) - (ball.y + config.ball_size / 2.0);
    let u = (offset / half).clamp(-1.0, 1.0);
    let angle = u * config.max_bounce_angle;

    ball.speed = (ball.speed * config.speed_growth).min(config.max_ball_speed);
    ball.speed_x = side.direction() * ball.speed * angle.cos();
    ball.speed_y = -ball.speed * angle.sin();
    ball.x = match side {
        PaddleSide::Left => config.left_paddle_face(),
        PaddleSide::Right => config.right_paddle_face(),
    };
}

/// Point check: a ball past the left edge scores for player 2, past the
/// right edge for player 1. At most one side can score per tick.
pub fn check_scoring(ball: &Ball, config: &GameConfig) -> Option<PlayerSide> {
    if ball.x < 0.0 {
        Some(PlayerSide::Player2)
    } else if ball.x > config.width {
        Some(PlayerSide::Player1)
    } else {
        None
    }
}
