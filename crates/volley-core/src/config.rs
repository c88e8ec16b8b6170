use serde::{Deserialize, Serialize};

/// Table geometry and simulation constants for a match.
///
/// All distances are in table units; one tick applies one frame's worth of
/// motion, so speeds are units per tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub width: f64,
    pub height: f64,
    pub paddle_width: f64,
    pub paddle_height: f64,
    /// Horizontal gap between a side wall and its paddle face.
    pub paddle_inset: f64,
    pub ball_size: f64,
    pub paddle_speed: f64,
    pub initial_ball_speed: f64,
    pub max_ball_speed: f64,
    /// Multiplier applied to the ball's scalar speed on each paddle bounce.
    pub speed_growth: f64,
    /// Bounce angle at the paddle's outermost edge, in radians.
    pub max_bounce_angle: f64,
    pub tick_rate_hz: f64,
    pub winning_score: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            paddle_width: 15.0,
            paddle_height: 100.0,
            paddle_inset: 30.0,
            ball_size: 12.0,
            paddle_speed: 8.0,
            initial_ball_speed: 5.0,
            max_ball_speed: 15.0,
            speed_growth: 1.05,
            max_bounce_angle: std::f64::consts::FRAC_PI_3,
            tick_rate_hz: 60.0,
            winning_score: 7,
        }
    }
}

impl GameConfig {
    /// Largest y the ball's top-left corner may occupy.
    pub fn ball_max_y(&self) -> f64 {
        self.height - self.ball_size
    }

    /// Largest y a paddle's top edge may occupy.
    pub fn paddle_max_y(&self) -> f64 {
        self.height - self.paddle_height
    }

    /// x of the left paddle's inner face (the surface the ball rebounds off).
    pub fn left_paddle_face(&self) -> f64 {
        self.paddle_inset + self.paddle_width
    }

    /// x where a ball resting against the right paddle's inner face sits.
    pub fn right_paddle_face(&self) -> f64 {
        self.width - self.paddle_inset - self.paddle_width - self.ball_size
    }
}
