pub mod config;
pub mod match_state;
pub mod net;
pub mod physics;
pub mod room;
