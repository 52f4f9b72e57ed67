//! Per-channel, per-game pickup settings.
//!
//! These types represent validated runtime configuration. Loading from disk
//! is the server crate's job; the engine only mutates settings through
//! [`GameConfig::set_option`], which re-validates on every change.

mod duration;
mod game;

pub use duration::{InvalidDuration, parse_duration};
pub use game::{GameConfig, TeamPickMode};
