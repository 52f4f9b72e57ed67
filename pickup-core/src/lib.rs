#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod config;
pub mod draft;
pub mod error;
pub mod events;
pub mod history;
pub mod pickup;
pub mod player;
pub mod registry;
pub mod scheduler;
pub mod stats;
pub mod storage;
