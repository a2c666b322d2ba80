//! Authoritative capture-the-flag game server.
//!
//! The [`world::World`] holds the whole match and is driven by a single game
//! task: commands from sockets and fixed-rate ticks both mutate it through
//! `&mut`, and the events they queue are routed to connections afterwards.

pub mod commands;
pub mod config;
pub mod error;
pub mod geometry;
pub mod items;
pub mod lifecycle;
pub mod model;
pub mod protocol;
pub mod server;
pub mod tick;
pub mod timers;
pub mod world;

pub use config::{ServerConfig, WorldConfig};
pub use error::AppResult;
pub use world::World;
