//! Configuration and the peer model shared by every stage

pub mod config;
pub mod models;

pub use config::AppConfig;
pub use models::{Network, Peer, PingOutcome, Protocol};
