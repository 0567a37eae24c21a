//! HTTP server surface
//!
//! Listener, per-connection routing and the compiled-in configuration.

pub mod config;
pub mod connection;
pub mod listener;

pub use config::ServerConfig;
pub use connection::Connection;
pub use listener::StreamServer;
