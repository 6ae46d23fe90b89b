//! A disposable in-memory server speaking a subset of the Redis protocol.
//!
//! The crate is meant to be embedded in test suites: start a [`Server`] on a
//! local listener, point a Redis client at it and seed or inspect data
//! directly through [`Server::with_database`]. It supports:
//!
//! - Strings, lists, hashes, sets and sorted sets with lazy key expiry
//! - Key space commands over multiple selectable databases
//! - Publish/subscribe on channels and glob patterns
//! - MULTI/EXEC transactions
//!
//! Nothing is persisted; all data is discarded when the server goes away.

pub mod commands;
pub mod config;
pub mod connection;
pub mod glob;
pub mod input;
pub mod key_value_store;
pub mod pub_sub;
pub mod resp;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use server::Server;
