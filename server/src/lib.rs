//! A minimal chat relay speaking a subset of IRC: NICK, JOIN, PRIVMSG and PING.
//!
//! Every client gets its own handler thread. All handlers share one [`Registry`] holding the
//! nickname directory and channel memberships.

pub mod broadcast;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod message;
pub mod registry;
pub mod server;

pub use config::Config;
pub use registry::{Registry, Scope};
pub use server::Server;
