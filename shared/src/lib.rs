//! Protocol constants shared by the relay server and anything that talks to it.

/// Default port for IRC
pub const DEFAULT_PORT: u16 = 6667;

/// Prefix used on every numbered reply unless configured otherwise.
pub const SERVER_NAME: &str = "IRCServer";

/// Longest line, in bytes, the server will read before truncating.
pub const MESSAGE_SIZE: usize = 1024;

/// Lines that may wait for one client's writer before the client is treated as gone.
pub const OUTBOX_SIZE: usize = 512;
