use crate::{connection::Connection, error::RegisterError};
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

/// Who a broadcast reaches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Every current member of one channel.
    Channel(String),
    /// Every registered connection.
    All,
    /// A nickname plus everyone sharing at least one channel with it, each once.
    Neighbours(String),
}

/// Authoritative nickname directory and channel membership table.
///
/// Both maps sit behind one lock, so every operation here is all-or-nothing with respect to
/// every other. Nothing outside this type touches them.
#[derive(Debug, Default)]
pub struct Registry {
    inner: Mutex<Directory>,
}

#[derive(Debug, Default)]
struct Directory {
    nicks: HashMap<String, Connection>,
    /// Members are kept in join order for the NAMES reply.
    channels: HashMap<String, Vec<String>>,
}

/// A nickname must start with an ASCII letter or digit and may not contain whitespace.
pub fn is_valid_nick(nick: &str) -> bool {
    nick.chars().next().is_some_and(|c| c.is_ascii_alphanumeric())
        && !nick.chars().any(char::is_whitespace)
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `nick` for `connection`. Nothing is overwritten on failure.
    pub fn register(&self, nick: &str, connection: Connection) -> Result<(), RegisterError> {
        if !is_valid_nick(nick) {
            return Err(RegisterError::InvalidNick(nick.to_string()));
        }

        let mut directory = self.inner.lock();
        if directory.nicks.contains_key(nick) {
            return Err(RegisterError::NickInUse(nick.to_string()));
        }
        directory.nicks.insert(nick.to_string(), connection);
        Ok(())
    }

    /// Move the directory entry and every channel membership of `old` over to `new`.
    ///
    /// Renaming to the nickname already held is a no-op.
    pub fn rename(&self, old: &str, new: &str) -> Result<(), RegisterError> {
        if !is_valid_nick(new) {
            return Err(RegisterError::InvalidNick(new.to_string()));
        }

        let mut directory = self.inner.lock();
        if old == new {
            return Ok(());
        }
        if directory.nicks.contains_key(new) {
            return Err(RegisterError::NickInUse(new.to_string()));
        }
        if let Some(connection) = directory.nicks.remove(old) {
            directory.nicks.insert(new.to_string(), connection);
        }
        for members in directory.channels.values_mut() {
            if let Some(member) = members.iter_mut().find(|member| member.as_str() == old) {
                *member = new.to_string();
            }
        }
        Ok(())
    }

    /// Add `nick` to `channel`, creating the channel if needed, and return its members afterwards.
    /// Joining twice leaves the member list as it was.
    pub fn join(&self, nick: &str, channel: &str) -> Vec<String> {
        let mut directory = self.inner.lock();
        let members = directory.channels.entry(channel.to_string()).or_default();
        if !members.iter().any(|member| member == nick) {
            members.push(nick.to_string());
        }
        members.clone()
    }

    pub fn lookup_nick(&self, nick: &str) -> Option<Connection> {
        self.inner.lock().nicks.get(nick).cloned()
    }

    pub fn lookup_channel(&self, channel: &str) -> Option<Vec<String>> {
        self.inner.lock().channels.get(channel).cloned()
    }

    /// Drop `nick` from the directory and from every channel. Return the channels it was removed
    /// from. Emptied channels are kept.
    pub fn deregister(&self, nick: &str) -> Vec<String> {
        let mut directory = self.inner.lock();
        directory.nicks.remove(nick);

        let mut departed = vec![];
        for (name, members) in directory.channels.iter_mut() {
            if let Some(index) = members.iter().position(|member| member == nick) {
                members.remove(index);
                departed.push(name.clone());
            }
        }
        departed
    }

    /// Snapshot the connections `scope` reaches, leaving out `exclude`.
    pub fn recipients(&self, scope: &Scope, exclude: Option<Uuid>) -> Vec<Connection> {
        let directory = self.inner.lock();
        let included = |connection: &&Connection| Some(connection.id) != exclude;

        match scope {
            Scope::All => directory.nicks.values().filter(included).cloned().collect(),
            Scope::Channel(name) => directory
                .channels
                .get(name)
                .into_iter()
                .flatten()
                .filter_map(|member| directory.nicks.get(member))
                .filter(included)
                .cloned()
                .collect(),
            Scope::Neighbours(nick) => {
                let mut nicks = vec![nick.as_str()];
                for members in directory.channels.values() {
                    if members.iter().any(|member| member == nick) {
                        for member in members {
                            if !nicks.contains(&member.as_str()) {
                                nicks.push(member.as_str());
                            }
                        }
                    }
                }
                nicks
                    .into_iter()
                    .filter_map(|member| directory.nicks.get(member))
                    .filter(included)
                    .cloned()
                    .collect()
            }
        }
    }

    pub fn nick_count(&self) -> usize {
        self.inner.lock().nicks.len()
    }
}
