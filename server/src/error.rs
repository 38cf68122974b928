use std::io;
use thiserror::Error;
use uuid::Uuid;

/// Why a nickname could not be claimed. The registry is left unchanged in both cases.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegisterError {
    #[error("nickname {0} does not start with a letter or digit")]
    InvalidNick(String),

    #[error("nickname {0} is already in use")]
    NickInUse(String),
}

/// Transport faults. These are fatal to the one connection they happen on.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("connection {0} is closed")]
    Closed(Uuid),
}

pub type Result<T> = std::result::Result<T, Error>;
