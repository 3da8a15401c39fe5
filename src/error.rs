use thiserror::Error;

use crate::game::PlayerId;
use crate::session::ChannelId;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

/// Session lifecycle errors surfaced to callers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("a game is already running in channel {0}")]
    AlreadyActive(ChannelId),

    #[error("no game in channel {0}")]
    NotFound(ChannelId),

    #[error("the game in channel {0} is full")]
    SessionFull(ChannelId),

    #[error("the game in channel {0} does not take a second player")]
    WrongMode(ChannelId),

    #[error("player {0} is already in this game")]
    AlreadyJoined(PlayerId),

    #[error("channel {0} no longer exists")]
    ChannelGone(ChannelId),
}

/// Failure to publish a tick
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// The destination no longer exists; the session cannot continue
    #[error("notification target gone: {0}")]
    TargetGone(String),

    /// Worth retrying on the next tick
    #[error("transient notification failure: {0}")]
    Transient(String),
}

impl NotifyError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, NotifyError::TargetGone(_))
    }
}
