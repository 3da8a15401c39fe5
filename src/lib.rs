//! Multiplayer Snake sessions scoped to channels
//!
//! Each channel runs at most one game at a time. A game is an [`game::Arena`]
//! on a wrap-around grid, ticked by its own task, optionally played against
//! an [`ai::AiController`]. Every tick is rendered and handed to a
//! [`notify::Notifier`].

pub mod ai;
pub mod config;
pub mod error;
pub mod game;
pub mod http;
pub mod notify;
pub mod protocol;
pub mod render;
pub mod session;
pub mod state;
pub mod ws;

pub use config::ArenaConfig;
pub use error::{ConfigError, NotifyError, SessionError};
pub use session::{SessionRegistry, StartRequest};
pub use state::AppState;
