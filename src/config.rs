//! Game configuration
//!
//! Defaults live in the constants below; a TOML file can override any of them.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::game::location::MAX_GRID_SIZE;

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "SNAKE_ARENA_CONFIG";

/// Cells along each side of the square grid
pub const DEFAULT_GRID_SIZE: u32 = 20;

/// Ticks per second
pub const DEFAULT_FPS: u32 = 10;

/// Growth queued on a new snake (visible length 4)
pub const DEFAULT_INITIAL_GROWTH: u32 = 3;

/// How long a finished session stays visible before it is removed
pub const DEFAULT_GRACE_PERIOD_SECS: u64 = 5;

/// How long a two-player session waits for its second player
pub const DEFAULT_LOBBY_TIMEOUT_SECS: u64 = 120;

/// Rendered cell size in pixels
pub const DEFAULT_CELL_SIZE: u32 = 20;

/// Per-channel broadcast capacity
pub const DEFAULT_BROADCAST_CAPACITY: usize = 100;

/// Largest accepted tick rate
pub const MAX_FPS: u32 = 60;

/// Smallest accepted grid
pub const MIN_GRID_SIZE: u32 = 4;

/// Colour of the session host's snake
pub const HOST_COLOR: &str = "#00FF00";

/// Colour of the AI snake
pub const AI_COLOR: &str = "#0000FF";

/// Colour of the second human in two-player sessions
pub const GUEST_COLOR: &str = "#FFFF00";

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArenaConfig {
    #[serde(default)]
    pub game: GameConfig,

    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

/// Simulation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default = "default_grid_size")]
    pub grid_size: u32,

    #[serde(default = "default_fps")]
    pub fps: u32,

    #[serde(default = "default_initial_growth")]
    pub initial_growth: u32,

    #[serde(default = "default_grace_period")]
    pub grace_period_secs: u64,

    #[serde(default = "default_lobby_timeout")]
    pub lobby_timeout_secs: u64,
}

fn default_grid_size() -> u32 {
    DEFAULT_GRID_SIZE
}

fn default_fps() -> u32 {
    DEFAULT_FPS
}

fn default_initial_growth() -> u32 {
    DEFAULT_INITIAL_GROWTH
}

fn default_grace_period() -> u64 {
    DEFAULT_GRACE_PERIOD_SECS
}

fn default_lobby_timeout() -> u64 {
    DEFAULT_LOBBY_TIMEOUT_SECS
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            fps: DEFAULT_FPS,
            initial_growth: DEFAULT_INITIAL_GROWTH,
            grace_period_secs: DEFAULT_GRACE_PERIOD_SECS,
            lobby_timeout_secs: DEFAULT_LOBBY_TIMEOUT_SECS,
        }
    }
}

impl GameConfig {
    /// Wall-clock time between ticks
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(1) / self.fps.max(1)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_secs)
    }

    pub fn lobby_timeout(&self) -> Duration {
        Duration::from_secs(self.lobby_timeout_secs)
    }
}

/// Image output parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_cell_size")]
    pub cell_size: u32,
}

fn default_cell_size() -> u32 {
    DEFAULT_CELL_SIZE
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
        }
    }
}

/// HTTP / WebSocket server parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,

    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_broadcast_capacity() -> usize {
    DEFAULT_BROADCAST_CAPACITY
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
            broadcast_capacity: DEFAULT_BROADCAST_CAPACITY,
        }
    }
}

impl ArenaConfig {
    /// Load configuration from a TOML file
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn load_str(content: &str) -> Result<Self, ConfigError> {
        let config: ArenaConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the file named by [`CONFIG_PATH_ENV`], or use defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::load_file(path),
            Err(_) => Ok(Self::default()),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.game.grid_size > MAX_GRID_SIZE {
            return Err(ConfigError::Validation(format!(
                "grid_size must be at most {MAX_GRID_SIZE}, got {}",
                self.game.grid_size
            )));
        }

        if self.game.grid_size < MIN_GRID_SIZE {
            return Err(ConfigError::Validation(format!(
                "grid_size must be at least {MIN_GRID_SIZE}, got {}",
                self.game.grid_size
            )));
        }

        if self.game.fps == 0 || self.game.fps > MAX_FPS {
            return Err(ConfigError::Validation(format!(
                "fps must be between 1 and {MAX_FPS}, got {}",
                self.game.fps
            )));
        }

        if self.render.cell_size == 0 {
            return Err(ConfigError::Validation(
                "cell_size must be positive".to_string(),
            ));
        }

        if self.server.broadcast_capacity == 0 {
            return Err(ConfigError::Validation(
                "broadcast_capacity must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
