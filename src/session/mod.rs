//! Channel-scoped game sessions
//!
//! A [`Session`] pairs one [`Arena`] with its optional AI and the display
//! names of the people playing. The [`SessionRegistry`] owns every session and
//! makes sure a channel never runs two of them at once.

pub mod registry;
pub mod session_loop;

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::ai::{AiController, Difficulty};
use crate::game::{Arena, ArenaSnapshot, Direction, GameMode, PlayerId};

pub use registry::SessionRegistry;

/// Identifier of the communication channel a session lives in
pub type ChannelId = String;

/// Request to open a session
#[derive(Debug, Clone, Deserialize)]
pub struct StartRequest {
    /// Host player id; the host plays the first snake
    pub player_id: PlayerId,
    /// Host display name
    pub name: String,
    #[serde(default)]
    pub mode: GameMode,
    /// AI strength, single-player only
    #[serde(default)]
    pub difficulty: Difficulty,
}

/// A person taking part in a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub name: String,
}

/// Caller-facing description of a session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub channel: ChannelId,
    pub mode: GameMode,
    pub difficulty: Option<Difficulty>,
    pub players: Vec<PlayerInfo>,
    pub snapshot: ArenaSnapshot,
}

/// Mutable part of a session, guarded by one lock so the AI decision and the
/// tick it feeds can never interleave with anything else.
pub struct SessionState {
    pub arena: Arena,
    pub ai: Option<AiController>,
    pub players: Vec<PlayerInfo>,
}

/// One running game
pub struct Session {
    id: Uuid,
    channel: ChannelId,
    mode: GameMode,
    difficulty: Option<Difficulty>,
    state: Mutex<SessionState>,
    cancel: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Session {
    pub fn new(channel: impl Into<ChannelId>, state: SessionState) -> Self {
        let (cancel, _) = watch::channel(false);
        let mode = state.arena.mode();
        let difficulty = state.ai.as_ref().map(|ai| ai.difficulty());

        Self {
            id: Uuid::new_v4(),
            channel: channel.into(),
            mode,
            difficulty,
            state: Mutex::new(state),
            cancel,
            task: Mutex::new(None),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    /// Lock the session state. A panic elsewhere does not make the arena unusable.
    pub fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_terminal(&self) -> bool {
        self.lock().arena.is_terminal()
    }

    pub fn snapshot(&self) -> ArenaSnapshot {
        self.lock().arena.snapshot()
    }

    /// Forward a direction command to the arena
    pub fn handle_input(&self, player_id: &str, direction: Direction) -> bool {
        self.lock().arena.handle_input(player_id, direction)
    }

    /// End the game now, keeping whatever winner is already set
    pub fn force_stop(&self) {
        self.lock().arena.force_stop();
    }

    pub fn summary(&self) -> SessionSummary {
        let state = self.lock();
        SessionSummary {
            session_id: self.id,
            channel: self.channel.clone(),
            mode: self.mode,
            difficulty: self.difficulty,
            players: state.players.clone(),
            snapshot: state.arena.snapshot(),
        }
    }

    /// Ask the tick loop to stop at its next suspension point
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Receiver that changes when the session is cancelled
    pub fn cancel_signal(&self) -> watch::Receiver<bool> {
        self.cancel.subscribe()
    }

    fn set_task(&self, handle: JoinHandle<()>) {
        *self.task.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
    }

    fn take_task(&self) -> Option<JoinHandle<()>> {
        self.task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}
