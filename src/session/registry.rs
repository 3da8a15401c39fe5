//! Registry of running sessions, at most one active per channel

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, info, warn};

use crate::ai::{AiController, AI_PLAYER_ID};
use crate::config::{GameConfig, AI_COLOR, GUEST_COLOR, HOST_COLOR};
use crate::error::SessionError;
use crate::game::{Arena, ArenaSnapshot, Direction, GameMode};
use crate::notify::Notifier;
use crate::render::{Frame, Renderer};

use super::session_loop::{spawn_session_loop, LoopContext};
use super::{ChannelId, PlayerInfo, Session, SessionState, SessionSummary, StartRequest};

/// Owns every session and its tick loop
pub struct SessionRegistry {
    sessions: Arc<DashMap<ChannelId, Arc<Session>>>,
    config: GameConfig,
    renderer: Arc<dyn Renderer>,
    notifier: Arc<dyn Notifier>,
}

impl SessionRegistry {
    pub fn new(config: GameConfig, renderer: Arc<dyn Renderer>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            config,
            renderer,
            notifier,
        }
    }

    /// Open a session in `channel` and start its loop.
    ///
    /// Fails with `AlreadyActive` while a non-terminal session holds the
    /// channel. A finished session still in its grace period is replaced.
    pub fn start_session(
        &self,
        channel: impl Into<ChannelId>,
        request: StartRequest,
    ) -> Result<SessionSummary, SessionError> {
        let channel = channel.into();
        if self.notifier.is_gone(&channel) {
            return Err(SessionError::ChannelGone(channel));
        }
        if request.mode == GameMode::SinglePlayer && request.player_id == AI_PLAYER_ID {
            return Err(SessionError::AlreadyJoined(request.player_id));
        }

        let session = Arc::new(Session::new(channel.clone(), self.new_state(&request)));

        match self.sessions.entry(channel.clone()) {
            Entry::Occupied(mut entry) => {
                if !entry.get().is_terminal() {
                    return Err(SessionError::AlreadyActive(channel));
                }
                let previous = entry.insert(session.clone());
                previous.cancel();
                debug!("Replacing finished session {} in {}", previous.id(), channel);
            }
            Entry::Vacant(entry) => {
                entry.insert(session.clone());
            }
        }

        let handle = spawn_session_loop(session.clone(), self.loop_context());
        session.set_task(handle);

        info!(
            "{} started a {} game in channel {} (session {})",
            request.name,
            request.mode,
            channel,
            session.id()
        );
        Ok(session.summary())
    }

    fn new_state(&self, request: &StartRequest) -> SessionState {
        let mut arena = Arena::new(self.config.grid_size, request.mode, self.config.initial_growth);
        arena.add_player(request.player_id.clone(), HOST_COLOR);

        let ai = match request.mode {
            GameMode::SinglePlayer => {
                arena.add_player(AI_PLAYER_ID, AI_COLOR);
                Some(AiController::new(AI_PLAYER_ID, request.difficulty))
            }
            GameMode::TwoPlayer => None,
        };

        SessionState {
            arena,
            ai,
            players: vec![PlayerInfo {
                id: request.player_id.clone(),
                name: request.name.clone(),
            }],
        }
    }

    fn loop_context(&self) -> LoopContext {
        LoopContext {
            sessions: self.sessions.clone(),
            renderer: self.renderer.clone(),
            notifier: self.notifier.clone(),
            config: self.config.clone(),
        }
    }

    /// Add the second player to a two-player lobby
    pub fn join_session(
        &self,
        channel: &str,
        player_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<SessionSummary, SessionError> {
        let session = self
            .get(channel)
            .ok_or_else(|| SessionError::NotFound(channel.to_string()))?;
        if session.mode() != GameMode::TwoPlayer {
            return Err(SessionError::WrongMode(channel.to_string()));
        }

        let player_id = player_id.into();
        let name = name.into();
        {
            let mut state = session.lock();
            if state.arena.is_terminal() {
                return Err(SessionError::NotFound(channel.to_string()));
            }
            if state.arena.snake(&player_id).is_some() {
                return Err(SessionError::AlreadyJoined(player_id));
            }
            if state.arena.player_count() >= state.arena.mode().required_players() {
                return Err(SessionError::SessionFull(channel.to_string()));
            }
            state.arena.add_player(player_id.clone(), GUEST_COLOR);
            state.players.push(PlayerInfo {
                id: player_id,
                name: name.clone(),
            });
        }

        info!("{} joined the game in channel {}", name, channel);
        Ok(session.summary())
    }

    /// Forward a direction command. Returns whether the arena took it.
    pub fn handle_input(&self, channel: &str, player_id: &str, direction: Direction) -> bool {
        match self.get(channel) {
            Some(session) => session.handle_input(player_id, direction),
            None => false,
        }
    }

    pub fn snapshot(&self, channel: &str) -> Option<ArenaSnapshot> {
        self.get(channel).map(|s| s.snapshot())
    }

    pub fn summary(&self, channel: &str) -> Option<SessionSummary> {
        self.get(channel).map(|s| s.summary())
    }

    /// Render the current state of a channel's game
    pub fn render(&self, channel: &str) -> Option<Frame> {
        let snapshot = self.snapshot(channel)?;
        Some(self.renderer.render(&snapshot))
    }

    /// End a session now and drop it without a grace period
    pub fn stop_session(&self, channel: &str) -> Result<(), SessionError> {
        let (_, session) = self
            .sessions
            .remove(channel)
            .ok_or_else(|| SessionError::NotFound(channel.to_string()))?;
        session.force_stop();
        session.cancel();
        info!("Stopped session {} in channel {}", session.id(), channel);
        Ok(())
    }

    /// A channel has an active session when it holds a non-terminal one
    pub fn is_active(&self, channel: &str) -> bool {
        self.get(channel).map(|s| !s.is_terminal()).unwrap_or(false)
    }

    /// Number of sessions held, including finished ones in their grace period
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn active_count(&self) -> usize {
        self.sessions
            .iter()
            .filter(|entry| !entry.value().is_terminal())
            .count()
    }

    /// Cancel every session and wait for the loops to exit
    pub async fn shutdown(&self) {
        let channels: Vec<ChannelId> = self.sessions.iter().map(|e| e.key().clone()).collect();
        let mut handles = Vec::new();

        for channel in channels {
            if let Some((_, session)) = self.sessions.remove(&channel) {
                session.cancel();
                if let Some(handle) = session.take_task() {
                    handles.push(handle);
                }
            }
        }

        info!("Shutting down {} session(s)", handles.len());
        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Session loop ended abnormally: {}", e);
            }
        }
    }

    fn get(&self, channel: &str) -> Option<Arc<Session>> {
        self.sessions.get(channel).map(|entry| entry.value().clone())
    }
}
