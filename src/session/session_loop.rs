//! Session loop - drives one channel's arena once per tick

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::GameConfig;
use crate::game::ArenaSnapshot;
use crate::notify::Notifier;
use crate::render::{Frame, Renderer, FALLBACK_PNG};

use super::{ChannelId, Session, SessionState};

/// Everything a running loop needs besides its session
#[derive(Clone)]
pub struct LoopContext {
    pub sessions: Arc<DashMap<ChannelId, Arc<Session>>>,
    pub renderer: Arc<dyn Renderer>,
    pub notifier: Arc<dyn Notifier>,
    pub config: GameConfig,
}

/// How a loop stopped ticking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    /// Published a terminal snapshot; the session lingers for the grace period
    Finished,
    /// The notification target is gone; the session was already removed
    TargetGone,
    /// Stopped from outside
    Cancelled,
}

/// Spawn the tick loop for a session
pub fn spawn_session_loop(session: Arc<Session>, ctx: LoopContext) -> JoinHandle<()> {
    tokio::spawn(async move {
        let channel = session.channel().to_string();
        let mut cancel = session.cancel_signal();

        let exit = run_ticks(&session, &ctx, &mut cancel).await;
        debug!("Session {} in channel {} stopped ticking: {:?}", session.id(), channel, exit);

        if exit == Exit::Finished {
            tokio::select! {
                _ = sleep(ctx.config.grace_period()) => {}
                _ = cancel.changed() => {}
            }
            let id = session.id();
            if ctx.sessions.remove_if(&channel, |_, s| s.id() == id).is_some() {
                info!("Session {} in channel {} cleaned up", id, channel);
            }
        }
    })
}

async fn run_ticks(
    session: &Session,
    ctx: &LoopContext,
    cancel: &mut watch::Receiver<bool>,
) -> Exit {
    let channel = session.channel();
    let mut ticker = interval(ctx.config.tick_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately
    ticker.tick().await;

    let lobby_deadline = Instant::now() + ctx.config.lobby_timeout();

    loop {
        if session.is_cancelled() {
            return Exit::Cancelled;
        }

        let snapshot = advance(&mut session.lock(), channel, lobby_deadline);
        let frame = render_off_thread(ctx.renderer.clone(), &snapshot, channel).await;

        match ctx.notifier.publish(channel, &snapshot, &frame).await {
            Ok(()) => {}
            Err(e) if e.is_fatal() => {
                error!("Ending game in channel {}: {}", channel, e);
                session.force_stop();
                let id = session.id();
                ctx.sessions.remove_if(channel, |_, s| s.id() == id);
                return Exit::TargetGone;
            }
            Err(e) => {
                warn!("Publishing tick {} to {} failed: {}", snapshot.tick, channel, e);
            }
        }

        if snapshot.terminal {
            info!(
                "Game in channel {} over after {} ticks, winner: {:?}",
                channel, snapshot.tick, snapshot.winner
            );
            return Exit::Finished;
        }

        tokio::select! {
            _ = ticker.tick() => {}
            _ = cancel.changed() => return Exit::Cancelled,
        }
    }
}

/// PNG encoding is CPU bound, so it runs on the blocking pool
async fn render_off_thread(
    renderer: Arc<dyn Renderer>,
    snapshot: &ArenaSnapshot,
    channel: &str,
) -> Frame {
    let snapshot = snapshot.clone();
    match tokio::task::spawn_blocking(move || renderer.render(&snapshot)).await {
        Ok(frame) => frame,
        Err(e) => {
            warn!("Rendering for {} failed: {}", channel, e);
            Arc::from(&FALLBACK_PNG[..])
        }
    }
}

/// Run one tick under the session lock: AI first, then the arena
fn advance(state: &mut SessionState, channel: &str, lobby_deadline: Instant) -> ArenaSnapshot {
    let SessionState { arena, ai, .. } = state;

    if arena.is_terminal() {
        return arena.snapshot();
    }

    if !arena.is_ready() {
        if Instant::now() >= lobby_deadline {
            warn!("Nobody joined the game in channel {} in time", channel);
            arena.force_stop();
        }
        return arena.snapshot();
    }

    if let Some(ai) = ai.as_mut() {
        if let Some(direction) = ai.decide(arena) {
            arena.handle_input(ai.snake_id(), direction);
        }
    }

    let outcome = arena.update();
    for (player, food) in &outcome.eaten {
        debug!("{} ate food at ({}, {}) in {}", player, food.x, food.y, channel);
    }
    for death in &outcome.deaths {
        match &death.killer_id {
            Some(killer) => debug!("{} ran into {} in {}", death.victim_id, killer, channel),
            None => debug!("{} crashed into itself in {}", death.victim_id, channel),
        }
    }

    arena.snapshot()
}
