//! Notifier abstraction for publishing ticks
//!
//! The in-memory implementation keeps one tokio broadcast channel per game
//! channel, and only while somebody is subscribed to it. WebSocket clients
//! subscribe to the channel they watch.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::debug;

use crate::config::DEFAULT_BROADCAST_CAPACITY;
use crate::error::NotifyError;
use crate::game::ArenaSnapshot;
use crate::protocol::ServerMessage;
use crate::render::Frame;
use crate::session::ChannelId;

/// One published tick
#[derive(Debug, Clone)]
pub struct Publication {
    pub message: ServerMessage,
    pub frame: Frame,
}

type Senders = DashMap<ChannelId, broadcast::Sender<Arc<Publication>>>;

/// Delivers snapshots and rendered frames to whoever watches a channel
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Publish one tick. `TargetGone` ends the session, `Transient` is logged
    /// and the session carries on.
    async fn publish(
        &self,
        channel: &str,
        snapshot: &ArenaSnapshot,
        frame: &Frame,
    ) -> Result<(), NotifyError>;

    /// Whether `channel` is known to no longer exist
    fn is_gone(&self, _channel: &str) -> bool {
        false
    }
}

/// A subscription to one channel's ticks. Dropping the last one for a
/// channel drops that channel's sender.
pub struct Feed {
    rx: broadcast::Receiver<Arc<Publication>>,
    channel: ChannelId,
    senders: Arc<Senders>,
}

impl Feed {
    pub async fn recv(&mut self) -> Result<Arc<Publication>, RecvError> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Result<Arc<Publication>, TryRecvError> {
        self.rx.try_recv()
    }
}

impl Drop for Feed {
    fn drop(&mut self) {
        // Our own receiver is still counted here
        self.senders
            .remove_if(&self.channel, |_, tx| tx.receiver_count() <= 1);
    }
}

/// In-memory notifier using tokio broadcast channels
pub struct BroadcastNotifier {
    senders: Arc<Senders>,
    /// Channels that no longer exist
    retired: DashSet<ChannelId>,
    capacity: usize,
}

impl BroadcastNotifier {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BROADCAST_CAPACITY)
    }

    /// Create with custom per-channel capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            senders: Arc::new(DashMap::new()),
            retired: DashSet::new(),
            capacity: capacity.max(1),
        }
    }

    /// Subscribe to a channel's ticks. `None` once the channel is retired.
    pub fn subscribe(&self, channel: &str) -> Option<Feed> {
        if self.retired.contains(channel) {
            return None;
        }
        let rx = self
            .senders
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe();
        Some(Feed {
            rx,
            channel: channel.to_string(),
            senders: self.senders.clone(),
        })
    }

    /// Mark a channel as gone. Subscribers see the feed close and later
    /// publishes fail with `TargetGone`.
    pub fn retire(&self, channel: &str) {
        self.retired.insert(channel.to_string());
        self.senders.remove(channel);
    }

    pub fn is_retired(&self, channel: &str) -> bool {
        self.retired.contains(channel)
    }

    /// Get the number of active subscribers on a channel
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.senders
            .get(channel)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    /// Number of channels that currently hold a sender
    pub fn channel_count(&self) -> usize {
        self.senders.len()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for BroadcastNotifier {
    async fn publish(
        &self,
        channel: &str,
        snapshot: &ArenaSnapshot,
        frame: &Frame,
    ) -> Result<(), NotifyError> {
        if self.retired.contains(channel) {
            return Err(NotifyError::TargetGone(format!("channel {channel} was removed")));
        }

        let Some(tx) = self.senders.get(channel).map(|tx| tx.clone()) else {
            debug!("Publish to {} skipped (no subscribers)", channel);
            return Ok(());
        };

        let publication = Arc::new(Publication {
            message: ServerMessage::State {
                data: snapshot.clone(),
            },
            frame: frame.clone(),
        });

        // send() returns error if there are no receivers, which is fine
        if let Err(e) = tx.send(publication) {
            debug!("Publish to {} (no receivers): {}", channel, e);
        }
        Ok(())
    }

    fn is_gone(&self, channel: &str) -> bool {
        self.is_retired(channel)
    }
}
