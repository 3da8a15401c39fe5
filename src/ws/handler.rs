//! WebSocket handler for watching and steering a channel's game

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{
        ws::{Message, WebSocket},
        Path, Query, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;

/// Query parameters of a WebSocket connection
#[derive(Debug, Default, Deserialize)]
pub struct WsParams {
    /// Player to steer; spectators leave it out
    pub player_id: Option<String>,
    /// Also push every rendered frame as a binary message
    #[serde(default)]
    pub frames: bool,
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(channel): Path<String>,
    Query(params): Query<WsParams>,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, channel, params, state))
}

/// Handle a WebSocket connection
async fn handle_socket(socket: WebSocket, channel: String, params: WsParams, state: Arc<AppState>) {
    let who = params.player_id.clone().unwrap_or_else(|| "spectator".to_string());
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before sending the current state so no tick is missed
    let Some(mut feed) = state.notifier.subscribe(&channel) else {
        let msg = ServerMessage::Error {
            message: format!("channel {channel} no longer exists"),
        };
        let _ = sender.send(Message::Text(msg.to_json().into())).await;
        return;
    };

    // Dropping the feed here releases the channel's sender again
    let Some(snapshot) = state.registry.snapshot(&channel) else {
        let msg = ServerMessage::Error {
            message: format!("no game in channel {channel}"),
        };
        let _ = sender.send(Message::Text(msg.to_json().into())).await;
        return;
    };

    info!("{} connected to channel {}", who, channel);

    let msg = ServerMessage::State { data: snapshot };
    if sender.send(Message::Text(msg.to_json().into())).await.is_err() {
        error!("Failed to send initial state to {}", who);
        return;
    }

    // Direct replies to this client (pong, errors)
    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<ServerMessage>();
    let send_frames = params.frames;
    let send_who = who.clone();

    // Task to forward published ticks and replies to this client
    let mut send_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                published = feed.recv() => match published {
                    Ok(publication) => {
                        let json = publication.message.to_json();
                        if sender.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                        if send_frames {
                            let frame = Bytes::from(publication.frame.to_vec());
                            if sender.send(Message::Binary(frame)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        warn!("Client {} lagged by {} messages", send_who, n);
                    }
                    Err(RecvError::Closed) => {
                        let _ = sender.send(Message::Close(None)).await;
                        break;
                    }
                },
                reply = reply_rx.recv() => match reply {
                    Some(msg) => {
                        if sender.send(Message::Text(msg.to_json().into())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                },
            }
        }
    });

    // Task to receive commands from this client
    let mut recv_task = {
        let state = state.clone();
        let channel = channel.clone();
        let player_id = params.player_id;

        tokio::spawn(async move {
            while let Some(result) = receiver.next().await {
                match result {
                    Ok(Message::Text(text)) => match ClientMessage::parse(&text) {
                        Some(ClientMessage::Direction(dir)) => match &player_id {
                            Some(player) => {
                                let accepted = state.registry.handle_input(&channel, player, dir);
                                debug!("{} -> {} (accepted: {})", player, dir, accepted);
                            }
                            None => debug!("Spectator in {} tried to steer", channel),
                        },
                        Some(ClientMessage::Ping) => {
                            let _ = reply_tx.send(ServerMessage::Pong);
                        }
                        None => {
                            let _ = reply_tx.send(ServerMessage::Error {
                                message: format!("unknown command '{}'", text.trim()),
                            });
                        }
                    },
                    Ok(Message::Close(_)) => {
                        break;
                    }
                    Ok(_) => {
                        // Ignore binary, ping, pong frames
                    }
                    Err(e) => {
                        error!("WebSocket error for {}: {}", channel, e);
                        break;
                    }
                }
            }
        })
    };

    // Wait for either task to finish
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    info!("{} disconnected from channel {}", who, channel);
}
