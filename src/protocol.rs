//! Protocol messages for WebSocket communication

use serde::Serialize;

use crate::game::{ArenaSnapshot, Direction};

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// Direction change command
    Direction(Direction),
    /// Keep-alive
    Ping,
}

impl ClientMessage {
    /// Parse a client message from a text frame
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();

        if s.eq_ignore_ascii_case("ping") {
            return Some(ClientMessage::Ping);
        }

        s.parse::<Direction>().ok().map(ClientMessage::Direction)
    }
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    /// Arena state after a tick
    State { data: ArenaSnapshot },
    /// Reply to a ping
    Pong,
    /// Something the client asked for could not be done
    Error { message: String },
}

impl ServerMessage {
    /// Serialize message to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Arena, GameMode};

    #[test]
    fn test_parse_direction() {
        assert_eq!(
            ClientMessage::parse("up"),
            Some(ClientMessage::Direction(Direction::Up))
        );
        assert_eq!(
            ClientMessage::parse("South\n"),
            Some(ClientMessage::Direction(Direction::Down))
        );
        assert_eq!(ClientMessage::parse("sideways"), None);
    }

    #[test]
    fn test_parse_ping() {
        assert_eq!(ClientMessage::parse("ping"), Some(ClientMessage::Ping));
    }

    #[test]
    fn test_server_message_json() {
        assert_eq!(ServerMessage::Pong.to_json(), r#"{"type":"pong"}"#);

        let mut arena = Arena::with_seed(8, GameMode::TwoPlayer, 3, 4);
        arena.add_player("p1", "#00FF00");
        let json = ServerMessage::State {
            data: arena.snapshot(),
        }
        .to_json();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["type"], "state");
        assert_eq!(value["data"]["grid_size"], 8);
        assert_eq!(value["data"]["mode"], "multiplayer");
        assert_eq!(value["data"]["snakes"][0]["id"], "p1");
        assert_eq!(value["data"]["snakes"][0]["body"][0]["x"], 2);
        assert_eq!(value["data"]["winner"], serde_json::Value::Null);
    }
}
