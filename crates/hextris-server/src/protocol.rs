//! WebSocket protocol messages for Hextris sessions.

use hextris_core::{GameEvent, HexSettings, InputEvent, Move, SessionSnapshot};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    /// Throw the current game away and start over
    NewGame { seed: Option<u64> },

    /// Forward one pointer or frame event
    Input { event: InputEvent },

    /// Change hex sizing; restarts the scene
    UpdateSettings { settings: HexSettings },

    /// Ask for a suggested placement
    Hint,

    /// Request a full snapshot
    GetState,

    /// Request the list of live sessions
    ListSessions,

    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    /// Sent on connect and after every new game
    Welcome { session_id: Uuid, state: SessionSnapshot },

    /// Events produced by the last input
    Events { events: Vec<GameEvent> },

    /// Full session snapshot
    State { state: SessionSnapshot },

    /// Suggested placement, `None` when nothing fits
    Hint { suggestion: Option<Move> },

    /// Live sessions on this server
    SessionList { sessions: Vec<SessionInfo> },

    /// Error occurred
    Error { message: String },

    /// Pong response
    Pong,
}

/// Session summary for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub id: Uuid,
    pub moves: u32,
    pub occupied_cells: usize,
    pub game_over: bool,
}
