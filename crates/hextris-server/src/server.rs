//! WebSocket server and connection handling.

use crate::protocol::{ClientMessage, ServerMessage, SessionInfo};
use crate::session::ClientSession;
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use hextris_core::GameConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Server state shared across all connections.
///
/// Each connection task owns its game; only summaries are shared here.
pub struct ServerState {
    /// Summaries of every live session
    pub sessions: DashMap<Uuid, SessionInfo>,
    /// Mapping from session ID to its message sender
    pub senders: DashMap<Uuid, mpsc::UnboundedSender<ServerMessage>>,
    /// Configuration new sessions start from
    pub config: GameConfig,
}

impl ServerState {
    pub fn new(config: GameConfig) -> Self {
        Self {
            sessions: DashMap::new(),
            senders: DashMap::new(),
            config,
        }
    }

    /// Send a message to a specific session.
    pub fn send_to(&self, session_id: Uuid, msg: ServerMessage) {
        if let Some(sender) = self.senders.get(&session_id) {
            let _ = sender.send(msg);
        }
    }

    /// Refresh the listed summary of a session.
    pub fn publish(&self, session: &ClientSession) {
        self.sessions.insert(session.id, session.to_info());
    }

    /// Summaries of all live sessions, in no particular order.
    pub fn list_sessions(&self) -> Vec<SessionInfo> {
        self.sessions.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn remove(&self, session_id: Uuid) {
        self.sessions.remove(&session_id);
        self.senders.remove(&session_id);
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}

/// Run the WebSocket server.
pub async fn run_server(addr: SocketAddr, state: Arc<ServerState>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Hextris server listening on {}", addr);

    while let Ok((stream, peer_addr)) = listener.accept().await {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                error!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }

    Ok(())
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    state: Arc<ServerState>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    info!("New WebSocket connection from {}", addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let session_id = Uuid::new_v4();
    let mut session = ClientSession::new(session_id, state.config, None)?;

    // Create channel for outgoing messages
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    state.senders.insert(session_id, tx);
    state.publish(&session);

    let welcome = ServerMessage::Welcome {
        session_id,
        state: session.snapshot(),
    };
    let msg_text = serde_json::to_string(&welcome)?;
    ws_sender.send(Message::Text(msg_text)).await?;

    // Spawn task to forward messages from channel to WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(text) = serde_json::to_string(&msg) {
                if ws_sender.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
        }
    });

    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => handle_message(&mut session, client_msg, &state),
                Err(e) => {
                    warn!("Invalid message from {}: {}", session_id, e);
                    state.send_to(
                        session_id,
                        ServerMessage::Error {
                            message: format!("Invalid message: {}", e),
                        },
                    );
                }
            },
            Ok(Message::Close(_)) => {
                info!("Client {} closing connection", session_id);
                break;
            }
            Ok(Message::Ping(_)) => {
                state.send_to(session_id, ServerMessage::Pong);
            }
            Err(e) => {
                error!("WebSocket error from {}: {}", session_id, e);
                break;
            }
            _ => {}
        }
    }

    state.remove(session_id);
    send_task.abort();

    info!("Connection closed for {}", session_id);
    Ok(())
}

/// Handle a client message against the connection's own session.
fn handle_message(session: &mut ClientSession, msg: ClientMessage, state: &ServerState) {
    let id = session.id;
    let reply = match msg {
        ClientMessage::NewGame { seed } => match session.restart(seed) {
            Ok(()) => ServerMessage::Welcome {
                session_id: id,
                state: session.snapshot(),
            },
            Err(e) => ServerMessage::Error {
                message: e.to_string(),
            },
        },

        ClientMessage::Input { event } => match session.apply_input(event) {
            Ok(events) => ServerMessage::Events { events },
            Err(e) => ServerMessage::Error {
                message: e.to_string(),
            },
        },

        ClientMessage::UpdateSettings { settings } => match session.update_settings(settings) {
            Ok(events) => ServerMessage::Events { events },
            Err(e) => {
                warn!("Rejected settings from {}: {}", id, e);
                ServerMessage::Error {
                    message: e.to_string(),
                }
            }
        },

        ClientMessage::Hint => ServerMessage::Hint {
            suggestion: session.hint(),
        },

        ClientMessage::GetState => ServerMessage::State {
            state: session.snapshot(),
        },

        ClientMessage::ListSessions => ServerMessage::SessionList {
            sessions: state.list_sessions(),
        },

        ClientMessage::Ping => ServerMessage::Pong,
    };

    state.publish(session);
    state.send_to(id, reply);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connect(state: &ServerState) -> (ClientSession, mpsc::UnboundedReceiver<ServerMessage>) {
        let id = Uuid::new_v4();
        let session = ClientSession::new(id, state.config, Some(5)).unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        state.senders.insert(id, tx);
        state.publish(&session);
        (session, rx)
    }

    #[test]
    fn test_ping_pong() {
        let state = ServerState::default();
        let (mut session, mut rx) = connect(&state);
        handle_message(&mut session, ClientMessage::Ping, &state);
        assert!(matches!(rx.try_recv(), Ok(ServerMessage::Pong)));
    }

    #[test]
    fn test_list_sessions_sees_everyone() {
        let state = ServerState::default();
        let (mut first, mut rx) = connect(&state);
        let (_second, _rx2) = connect(&state);
        handle_message(&mut first, ClientMessage::ListSessions, &state);
        match rx.try_recv() {
            Ok(ServerMessage::SessionList { sessions }) => assert_eq!(sessions.len(), 2),
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[test]
    fn test_hint_then_state() {
        let state = ServerState::default();
        let (mut session, mut rx) = connect(&state);
        handle_message(&mut session, ClientMessage::Hint, &state);
        assert!(matches!(
            rx.try_recv(),
            Ok(ServerMessage::Hint { suggestion: Some(_) })
        ));
        handle_message(&mut session, ClientMessage::GetState, &state);
        match rx.try_recv() {
            Ok(ServerMessage::State { state }) => assert!(!state.game_over),
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[test]
    fn test_bad_settings_become_error_message() {
        let state = ServerState::default();
        let (mut session, mut rx) = connect(&state);
        let settings = hextris_core::HexSettings {
            size: -5.0,
            ..Default::default()
        };
        handle_message(&mut session, ClientMessage::UpdateSettings { settings }, &state);
        assert!(matches!(rx.try_recv(), Ok(ServerMessage::Error { .. })));
    }

    #[test]
    fn test_remove_forgets_session() {
        let state = ServerState::default();
        let (session, _rx) = connect(&state);
        state.remove(session.id);
        assert!(state.list_sessions().is_empty());
        assert!(state.senders.is_empty());
    }
}
