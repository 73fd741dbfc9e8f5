//! WebSocket support for real-time upload notifications.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use lumiere_core::events::{EventEnvelope, UploadEvent};

use crate::metrics::{WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL, WS_LAG_EVENTS, WS_MESSAGES_SENT};
use crate::state::AppState;

/// WebSocket message sent to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WsMessage {
    /// A pipeline event from one upload session.
    SessionEvent {
        session_id: String,
        timestamp: DateTime<Utc>,
        event: UploadEvent,
    },
    /// A session was torn down.
    SessionClosed { session_id: String },
}

/// Broadcaster for WebSocket messages using a tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct WsBroadcaster {
    sender: broadcast::Sender<WsMessage>,
}

impl WsBroadcaster {
    /// Create a new broadcaster with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Broadcast a message to all connected clients.
    pub fn broadcast(&self, msg: WsMessage) {
        // Ignore send errors - they just mean no one is listening
        let _ = self.sender.send(msg);
    }

    /// Subscribe to receive messages.
    pub fn subscribe(&self) -> broadcast::Receiver<WsMessage> {
        self.sender.subscribe()
    }

    /// Convenience method to broadcast a session's pipeline event.
    pub fn session_event(&self, session_id: &str, envelope: EventEnvelope) {
        self.broadcast(WsMessage::SessionEvent {
            session_id: session_id.to_string(),
            timestamp: envelope.timestamp,
            event: envelope.event,
        });
    }

    /// Convenience method to broadcast a session teardown.
    pub fn session_closed(&self, session_id: &str) {
        self.broadcast(WsMessage::SessionClosed {
            session_id: session_id.to_string(),
        });
    }
}

impl Default for WsBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}

/// WebSocket upgrade handler.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle a single WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let mut rx = state.ws_broadcaster().subscribe();

    WS_CONNECTIONS_TOTAL.inc();
    WS_CONNECTIONS_ACTIVE.inc();

    info!("WebSocket client connected");

    // Forward broadcast messages to this client
    let send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(msg) => {
                    let msg_type = match &msg {
                        WsMessage::SessionEvent { event, .. } => event.event_type(),
                        WsMessage::SessionClosed { .. } => "session_closed",
                    };
                    WS_MESSAGES_SENT.with_label_values(&[msg_type]).inc();

                    match serde_json::to_string(&msg) {
                        Ok(json) => {
                            if sender.send(Message::Text(json.into())).await.is_err() {
                                debug!("WebSocket send failed, client disconnected");
                                break;
                            }
                        }
                        Err(e) => {
                            error!("Failed to serialize WsMessage: {}", e);
                        }
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("WebSocket client lagged, skipped {} messages", n);
                    WS_LAG_EVENTS.inc();
                    // Continue receiving - the client will catch up
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Broadcast channel closed");
                    break;
                }
            }
        }
    });

    // Handle incoming messages from client (ping/pong, close)
    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Close(_)) => {
                debug!("WebSocket client requested close");
                break;
            }
            Ok(Message::Ping(data)) => {
                // Pong is handled automatically by axum
                debug!("Received ping: {:?}", data);
            }
            Ok(Message::Text(text)) => {
                // We don't expect any client messages, but log them
                debug!("Received text message: {}", text);
            }
            Ok(_) => {
                // Ignore other message types
            }
            Err(e) => {
                warn!("WebSocket receive error: {}", e);
                break;
            }
        }
    }

    send_task.abort();
    WS_CONNECTIONS_ACTIVE.dec();
    info!("WebSocket client disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_event_serialization() {
        let broadcaster = WsBroadcaster::default();
        let mut rx = broadcaster.subscribe();

        broadcaster.session_event(
            "session-1",
            EventEnvelope {
                timestamp: Utc::now(),
                event: UploadEvent::FilesCleared { count: 2 },
            },
        );

        let msg = rx.try_recv().unwrap();
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"kind\":\"session_event\""));
        assert!(json.contains("\"session_id\":\"session-1\""));
        assert!(json.contains("\"type\":\"files_cleared\""));
    }

    #[test]
    fn test_session_closed_message() {
        let broadcaster = WsBroadcaster::default();
        let mut rx = broadcaster.subscribe();

        broadcaster.session_closed("session-9");

        let msg = rx.try_recv().unwrap();
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"kind\":\"session_closed\""));
    }
}
