//! WebSocket transport: one session per connection.
//!
//! Each connection splits into a read loop and a writer task. The writer
//! drains an unbounded channel fed by the session's [`EventSink`], so
//! event delivery from the core never blocks on a slow client socket.
//! Malformed frames and rejected events are reported back on the same
//! connection as `error` events; the session stays open.

use std::sync::Arc;

use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message as WsMessage, WebSocket},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use careline_core::EventSink;
use careline_proto::{InboundEvent, OutboundEvent, SessionId};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::AppState;

/// Sink handing events to the connection's writer task.
struct WsSink {
    tx: mpsc::UnboundedSender<OutboundEvent>,
}

impl EventSink for WsSink {
    fn deliver(&self, event: &OutboundEvent) -> bool {
        self.tx.send(event.clone()).is_ok()
    }
}

/// `GET /chat/ws`: upgrade to the chat event stream.
pub async fn chat_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    // Soft cap: the count is read before the session registers, so
    // concurrent upgrades may overshoot the limit by a few connections.
    if state.gateway.session_count() >= state.max_connections {
        tracing::warn!("connection limit reached, refusing upgrade");
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: AppState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<OutboundEvent>();

    let session_id = state.gateway.connect(Arc::new(WsSink { tx: tx.clone() }));

    let mut writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(err) => {
                    tracing::error!(%err, "failed to serialize outbound event");
                    continue;
                },
            };
            if sender.send(WsMessage::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            frame = receiver.next() => {
                match frame {
                    Some(Ok(WsMessage::Text(text))) => {
                        handle_frame(&state, session_id, &tx, &text);
                    },
                    Some(Ok(WsMessage::Close(_))) | None => break,
                    Some(Ok(_)) => {}, // ping/pong/binary ignored
                    Some(Err(err)) => {
                        tracing::debug!(session_id, %err, "socket read error");
                        break;
                    },
                }
            },
            // Writer stops when the client is gone; stop reading too.
            _ = &mut writer => break,
        }
    }

    state.gateway.disconnect(session_id);
    writer.abort();
}

/// Parse and dispatch one text frame; errors go back to this session
/// only.
fn handle_frame(
    state: &AppState,
    session_id: SessionId,
    tx: &mpsc::UnboundedSender<OutboundEvent>,
    text: &str,
) {
    let event = match serde_json::from_str::<InboundEvent>(text) {
        Ok(event) => event,
        Err(err) => {
            let _ = tx.send(OutboundEvent::Error { message: format!("malformed event: {err}") });
            return;
        },
    };

    if let Err(err) = state.gateway.handle_event(session_id, event) {
        tracing::debug!(session_id, %err, "event rejected");
        let _ = tx.send(OutboundEvent::Error { message: err.to_string() });
    }
}
