//! Notification fan-out: event delivery to subscribed sessions.
//!
//! Delivery is best-effort per session: a sink that reports its session
//! gone is skipped, never retried, and never fails the broadcaster.
//! Per-room causal order is the caller's contract: broadcasts for one
//! room are issued while that room's lock is held, so events reach every
//! member in the order the broadcasts were made.

use std::sync::Arc;

use careline_proto::{OutboundEvent, RoomId, SessionId};

use crate::session::SessionRegistry;

/// Delivers events to room members and idle sessions.
pub struct Fanout {
    sessions: Arc<SessionRegistry>,
}

impl Fanout {
    /// Create a fan-out over the given session registry.
    pub fn new(sessions: Arc<SessionRegistry>) -> Self {
        Self { sessions }
    }

    /// Deliver an event to every session bound to `room_id`.
    pub fn broadcast(&self, room_id: RoomId, event: &OutboundEvent) {
        self.broadcast_inner(room_id, None, event);
    }

    /// Deliver an event to every session bound to `room_id` except one
    /// (typically the session that caused the event).
    pub fn broadcast_except(&self, room_id: RoomId, exclude: SessionId, event: &OutboundEvent) {
        self.broadcast_inner(room_id, Some(exclude), event);
    }

    /// Deliver an event to every session not bound to any room. Used for
    /// "new waiting request" announcements to idle clinician sessions.
    pub fn broadcast_global(&self, event: &OutboundEvent) {
        for (session_id, sink) in self.sessions.idle() {
            if !sink.deliver(event) {
                tracing::debug!(session_id, "skipped gone session during global broadcast");
            }
        }
    }

    /// Deliver an event to a single session, if still connected.
    pub fn send_to(&self, session_id: SessionId, event: &OutboundEvent) {
        if let Some(sink) = self.sessions.sink(session_id) {
            if !sink.deliver(event) {
                tracing::debug!(session_id, "send to gone session dropped");
            }
        }
    }

    fn broadcast_inner(&self, room_id: RoomId, exclude: Option<SessionId>, event: &OutboundEvent) {
        for (session_id, sink) in self.sessions.members(room_id) {
            if Some(session_id) == exclude {
                continue;
            }
            if !sink.deliver(event) {
                tracing::debug!(session_id, %room_id, "skipped gone session during broadcast");
            }
        }
    }
}
