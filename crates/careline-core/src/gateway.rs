//! Session gateway: connection-to-identity binding and event dispatch.
//!
//! The gateway owns the session arena and validates every inbound event
//! against the session's room binding before delegating to the room
//! registry, message log or presence tracker. Each handler returns a
//! typed result; the transport reports failures back to the offending
//! session only, so one connection's error never disturbs another room.
//!
//! It also exposes the request/response operations the presentation
//! layer consumes (create-or-get room, waiting queue, accept, history).

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Instant,
};

use careline_proto::{
    InboundEvent, Message, OutboundEvent, Priority, Role, Room, RoomId, SessionId,
};

use crate::{
    error::ChatError,
    fanout::Fanout,
    message_log::MessageLog,
    presence::PresenceTracker,
    registry::{RoomRegistry, lock_slot},
    session::{EventSink, Identity, SessionRegistry},
    storage::ChatStore,
};

/// Tunables for the gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// How many recent messages to replay on join.
    pub history_replay: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self { history_replay: 50 }
    }
}

/// The chat core: one instance serves every connection of the process.
pub struct ChatGateway<S: ChatStore> {
    rooms: RoomRegistry<S>,
    log: MessageLog<S>,
    presence: PresenceTracker,
    sessions: Arc<SessionRegistry>,
    fanout: Fanout,
    config: GatewayConfig,
    next_session_id: AtomicU64,
}

impl<S: ChatStore> ChatGateway<S> {
    /// Build a gateway over `store`, recovering any persisted rooms.
    pub fn new(store: S, config: GatewayConfig) -> Result<Self, ChatError> {
        let sessions = Arc::new(SessionRegistry::new());
        Ok(Self {
            rooms: RoomRegistry::recover(store.clone())?,
            log: MessageLog::new(store),
            presence: PresenceTracker::new(),
            fanout: Fanout::new(Arc::clone(&sessions)),
            sessions,
            config,
            next_session_id: AtomicU64::new(1),
        })
    }

    /// Register a new connection and return its session id.
    pub fn connect(&self, sink: Arc<dyn EventSink>) -> SessionId {
        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        self.sessions.register(session_id, sink);
        tracing::debug!(session_id, "session connected");
        session_id
    }

    /// Tear down a connection: clear presence, drop the session record,
    /// and notify the room it was in, if any.
    ///
    /// Does not complete the room; it stays open for the remaining
    /// participant and for re-joins.
    pub fn disconnect(&self, session_id: SessionId) {
        self.presence.clear(session_id);

        if let Some((identity, room_id)) = self.sessions.unregister(session_id) {
            tracing::debug!(session_id, room = ?room_id, "session disconnected");
            if let (Some(identity), Some(room_id)) = (identity, room_id) {
                self.fanout.broadcast(
                    room_id,
                    &OutboundEvent::UserLeft {
                        user_id: identity.user_id,
                        user_type: identity.role,
                        text: format!("{} left the chat", identity.user_name),
                        user_name: identity.user_name,
                    },
                );
            }
        }
    }

    /// Dispatch one inbound event for a session.
    ///
    /// The caller (the connection's read loop) reports an `Err` back to
    /// that session as an `error` event; no side effects have occurred
    /// by then.
    pub fn handle_event(
        &self,
        session_id: SessionId,
        event: InboundEvent,
    ) -> Result<(), ChatError> {
        match event {
            InboundEvent::JoinRoom { room_id, user_id, user_type, user_name } => {
                self.join(session_id, room_id, user_id, user_type, user_name)
            },
            InboundEvent::SendMessage { room_id, message } => {
                self.send_message(session_id, room_id, &message)
            },
            InboundEvent::Typing { room_id, is_typing } => {
                self.set_typing(session_id, room_id, is_typing)
            },
            InboundEvent::EndChat { room_id } => self.end_chat(session_id, room_id),
        }
    }

    /// Bind a session to a room, replay recent history to it, and tell
    /// the room's other members.
    fn join(
        &self,
        session_id: SessionId,
        room_id: RoomId,
        user_id: String,
        user_type: Role,
        user_name: String,
    ) -> Result<(), ChatError> {
        let slot = self.rooms.slot(room_id)?;
        let guard = lock_slot(&slot);

        let identity =
            Identity { user_id: user_id.clone(), user_name: user_name.clone(), role: user_type };
        if !self.sessions.bind(session_id, room_id, identity) {
            return Err(ChatError::SessionNotFound(session_id));
        }

        // Bind and replay happen under the room lock. Appends broadcast
        // under this same lock, so no message can land both in the replay
        // window and as a live broadcast to the joining session; its total
        // order matches a session that was present throughout.
        let messages = self.log.history(room_id, self.config.history_replay)?;
        self.fanout.send_to(session_id, &OutboundEvent::MessageHistory { messages });

        self.fanout.broadcast_except(
            room_id,
            session_id,
            &OutboundEvent::UserJoined {
                user_id,
                user_type,
                text: format!("{user_name} joined the chat"),
                user_name: user_name.clone(),
            },
        );

        if user_type == Role::Clinician {
            self.fanout.broadcast_except(
                room_id,
                session_id,
                &OutboundEvent::DoctorJoined { doctor_name: user_name },
            );
        }

        let status = guard.room.status;
        drop(guard);
        tracing::info!(session_id, %room_id, ?status, "session joined room");
        Ok(())
    }

    /// Append a message and fan it out to every member of the room.
    fn send_message(
        &self,
        session_id: SessionId,
        room_id: RoomId,
        body: &str,
    ) -> Result<(), ChatError> {
        let identity = self.authorize(session_id, room_id)?;

        let slot = self.rooms.slot(room_id)?;
        let mut guard = lock_slot(&slot);

        let message = self.log.append(
            &mut guard,
            &identity.user_id,
            &identity.user_name,
            identity.role,
            body,
        )?;
        self.rooms.touch_locked(&mut guard)?;

        // Broadcast under the room lock: fan-out order equals append order.
        self.fanout.broadcast(room_id, &OutboundEvent::NewMessage { message });
        Ok(())
    }

    /// Record and broadcast a typing-state change to the room's other
    /// members. Never persisted.
    fn set_typing(
        &self,
        session_id: SessionId,
        room_id: RoomId,
        is_typing: bool,
    ) -> Result<(), ChatError> {
        let identity = self.authorize(session_id, room_id)?;

        self.presence.set_typing(session_id, room_id, is_typing, Instant::now());
        self.fanout.broadcast_except(
            room_id,
            session_id,
            &OutboundEvent::UserTyping {
                user_name: identity.user_name,
                user_type: identity.role,
                is_typing,
            },
        );
        Ok(())
    }

    /// End the consultation for everyone in the room.
    fn end_chat(&self, session_id: SessionId, room_id: RoomId) -> Result<(), ChatError> {
        self.authorize(session_id, room_id)?;

        if self.rooms.complete(room_id)? {
            self.fanout.broadcast(room_id, &OutboundEvent::ChatEnded);
        }
        Ok(())
    }

    /// Check the session is bound to the room it claims to act on.
    fn authorize(&self, session_id: SessionId, room_id: RoomId) -> Result<Identity, ChatError> {
        if self.sessions.room_of(session_id) != Some(room_id) {
            return Err(ChatError::Unauthorized { session_id, room_id });
        }
        self.sessions
            .identity(session_id)
            .ok_or(ChatError::Unauthorized { session_id, room_id })
    }

    // Request/response surface, consumed by the presentation layer.

    /// Create a room for a patient request, or return the existing
    /// waiting/active one. A freshly created room is announced to all
    /// idle sessions.
    pub fn request_room(
        &self,
        patient_id: &str,
        patient_name: &str,
        assessment: Option<serde_json::Value>,
        priority: Priority,
    ) -> Result<Room, ChatError> {
        let (room, created) =
            self.rooms.request_room(patient_id, patient_name, assessment, priority)?;
        if created {
            self.fanout.broadcast_global(&OutboundEvent::NewWaitingRoom { room: room.clone() });
        }
        Ok(room)
    }

    /// Fetch a room by id.
    pub fn get_room(&self, room_id: RoomId) -> Result<Room, ChatError> {
        self.rooms.get_room(room_id)
    }

    /// Snapshot of the waiting queue, priority descending then age.
    pub fn list_waiting(&self) -> Vec<Room> {
        self.rooms.list_waiting()
    }

    /// The most recent `limit` messages of a room, ascending seq order.
    pub fn history(&self, room_id: RoomId, limit: usize) -> Result<Vec<Message>, ChatError> {
        self.log.history(room_id, limit)
    }

    /// Clinician accepts a waiting room; first writer wins. The room's
    /// members are told the clinician joined.
    pub fn accept(
        &self,
        room_id: RoomId,
        clinician_id: &str,
        clinician_name: &str,
    ) -> Result<Room, ChatError> {
        let room = self.rooms.accept(room_id, clinician_id, clinician_name)?;
        self.fanout.broadcast(
            room_id,
            &OutboundEvent::DoctorJoined { doctor_name: clinician_name.to_string() },
        );
        Ok(room)
    }

    /// Owner-initiated completion (cleanup path); idempotent.
    pub fn complete(&self, room_id: RoomId) -> Result<(), ChatError> {
        if self.rooms.complete(room_id)? {
            self.fanout.broadcast(room_id, &OutboundEvent::ChatEnded);
        }
        Ok(())
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

impl<S: ChatStore> std::fmt::Debug for ChatGateway<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatGateway").field("session_count", &self.sessions.len()).finish()
    }
}
