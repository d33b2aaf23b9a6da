//! Inbound and outbound chat events.
//!
//! One `InboundEvent` arrives per WebSocket text frame; the gateway
//! dispatches on the tag and validates the payload against the session's
//! room binding. `OutboundEvent`s flow the other way, either to a single
//! session (history replay, errors) or fanned out to a room.

use serde::{Deserialize, Serialize};

use crate::{
    RoomId,
    types::{Message, Role, Room},
};

/// Events a client may send over its connection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum InboundEvent {
    /// Bind this session to a room and replay recent history.
    JoinRoom {
        /// Room to join.
        room_id: RoomId,
        /// Identity of the joining user.
        user_id: String,
        /// Patient or clinician.
        user_type: Role,
        /// Display name shown to the other participant.
        user_name: String,
    },

    /// Append a message to the joined room.
    SendMessage {
        /// Target room; must match the session's binding.
        room_id: RoomId,
        /// Message body.
        message: String,
    },

    /// Update this session's typing indicator.
    Typing {
        /// Target room; must match the session's binding.
        room_id: RoomId,
        /// Whether the user is currently typing.
        is_typing: bool,
    },

    /// End the consultation for both participants.
    EndChat {
        /// Target room; must match the session's binding.
        room_id: RoomId,
    },
}

/// Events delivered to client sessions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum OutboundEvent {
    /// Replay of recent messages, ascending sequence order.
    /// Sent only to the joining session.
    MessageHistory {
        /// Messages, oldest of the window first.
        messages: Vec<Message>,
    },

    /// A message was appended to the room.
    NewMessage {
        /// The stored message, including its assigned sequence number.
        message: Message,
    },

    /// Another participant joined the room.
    UserJoined {
        /// Joining user's id.
        user_id: String,
        /// Joining user's display name.
        user_name: String,
        /// Patient or clinician.
        user_type: Role,
        /// Human-readable system line, e.g. "Alice joined the chat".
        text: String,
    },

    /// A participant's connection left the room.
    UserLeft {
        /// Leaving user's id.
        user_id: String,
        /// Leaving user's display name.
        user_name: String,
        /// Patient or clinician.
        user_type: Role,
        /// Human-readable system line.
        text: String,
    },

    /// A clinician was assigned to the room.
    DoctorJoined {
        /// Display name of the clinician.
        doctor_name: String,
    },

    /// Another participant's typing state changed.
    UserTyping {
        /// Typing user's display name.
        user_name: String,
        /// Patient or clinician.
        user_type: Role,
        /// Whether they are currently typing.
        is_typing: bool,
    },

    /// The consultation was ended.
    ChatEnded,

    /// A new request entered the waiting queue. Broadcast to sessions
    /// not yet bound to a room.
    NewWaitingRoom {
        /// The freshly created room.
        room: Room,
    },

    /// A request from this session failed; no side effects took place.
    Error {
        /// Why the request was rejected.
        message: String,
    },
}
