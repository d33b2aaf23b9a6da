//! Message log: durable, ordered message storage per room.
//!
//! Sequence numbers are allocated from the room's slot while the caller
//! holds the room lock, which serializes appends with `accept` and
//! `complete` on the same room. The counter only advances once the store
//! has persisted the message, so a failed or rejected append never leaves
//! a gap.

use careline_proto::{Message, Role, RoomId};

use crate::{clock::now_millis, error::ChatError, registry::RoomSlot, storage::ChatStore};

/// Maximum message body length in Unicode scalar values.
pub const MAX_BODY_LEN: usize = 1000;

/// Append and replay of per-room message history.
pub struct MessageLog<S: ChatStore> {
    store: S,
}

impl<S: ChatStore> MessageLog<S> {
    /// Create a log backed by `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Validate and normalize a message body.
    ///
    /// Trims surrounding whitespace; rejects empty and oversized bodies.
    pub fn validate_body(body: &str) -> Result<&str, ChatError> {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return Err(ChatError::InvalidInput("message must not be empty".to_string()));
        }
        if trimmed.chars().count() > MAX_BODY_LEN {
            return Err(ChatError::InvalidInput(format!(
                "message exceeds {MAX_BODY_LEN} characters"
            )));
        }
        Ok(trimmed)
    }

    /// Append a message to a room's log.
    ///
    /// The caller must hold the room's lock (it passes the locked slot).
    /// Fails with [`ChatError::RoomTerminal`] if the room is completed and
    /// [`ChatError::InvalidInput`] for an empty or oversized body; neither
    /// failure advances the sequence counter.
    pub(crate) fn append(
        &self,
        slot: &mut RoomSlot,
        sender_id: &str,
        sender_name: &str,
        sender_role: Role,
        body: &str,
    ) -> Result<Message, ChatError> {
        if slot.room.status.is_terminal() {
            return Err(ChatError::RoomTerminal(slot.room.room_id));
        }
        let body = Self::validate_body(body)?;

        let message = Message {
            id: uuid::Uuid::now_v7(),
            room_id: slot.room.room_id,
            seq: slot.next_seq,
            sender_id: sender_id.to_string(),
            sender_name: sender_name.to_string(),
            sender_role,
            body: body.to_string(),
            sent_at: now_millis(),
        };

        self.store.append_message(&message)?;
        slot.next_seq += 1;

        tracing::debug!(
            room_id = %message.room_id,
            seq = message.seq,
            role = ?sender_role,
            "message appended"
        );

        Ok(message)
    }

    /// The most recent `limit` messages of a room, ascending by sequence
    /// number. The oldest message of the returned window comes first, so
    /// replaying it reproduces the live order.
    ///
    /// Unknown rooms yield an empty history: messages outlive room
    /// records and absence of both is not an error here.
    pub fn history(&self, room_id: RoomId, limit: usize) -> Result<Vec<Message>, ChatError> {
        Ok(self.store.tail(room_id, limit)?)
    }
}
