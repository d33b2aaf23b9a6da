//! Chat error taxonomy.
//!
//! Every inbound operation resolves to either a success or one of these
//! errors. None of them is fatal to the process: a failing call is
//! rejected, reported to the offending caller only, and leaves all rooms
//! in a consistent state.

use careline_proto::{RoomId, SessionId};
use thiserror::Error;

use crate::storage::StorageError;

/// Errors surfaced by core chat operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    /// A field was empty or oversized. The single call is rejected;
    /// retrying the same input will fail again.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The room does not exist.
    #[error("room not found: {0}")]
    RoomNotFound(RoomId),

    /// The session is not registered with the gateway.
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    /// The room was not in the state the caller expected, e.g. a second
    /// accept on an already-active room. The caller should re-fetch the
    /// room rather than retry blindly.
    #[error("room {0} already accepted or completed")]
    Conflict(RoomId),

    /// A mutation was attempted on a completed room. Terminal; the room
    /// will never accept it.
    #[error("room {0} is completed")]
    RoomTerminal(RoomId),

    /// The session is not bound to the room it tried to act on. The call
    /// is dropped without side effects.
    #[error("session {session_id} is not joined to room {room_id}")]
    Unauthorized {
        /// The offending session.
        session_id: SessionId,
        /// The room it claimed to act on.
        room_id: RoomId,
    },

    /// The storage backend failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let id = uuid::Uuid::nil();

        let err = ChatError::Conflict(id);
        assert_eq!(
            err.to_string(),
            "room 00000000-0000-0000-0000-000000000000 already accepted or completed"
        );

        let err = ChatError::Unauthorized { session_id: 7, room_id: id };
        assert_eq!(
            err.to_string(),
            "session 7 is not joined to room 00000000-0000-0000-0000-000000000000"
        );
    }
}
