//! Wire types for the Careline triage chat protocol.
//!
//! This crate defines the data model (rooms, messages, priorities) and the
//! JSON events exchanged over a chat connection. It carries no behavior
//! beyond serialization; all state transitions live in `careline-core`.
//!
//! # Wire format
//!
//! Events are JSON objects tagged by a `"type"` field, with camelCase
//! payload fields, matching the browser clients:
//!
//! ```json
//! {"type": "send_message", "roomId": "0192…", "message": "hello"}
//! ```

mod events;
mod types;

pub use events::{InboundEvent, OutboundEvent};
pub use types::{Message, Priority, Role, Room, RoomStatus};

/// Identifier of one live connection, assigned by the gateway.
pub type SessionId = u64;

/// Identifier of a consultation room.
pub type RoomId = uuid::Uuid;
