//! Real-time triage chat core.
//!
//! Synchronous, transport-agnostic engine for live patient/clinician
//! consultations: room lifecycle (waiting → active → completed), ordered
//! per-room message logs, session bindings, typing presence, and event
//! fan-out. The presentation layer feeds inbound events in and wires an
//! [`EventSink`] per connection for delivery; the core never performs IO
//! beyond the pluggable [`ChatStore`].
//!
//! Concurrency model: a registry-level lock guards room-table membership
//! only; each room carries its own lock serializing appends, accept and
//! completion. Fan-out for a room happens under that room's lock, so
//! every member observes one room's events in a single order.

mod clock;
mod error;
mod fanout;
mod gateway;
mod message_log;
mod presence;
mod registry;
mod session;
mod storage;

pub use error::ChatError;
pub use fanout::Fanout;
pub use gateway::{ChatGateway, GatewayConfig};
pub use message_log::{MAX_BODY_LEN, MessageLog};
pub use presence::{PresenceTracker, TYPING_TTL};
pub use registry::RoomRegistry;
pub use session::{EventSink, Identity, SessionRegistry};
pub use storage::{ChatStore, MemoryStore, StorageError};
