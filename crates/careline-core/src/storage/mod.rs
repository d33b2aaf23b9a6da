//! Storage abstraction for rooms and the per-room message log.
//!
//! The trait is synchronous (no async) so the core stays Sans-IO and every
//! operation can run inside a short per-room critical section. Callers are
//! expected to hold the room's lock while appending, which gives the
//! single-writer-per-room serialization the log relies on.

mod error;
mod memory;

use careline_proto::{Message, Room, RoomId};
pub use error::StorageError;
pub use memory::MemoryStore;

/// Durable store for rooms and messages.
///
/// Must be `Clone + Send + Sync`: implementations share internal state via
/// `Arc`, so clones access the same underlying store. Messages outlive
/// their room object and stay queryable by room id after completion.
pub trait ChatStore: Clone + Send + Sync + 'static {
    /// Insert or overwrite a room record.
    fn store_room(&self, room: &Room) -> Result<(), StorageError>;

    /// Load a room record. `None` if the room was never stored.
    fn load_room(&self, room_id: RoomId) -> Result<Option<Room>, StorageError>;

    /// Load all room records, in no particular order.
    ///
    /// Used by the registry to rebuild its table on startup.
    fn load_rooms(&self) -> Result<Vec<Room>, StorageError>;

    /// Append a message to its room's log.
    ///
    /// # Invariants
    ///
    /// - Pre: `message.seq` equals the current length of the room's log
    /// - Post: the message is persisted at position `seq`
    ///
    /// Returns [`StorageError::SeqConflict`] on a gap, which indicates the
    /// caller bypassed the room's lock.
    fn append_message(&self, message: &Message) -> Result<(), StorageError>;

    /// Latest sequence number in a room's log. `None` if the log is empty.
    fn latest_seq(&self, room_id: RoomId) -> Result<Option<u64>, StorageError>;

    /// The most recent `limit` messages of a room, in ascending sequence
    /// order (oldest of the returned window first).
    fn tail(&self, room_id: RoomId, limit: usize) -> Result<Vec<Message>, StorageError>;
}
