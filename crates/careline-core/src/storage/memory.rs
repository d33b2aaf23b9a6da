//! In-memory store.
//!
//! The production backend for the single-process durable-log model, and
//! the backend used by tests. `HashMap` for room records, `Vec` per room
//! for the ordered message log. All state sits behind one `Arc<Mutex<_>>`
//! so clones share the same store.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use careline_proto::{Message, Room, RoomId};

use super::{ChatStore, StorageError};

/// In-memory implementation of [`ChatStore`].
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryStoreInner>>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Room records by id.
    rooms: HashMap<RoomId, Room>,
    /// Message logs by room, kept in sequence order.
    logs: HashMap<RoomId, Vec<Message>>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages stored for a room. Useful in tests.
    pub fn message_count(&self, room_id: RoomId) -> usize {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.logs.get(&room_id).map_or(0, Vec::len)
    }
}

impl ChatStore for MemoryStore {
    fn store_room(&self, room: &Room) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.rooms.insert(room.room_id, room.clone());
        Ok(())
    }

    fn load_room(&self, room_id: RoomId) -> Result<Option<Room>, StorageError> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.rooms.get(&room_id).cloned())
    }

    fn load_rooms(&self) -> Result<Vec<Room>, StorageError> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.rooms.values().cloned().collect())
    }

    fn append_message(&self, message: &Message) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let log = inner.logs.entry(message.room_id).or_default();

        let expected = log.len() as u64;
        if message.seq != expected {
            return Err(StorageError::SeqConflict { expected, got: message.seq });
        }

        log.push(message.clone());
        Ok(())
    }

    fn latest_seq(&self, room_id: RoomId) -> Result<Option<u64>, StorageError> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.logs.get(&room_id).and_then(|log| log.last()).map(|m| m.seq))
    }

    fn tail(&self, room_id: RoomId, limit: usize) -> Result<Vec<Message>, StorageError> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(log) = inner.logs.get(&room_id) else {
            return Ok(Vec::new());
        };

        let start = log.len().saturating_sub(limit);
        Ok(log[start..].to_vec())
    }
}
