//! Session registry: the arena of live connections.
//!
//! One record per connection, created on connect and removed
//! deterministically on disconnect, leaving no durable trace. The
//! registry keeps bidirectional mappings between sessions and rooms:
//! session → its (at most one) joined room, and room → member sessions
//! for broadcast.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, PoisonError, RwLock},
};

use careline_proto::{OutboundEvent, Role, RoomId, SessionId};

/// Delivery endpoint of one session.
///
/// Production wraps an unbounded channel into the connection's writer
/// task; tests use a buffering sink. Delivery must not block.
pub trait EventSink: Send + Sync + 'static {
    /// Deliver an event to the session. Returns `false` if the session is
    /// gone; fan-out skips such sessions silently.
    fn deliver(&self, event: &OutboundEvent) -> bool;
}

/// Transient identity a session declares when joining a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Opaque user id.
    pub user_id: String,
    /// Display name.
    pub user_name: String,
    /// Patient or clinician.
    pub role: Role,
}

/// One live connection's state.
struct SessionRecord {
    sink: Arc<dyn EventSink>,
    identity: Option<Identity>,
    room_id: Option<RoomId>,
}

struct SessionsInner {
    sessions: HashMap<SessionId, SessionRecord>,
    room_members: HashMap<RoomId, HashSet<SessionId>>,
}

/// Registry of live sessions and their room bindings.
pub struct SessionRegistry {
    inner: RwLock<SessionsInner>,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(SessionsInner {
                sessions: HashMap::new(),
                room_members: HashMap::new(),
            }),
        }
    }

    /// Register a new connection. Returns `false` if the id is taken.
    pub fn register(&self, session_id: SessionId, sink: Arc<dyn EventSink>) -> bool {
        let mut inner = self.write_inner();
        if inner.sessions.contains_key(&session_id) {
            return false;
        }
        inner
            .sessions
            .insert(session_id, SessionRecord { sink, identity: None, room_id: None });
        true
    }

    /// Remove a connection and its room membership.
    ///
    /// Returns the identity and room the session was bound to, so the
    /// caller can notify the room's remaining members.
    pub fn unregister(&self, session_id: SessionId) -> Option<(Option<Identity>, Option<RoomId>)> {
        let mut inner = self.write_inner();
        let record = inner.sessions.remove(&session_id)?;

        if let Some(room_id) = record.room_id {
            if let Some(members) = inner.room_members.get_mut(&room_id) {
                members.remove(&session_id);
                if members.is_empty() {
                    inner.room_members.remove(&room_id);
                }
            }
        }

        Some((record.identity, record.room_id))
    }

    /// Bind a session to a room under the given identity.
    ///
    /// A session joins at most one room; a re-join replaces the previous
    /// binding. Returns `false` if the session is not registered.
    pub fn bind(&self, session_id: SessionId, room_id: RoomId, identity: Identity) -> bool {
        let mut inner = self.write_inner();

        let previous = match inner.sessions.get_mut(&session_id) {
            Some(record) => {
                let previous = record.room_id.replace(room_id);
                record.identity = Some(identity);
                previous
            },
            None => return false,
        };

        if let Some(old_room) = previous {
            if old_room != room_id {
                if let Some(members) = inner.room_members.get_mut(&old_room) {
                    members.remove(&session_id);
                    if members.is_empty() {
                        inner.room_members.remove(&old_room);
                    }
                }
            }
        }

        inner.room_members.entry(room_id).or_default().insert(session_id);
        true
    }

    /// The room a session is currently bound to.
    pub fn room_of(&self, session_id: SessionId) -> Option<RoomId> {
        let inner = self.read_inner();
        inner.sessions.get(&session_id).and_then(|record| record.room_id)
    }

    /// The identity a session declared on join.
    pub fn identity(&self, session_id: SessionId) -> Option<Identity> {
        let inner = self.read_inner();
        inner.sessions.get(&session_id).and_then(|record| record.identity.clone())
    }

    /// Whether a session is registered.
    pub fn contains(&self, session_id: SessionId) -> bool {
        let inner = self.read_inner();
        inner.sessions.contains_key(&session_id)
    }

    /// Sinks of all sessions bound to a room, with their ids.
    pub fn members(&self, room_id: RoomId) -> Vec<(SessionId, Arc<dyn EventSink>)> {
        let inner = self.read_inner();
        inner
            .room_members
            .get(&room_id)
            .into_iter()
            .flatten()
            .filter_map(|id| inner.sessions.get(id).map(|record| (*id, Arc::clone(&record.sink))))
            .collect()
    }

    /// Sinks of all sessions not bound to any room (idle clinician
    /// dashboards waiting for requests).
    pub fn idle(&self) -> Vec<(SessionId, Arc<dyn EventSink>)> {
        let inner = self.read_inner();
        inner
            .sessions
            .iter()
            .filter(|(_, record)| record.room_id.is_none())
            .map(|(id, record)| (*id, Arc::clone(&record.sink)))
            .collect()
    }

    /// The sink of one session, if it is still connected.
    pub fn sink(&self, session_id: SessionId) -> Option<Arc<dyn EventSink>> {
        let inner = self.read_inner();
        inner.sessions.get(&session_id).map(|record| Arc::clone(&record.sink))
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.read_inner().sessions.len()
    }

    /// Whether no sessions are connected.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_inner(&self) -> std::sync::RwLockReadGuard<'_, SessionsInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_inner(&self) -> std::sync::RwLockWriteGuard<'_, SessionsInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
