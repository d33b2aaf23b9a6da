//! Room registry: room lifecycle and assignment invariants.
//!
//! The registry owns the room table. The outer `RwLock` guards only map
//! membership and the patient index; every mutation of a single room
//! (accept, complete, touch, sequence allocation) happens under that
//! room's own mutex, so unrelated rooms never block each other.
//!
//! Lock order is always registry → room. No method takes the registry
//! lock while holding a room lock, and no awaits happen under either
//! (the whole core is synchronous).
//!
//! # Assignment invariant
//!
//! `accept` is a compare-and-set keyed on `status == Waiting`, executed
//! under the room lock. For any number of concurrent accept calls on one
//! room, exactly one observes `Waiting` and wins; the rest get
//! [`ChatError::Conflict`].

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock},
};

use careline_proto::{Priority, Room, RoomId, RoomStatus};

use crate::{clock::now_millis, error::ChatError, storage::ChatStore};

/// A room record plus its message-sequencing state.
///
/// Exactly one slot exists per room; the mutex around it is the per-room
/// lock described in the module docs.
pub(crate) struct RoomSlot {
    /// Current room record. Mirrors what storage holds.
    pub(crate) room: Room,
    /// Next message sequence number to assign.
    pub(crate) next_seq: u64,
}

/// Lock a room slot, recovering from poisoning.
///
/// A poisoned slot means some handler panicked mid-mutation; the stored
/// room record is still authoritative, so continuing is safe.
pub(crate) fn lock_slot(slot: &Mutex<RoomSlot>) -> MutexGuard<'_, RoomSlot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

struct RegistryInner {
    /// Room id → slot.
    rooms: HashMap<RoomId, Arc<Mutex<RoomSlot>>>,
    /// Patient id → their current waiting/active room.
    by_patient: HashMap<String, RoomId>,
}

/// Owns room lifecycle: creation, assignment, completion.
pub struct RoomRegistry<S: ChatStore> {
    store: S,
    inner: RwLock<RegistryInner>,
}

impl<S: ChatStore> RoomRegistry<S> {
    /// Create a registry, rebuilding the room table from storage.
    ///
    /// Sequence counters resume from the latest stored message, so a
    /// restarted process continues numbering without gaps.
    pub fn recover(store: S) -> Result<Self, ChatError> {
        let mut rooms = HashMap::new();
        let mut by_patient = HashMap::new();

        for room in store.load_rooms()? {
            let next_seq = store.latest_seq(room.room_id)?.map_or(0, |seq| seq + 1);
            if !room.status.is_terminal() {
                by_patient.insert(room.patient_id.clone(), room.room_id);
            }
            rooms.insert(room.room_id, Arc::new(Mutex::new(RoomSlot { room, next_seq })));
        }

        if !rooms.is_empty() {
            tracing::info!(room_count = rooms.len(), "recovered room table from storage");
        }

        Ok(Self { store, inner: RwLock::new(RegistryInner { rooms, by_patient }) })
    }

    /// Create a room for a patient request, or return the patient's
    /// existing waiting/active room unchanged.
    ///
    /// Returns the room and whether this call created it; a created room
    /// should be announced to idle clinician sessions by the caller.
    pub fn request_room(
        &self,
        patient_id: &str,
        patient_name: &str,
        assessment: Option<serde_json::Value>,
        priority: Priority,
    ) -> Result<(Room, bool), ChatError> {
        let patient_id = patient_id.trim();
        let patient_name = patient_name.trim();
        if patient_id.is_empty() {
            return Err(ChatError::InvalidInput("patientId must not be empty".to_string()));
        }
        if patient_name.is_empty() {
            return Err(ChatError::InvalidInput("patientName must not be empty".to_string()));
        }

        let mut inner = self.write_inner();

        // Duplicate detection: one waiting/active room per patient.
        if let Some(&existing) = inner.by_patient.get(patient_id) {
            if let Some(slot) = inner.rooms.get(&existing) {
                let guard = lock_slot(slot);
                if !guard.room.status.is_terminal() {
                    return Ok((guard.room.clone(), false));
                }
            }
            // Mapping points at a completed room; a fresh request starts over.
            inner.by_patient.remove(patient_id);
        }

        let now = now_millis();
        let room = Room {
            room_id: uuid::Uuid::now_v7(),
            patient_id: patient_id.to_string(),
            patient_name: patient_name.to_string(),
            clinician_id: None,
            clinician_name: None,
            status: RoomStatus::Waiting,
            priority,
            created_at: now,
            last_activity: now,
            assessment,
        };
        self.store.store_room(&room)?;

        inner.by_patient.insert(patient_id.to_string(), room.room_id);
        inner.rooms.insert(
            room.room_id,
            Arc::new(Mutex::new(RoomSlot { room: room.clone(), next_seq: 0 })),
        );

        tracing::info!(
            room_id = %room.room_id,
            priority = ?room.priority,
            "room created for patient request"
        );

        Ok((room, true))
    }

    /// Fetch a room by id.
    pub fn get_room(&self, room_id: RoomId) -> Result<Room, ChatError> {
        let slot = self.slot(room_id)?;
        let guard = lock_slot(&slot);
        Ok(guard.room.clone())
    }

    /// Snapshot of the waiting queue: rooms with `status == Waiting`,
    /// ordered by priority descending, then creation time ascending.
    ///
    /// Recomputed on every call; not a live cursor.
    pub fn list_waiting(&self) -> Vec<Room> {
        let inner = self.read_inner();

        let mut waiting: Vec<Room> = inner
            .rooms
            .values()
            .filter_map(|slot| {
                let guard = lock_slot(slot);
                (guard.room.status == RoomStatus::Waiting).then(|| guard.room.clone())
            })
            .collect();

        waiting.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then(a.created_at.cmp(&b.created_at))
                .then(a.room_id.cmp(&b.room_id))
        });
        waiting
    }

    /// Atomically assign a clinician: `Waiting → Active`.
    ///
    /// Fails with [`ChatError::Conflict`] unless the room is exactly
    /// `Waiting` at the moment the room lock is held.
    pub fn accept(
        &self,
        room_id: RoomId,
        clinician_id: &str,
        clinician_name: &str,
    ) -> Result<Room, ChatError> {
        let slot = self.slot(room_id)?;
        let mut guard = lock_slot(&slot);

        match guard.room.status {
            RoomStatus::Waiting => {
                let mut updated = guard.room.clone();
                updated.status = RoomStatus::Active;
                updated.clinician_id = Some(clinician_id.to_string());
                updated.clinician_name = Some(clinician_name.to_string());
                updated.last_activity = now_millis();

                // Persist before committing so a storage failure leaves
                // the in-memory room untouched and still acceptable.
                self.store.store_room(&updated)?;
                guard.room = updated.clone();

                tracing::info!(%room_id, clinician_id, "room accepted");
                Ok(updated)
            },
            RoomStatus::Active | RoomStatus::Completed => Err(ChatError::Conflict(room_id)),
        }
    }

    /// Transition any non-terminal status to `Completed`.
    ///
    /// Idempotent: completing a completed room is a no-op. Returns `true`
    /// if this call performed the transition, so the caller knows whether
    /// to announce the end of the session.
    pub fn complete(&self, room_id: RoomId) -> Result<bool, ChatError> {
        let slot = self.slot(room_id)?;
        let mut guard = lock_slot(&slot);

        if guard.room.status.is_terminal() {
            return Ok(false);
        }

        let mut updated = guard.room.clone();
        updated.status = RoomStatus::Completed;
        updated.last_activity = now_millis();
        self.store.store_room(&updated)?;
        guard.room = updated;

        tracing::info!(%room_id, "room completed");
        Ok(true)
    }

    /// Update a room's last-activity time.
    pub fn touch(&self, room_id: RoomId) -> Result<(), ChatError> {
        let slot = self.slot(room_id)?;
        let mut guard = lock_slot(&slot);
        self.touch_locked(&mut guard)
    }

    /// `touch` for callers already holding the room lock (message append).
    pub(crate) fn touch_locked(&self, slot: &mut RoomSlot) -> Result<(), ChatError> {
        let mut updated = slot.room.clone();
        updated.last_activity = now_millis();
        self.store.store_room(&updated)?;
        slot.room = updated;
        Ok(())
    }

    /// Look up a room's slot for locking.
    pub(crate) fn slot(&self, room_id: RoomId) -> Result<Arc<Mutex<RoomSlot>>, ChatError> {
        let inner = self.read_inner();
        inner.rooms.get(&room_id).cloned().ok_or(ChatError::RoomNotFound(room_id))
    }

    fn read_inner(&self) -> std::sync::RwLockReadGuard<'_, RegistryInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_inner(&self) -> std::sync::RwLockWriteGuard<'_, RegistryInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S: ChatStore> std::fmt::Debug for RoomRegistry<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.read_inner();
        f.debug_struct("RoomRegistry").field("room_count", &inner.rooms.len()).finish()
    }
}
