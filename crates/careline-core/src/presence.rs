//! Presence/typing tracker: ephemeral per-session state.
//!
//! Typing state lives only in memory, keyed by session, and is superseded
//! by any later call from the same session. Entries self-expire after
//! [`TYPING_TTL`] of silence so a dropped "stopped typing" event cannot
//! leave a stale indicator. Chat delivery never depends on this module.

use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
    time::{Duration, Instant},
};

use careline_proto::{RoomId, SessionId};

/// Inactivity window after which a typing indicator is treated as off.
pub const TYPING_TTL: Duration = Duration::from_secs(5);

struct TypingState {
    room_id: RoomId,
    is_typing: bool,
    updated_at: Instant,
}

/// Tracks which sessions are currently typing, per room.
#[derive(Default)]
pub struct PresenceTracker {
    inner: Mutex<HashMap<SessionId, TypingState>>,
}

impl PresenceTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a typing-state change for a session.
    ///
    /// Also drops any expired entries, keeping the map bounded by the
    /// number of recently active sessions.
    pub fn set_typing(&self, session_id: SessionId, room_id: RoomId, is_typing: bool, now: Instant) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);

        inner.retain(|_, state| now.saturating_duration_since(state.updated_at) < TYPING_TTL);
        inner.insert(session_id, TypingState { room_id, is_typing, updated_at: now });
    }

    /// Whether a session is typing, honoring the expiry window.
    pub fn is_typing(&self, session_id: SessionId, now: Instant) -> bool {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.get(&session_id).is_some_and(|state| {
            state.is_typing && now.saturating_duration_since(state.updated_at) < TYPING_TTL
        })
    }

    /// Forget a session entirely. Returns the room it was typing in, if
    /// its indicator was still on, so the caller can notify that room.
    pub fn clear(&self, session_id: SessionId) -> Option<RoomId> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.remove(&session_id).filter(|state| state.is_typing).map(|state| state.room_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typing_state_is_superseded_by_later_calls() {
        let tracker = PresenceTracker::new();
        let room_id = uuid::Uuid::now_v7();
        let now = Instant::now();

        tracker.set_typing(1, room_id, true, now);
        assert!(tracker.is_typing(1, now));

        tracker.set_typing(1, room_id, false, now);
        assert!(!tracker.is_typing(1, now));
    }

    #[test]
    fn typing_expires_after_ttl() {
        let tracker = PresenceTracker::new();
        let room_id = uuid::Uuid::now_v7();
        let now = Instant::now();

        tracker.set_typing(1, room_id, true, now);

        let just_before = now + TYPING_TTL - Duration::from_millis(1);
        assert!(tracker.is_typing(1, just_before));

        let after = now + TYPING_TTL;
        assert!(!tracker.is_typing(1, after));
    }

    #[test]
    fn clear_reports_room_only_when_typing() {
        let tracker = PresenceTracker::new();
        let room_id = uuid::Uuid::now_v7();
        let now = Instant::now();

        tracker.set_typing(1, room_id, true, now);
        assert_eq!(tracker.clear(1), Some(room_id));

        tracker.set_typing(2, room_id, false, now);
        assert_eq!(tracker.clear(2), None);

        // Unknown session.
        assert_eq!(tracker.clear(3), None);
    }
}
