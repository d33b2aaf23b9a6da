//! Property-based tests for the room registry and message log.

use careline_core::{MemoryStore, RoomRegistry};
use careline_proto::{Priority, RoomStatus};
use proptest::prelude::*;

fn priority_strategy() -> impl Strategy<Value = Priority> {
    prop_oneof![
        Just(Priority::Low),
        Just(Priority::Medium),
        Just(Priority::High),
        Just(Priority::Urgent),
    ]
}

fn patient_id() -> impl Strategy<Value = String> {
    "[a-z]{1,8}"
}

/// Property: requesting a room for the same patient any number of times
/// yields the same room, and exactly the first call creates it.
#[test]
fn prop_request_room_is_idempotent_per_patient() {
    proptest!(|(id in patient_id(), priority in priority_strategy(), repeats in 1usize..6)| {
        let registry = RoomRegistry::recover(MemoryStore::new())?;

        let (first, created) = registry.request_room(&id, "Pat", None, priority)?;
        prop_assert!(created);

        for _ in 0..repeats {
            let (again, created) = registry.request_room(&id, "Pat", None, priority)?;
            prop_assert!(!created);
            prop_assert_eq!(again.room_id, first.room_id);
        }
        prop_assert_eq!(registry.list_waiting().len(), 1);
    });
}

/// Property: the waiting queue is sorted by priority descending, and
/// never contains accepted or completed rooms.
#[test]
fn prop_waiting_queue_sorted_and_waiting_only() {
    proptest!(|(priorities in prop::collection::vec(priority_strategy(), 1..12),
                accept_first in any::<bool>())| {
        let registry = RoomRegistry::recover(MemoryStore::new())?;

        let mut rooms = Vec::new();
        for (i, priority) in priorities.iter().enumerate() {
            let (room, _) = registry.request_room(&format!("p{i}"), "Pat", None, *priority)?;
            rooms.push(room);
        }

        if accept_first {
            registry.accept(rooms[0].room_id, "d1", "Doc")?;
        }

        let queue = registry.list_waiting();
        for room in &queue {
            prop_assert_eq!(room.status, RoomStatus::Waiting);
        }
        if accept_first {
            prop_assert!(queue.iter().all(|r| r.room_id != rooms[0].room_id));
        }
        for pair in queue.windows(2) {
            prop_assert!(pair[0].priority >= pair[1].priority);
        }
    });
}

/// Property: accepting a room exactly once succeeds; every further
/// attempt conflicts and the winner's assignment is never overwritten.
#[test]
fn prop_accept_is_first_writer_wins() {
    proptest!(|(attempts in 2usize..8)| {
        let registry = RoomRegistry::recover(MemoryStore::new())?;
        let (room, _) = registry.request_room("p1", "Pat", None, Priority::High)?;

        let mut wins = 0;
        for i in 0..attempts {
            if registry.accept(room.room_id, &format!("d{i}"), "Doc").is_ok() {
                wins += 1;
            }
        }
        prop_assert_eq!(wins, 1);
        let stored = registry.get_room(room.room_id)?;
        prop_assert_eq!(stored.clinician_id.as_deref(), Some("d0"));
    });
}

/// Property: a gateway recovered from the store of a previous one
/// continues sequence numbers without gaps or reuse.
#[test]
fn prop_recovery_resumes_sequence_numbers() {
    use std::sync::Arc;

    use careline_core::{ChatGateway, EventSink, GatewayConfig};
    use careline_proto::{InboundEvent, OutboundEvent, Role};

    struct NullSink;

    impl EventSink for NullSink {
        fn deliver(&self, _event: &OutboundEvent) -> bool {
            true
        }
    }

    fn pump(
        gateway: &ChatGateway<MemoryStore>,
        room_id: careline_proto::RoomId,
        count: usize,
        tag: &str,
    ) -> Result<(), careline_core::ChatError> {
        let session = gateway.connect(Arc::new(NullSink));
        gateway.handle_event(
            session,
            InboundEvent::JoinRoom {
                room_id,
                user_id: "p1".to_string(),
                user_type: Role::Patient,
                user_name: "Pat".to_string(),
            },
        )?;
        for i in 0..count {
            gateway.handle_event(
                session,
                InboundEvent::SendMessage { room_id, message: format!("{tag}{i}") },
            )?;
        }
        Ok(())
    }

    proptest!(|(before in 0usize..10, after in 1usize..10)| {
        let store = MemoryStore::new();
        let gateway = ChatGateway::new(store.clone(), GatewayConfig::default())?;
        let room = gateway.request_room("p1", "Pat", None, Priority::Medium)?;

        pump(&gateway, room.room_id, before, "m")?;

        // Simulate a restart: rebuild all state from the store alone.
        drop(gateway);
        let recovered = ChatGateway::new(store, GatewayConfig::default())?;
        pump(&recovered, room.room_id, after, "r")?;

        let history = recovered.history(room.room_id, before + after)?;
        let seqs: Vec<u64> = history.iter().map(|m| m.seq).collect();
        let expected: Vec<u64> = (0..(before + after) as u64).collect();
        prop_assert_eq!(seqs, expected);
    });
}
