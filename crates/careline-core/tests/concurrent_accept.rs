//! Race of many clinicians accepting the same waiting room.

use std::{sync::Arc, thread};

use careline_core::{ChatError, MemoryStore, RoomRegistry};
use careline_proto::{Priority, RoomStatus};

#[test]
fn exactly_one_clinician_wins_the_accept_race() {
    let registry = Arc::new(RoomRegistry::recover(MemoryStore::new()).expect("recover"));
    let (room, _) = registry.request_room("p1", "Alice", None, Priority::Urgent).expect("request");

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let registry = Arc::clone(&registry);
            let room_id = room.room_id;
            thread::spawn(move || {
                registry.accept(room_id, &format!("d{i}"), &format!("Doctor {i}"))
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().expect("thread")).collect();

    let winners: Vec<_> = results.iter().filter(|r| r.is_ok()).collect();
    assert_eq!(winners.len(), 1, "accept must be first-writer-wins");

    for result in &results {
        match result {
            Ok(accepted) => {
                assert_eq!(accepted.status, RoomStatus::Active);
                assert!(accepted.clinician_id.is_some());
            },
            Err(err) => assert_eq!(*err, ChatError::Conflict(room.room_id)),
        }
    }

    // The stored room matches the winner, not any loser.
    let winner = results.iter().flatten().next().expect("one winner");
    let stored = registry.get_room(room.room_id).expect("get");
    assert_eq!(stored.clinician_id, winner.clinician_id);
    assert_eq!(stored.status, RoomStatus::Active);
    // The queue no longer offers the room.
    assert!(registry.list_waiting().iter().all(|r| r.room_id != room.room_id));
}

#[test]
fn concurrent_requests_for_one_patient_create_one_room() {
    let registry = Arc::new(RoomRegistry::recover(MemoryStore::new()).expect("recover"));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.request_room("p1", "Alice", None, Priority::Medium))
        })
        .collect();

    let rooms: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("thread").expect("request"))
        .collect();

    let created = rooms.iter().filter(|(_, created)| *created).count();
    assert_eq!(created, 1);
    let first = rooms[0].0.room_id;
    assert!(rooms.iter().all(|(room, _)| room.room_id == first));
    assert_eq!(registry.list_waiting().len(), 1);
}
