//! Core data model: rooms, messages and their enums.

use serde::{Deserialize, Serialize};

use crate::RoomId;

/// Which side of a consultation a participant is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The patient who requested the consultation.
    Patient,
    /// The clinician handling it. Older clients send `"doctor"`.
    #[serde(alias = "doctor")]
    Clinician,
}

/// Queue priority of a waiting room.
///
/// Variant order matters: `Ord` is derived, so `Urgent` compares greatest.
/// The waiting queue sorts by priority descending, then creation time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Routine follow-up.
    Low,
    /// Default priority for new requests.
    #[default]
    Medium,
    /// Elevated risk flagged by the assessment.
    High,
    /// Needs a clinician as soon as one is free.
    Urgent,
}

/// Lifecycle state of a room.
///
/// `Completed` is terminal: no further transitions or message appends are
/// permitted once a room reaches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    /// Created by a patient request, no clinician assigned yet.
    Waiting,
    /// A clinician accepted the request.
    Active,
    /// Either participant ended the session.
    Completed,
}

impl RoomStatus {
    /// Whether this status permits no further mutation.
    pub fn is_terminal(self) -> bool {
        matches!(self, RoomStatus::Completed)
    }
}

/// A single patient-clinician consultation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    /// Unique room identifier.
    pub room_id: RoomId,
    /// Opaque identifier of the requesting patient.
    pub patient_id: String,
    /// Display name of the patient.
    pub patient_name: String,
    /// Assigned clinician, `None` until the room is accepted.
    pub clinician_id: Option<String>,
    /// Display name of the assigned clinician.
    pub clinician_name: Option<String>,
    /// Current lifecycle state.
    pub status: RoomStatus,
    /// Queue priority.
    pub priority: Priority,
    /// Unix milliseconds when the room was created.
    pub created_at: u64,
    /// Unix milliseconds of the last message, accept or touch.
    pub last_activity: u64,
    /// Snapshot of the triggering assessment (score, risk level).
    /// Passed through verbatim, never interpreted by the core.
    pub assessment: Option<serde_json::Value>,
}

/// One chat message, immutable once appended.
///
/// Messages within a room are totally ordered by `seq`, which matches
/// append order and the order of history replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Globally unique message id.
    pub id: uuid::Uuid,
    /// Room this message belongs to.
    pub room_id: RoomId,
    /// Per-room sequence number, strictly increasing from 0 with no gaps.
    pub seq: u64,
    /// Sender's user id.
    pub sender_id: String,
    /// Sender's display name.
    pub sender_name: String,
    /// Whether the sender is the patient or the clinician.
    pub sender_role: Role,
    /// Message text, trimmed and non-empty.
    pub body: String,
    /// Unix milliseconds when the message was appended.
    pub sent_at: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_orders_urgent_highest() {
        assert!(Priority::Urgent > Priority::High);
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
    }

    #[test]
    fn role_accepts_doctor_alias() {
        let role: Role = serde_json::from_str("\"doctor\"").expect("parse");
        assert_eq!(role, Role::Clinician);

        let role: Role = serde_json::from_str("\"clinician\"").expect("parse");
        assert_eq!(role, Role::Clinician);
    }

    #[test]
    fn room_serializes_camel_case() {
        let room = Room {
            room_id: uuid::Uuid::nil(),
            patient_id: "p1".to_string(),
            patient_name: "Alice".to_string(),
            clinician_id: None,
            clinician_name: None,
            status: RoomStatus::Waiting,
            priority: Priority::Urgent,
            created_at: 1,
            last_activity: 1,
            assessment: None,
        };

        let json = serde_json::to_value(&room).expect("serialize");
        assert_eq!(json["patientId"], "p1");
        assert_eq!(json["status"], "waiting");
        assert_eq!(json["priority"], "urgent");
    }
}
