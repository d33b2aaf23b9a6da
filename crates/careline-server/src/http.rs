//! REST handlers for the room lifecycle.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use careline_proto::{Message, Priority, Room, RoomId};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{AppState, error::ApiError};

/// Body of `POST /chat/room`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRequest {
    /// Requesting patient's id.
    pub patient_id: String,
    /// Display name shown to the clinician.
    pub patient_name: String,
    /// Optional triage assessment payload, stored opaquely.
    #[serde(default)]
    pub assessment: Option<Value>,
    /// Queue priority; defaults to medium.
    #[serde(default)]
    pub priority: Priority,
}

/// Body of `POST /chat/accept/{room_id}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptRequest {
    /// Accepting clinician's id.
    #[serde(alias = "doctorId")]
    pub clinician_id: String,
    /// Accepting clinician's display name.
    #[serde(alias = "doctorName")]
    pub clinician_name: String,
}

/// Query of `GET /chat/messages/{room_id}`.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Window size; defaults to 50.
    pub limit: Option<usize>,
}

/// Liveness probe.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Create a consultation request, or return the patient's existing open
/// room.
pub async fn request_room(
    State(state): State<AppState>,
    Json(req): Json<RoomRequest>,
) -> Result<Json<Room>, ApiError> {
    let room = state.gateway.request_room(
        &req.patient_id,
        &req.patient_name,
        req.assessment,
        req.priority,
    )?;
    Ok(Json(room))
}

/// Fetch one room.
pub async fn get_room(
    State(state): State<AppState>,
    Path(room_id): Path<RoomId>,
) -> Result<Json<Room>, ApiError> {
    Ok(Json(state.gateway.get_room(room_id)?))
}

/// Recent messages of a room, oldest of the window first.
pub async fn history(
    State(state): State<AppState>,
    Path(room_id): Path<RoomId>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let limit = query.limit.unwrap_or(50);
    Ok(Json(state.gateway.history(room_id, limit)?))
}

/// The waiting queue, highest priority first.
pub async fn waiting_rooms(State(state): State<AppState>) -> Json<Vec<Room>> {
    Json(state.gateway.list_waiting())
}

/// Clinician claims a waiting room; loses with `409` if another
/// clinician got there first.
pub async fn accept(
    State(state): State<AppState>,
    Path(room_id): Path<RoomId>,
    Json(req): Json<AcceptRequest>,
) -> Result<Json<Room>, ApiError> {
    let room = state.gateway.accept(room_id, &req.clinician_id, &req.clinician_name)?;
    Ok(Json(room))
}
