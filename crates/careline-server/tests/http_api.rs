//! Router-level tests for the REST surface.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use careline_server::{AppState, ServerRuntimeConfig, router};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

fn app() -> Router {
    let state = AppState::new(&ServerRuntimeConfig::default()).expect("state");
    router(state)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(body) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => Request::builder().method(method).uri(uri).body(Body::empty()).expect("request"),
    };

    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    let value =
        if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).expect("json") };
    (status, value)
}

fn room_request(patient_id: &str, priority: &str) -> Value {
    json!({
        "patientId": patient_id,
        "patientName": "Alice",
        "priority": priority,
        "assessment": { "symptoms": ["cough"] },
    })
}

#[tokio::test]
async fn health_endpoint_responds() {
    let app = app();
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn room_request_creates_then_reuses() {
    let app = app();

    let (status, created) =
        send(&app, "POST", "/chat/room", Some(room_request("p1", "high"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["status"], "waiting");
    assert_eq!(created["patientId"], "p1");
    assert_eq!(created["assessment"]["symptoms"][0], "cough");

    let (status, again) = send(&app, "POST", "/chat/room", Some(room_request("p1", "high"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["roomId"], created["roomId"]);

    let uri = format!("/chat/room/{}", created["roomId"].as_str().expect("room id"));
    let (status, fetched) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["roomId"], created["roomId"]);
}

#[tokio::test]
async fn blank_patient_name_is_rejected() {
    let app = app();
    let body = json!({ "patientId": "p1", "patientName": "   " });
    let (status, error) = send(&app, "POST", "/chat/room", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error["error"].as_str().expect("message").contains("patientName"));
}

#[tokio::test]
async fn unknown_room_is_not_found() {
    let app = app();
    let uri = format!("/chat/room/{}", uuid::Uuid::now_v7());
    let (status, _) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn waiting_rooms_come_highest_priority_first() {
    let app = app();
    send(&app, "POST", "/chat/room", Some(room_request("p1", "low"))).await;
    send(&app, "POST", "/chat/room", Some(room_request("p2", "urgent"))).await;
    send(&app, "POST", "/chat/room", Some(room_request("p3", "medium"))).await;

    let (status, queue) = send(&app, "GET", "/chat/waiting-rooms", None).await;
    assert_eq!(status, StatusCode::OK);

    let priorities: Vec<&str> = queue
        .as_array()
        .expect("array")
        .iter()
        .map(|room| room["priority"].as_str().expect("priority"))
        .collect();
    assert_eq!(priorities, vec!["urgent", "medium", "low"]);
}

#[tokio::test]
async fn second_accept_conflicts() {
    let app = app();
    let (_, room) = send(&app, "POST", "/chat/room", Some(room_request("p1", "high"))).await;
    let uri = format!("/chat/accept/{}", room["roomId"].as_str().expect("room id"));
    let accept = json!({ "clinicianId": "d1", "clinicianName": "Dr. Bo" });

    let (status, accepted) = send(&app, "POST", &uri, Some(accept.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(accepted["status"], "active");
    assert_eq!(accepted["clinicianId"], "d1");

    let rival = json!({ "doctorId": "d2", "doctorName": "Dr. Xi" });
    let (status, _) = send(&app, "POST", &uri, Some(rival)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // The queue no longer lists the accepted room.
    let (_, queue) = send(&app, "GET", "/chat/waiting-rooms", None).await;
    assert!(queue.as_array().expect("array").is_empty());
}

#[tokio::test]
async fn message_history_defaults_to_empty() {
    let app = app();
    let (_, room) = send(&app, "POST", "/chat/room", Some(room_request("p1", "medium"))).await;
    let uri = format!("/chat/messages/{}?limit=10", room["roomId"].as_str().expect("room id"));
    let (status, messages) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(messages.as_array().expect("array").is_empty());
}
