//! Careline production server.
//!
//! Transport glue over [`careline_core`]: axum routes expose the REST
//! surface (room requests, waiting queue, accept, history) and a single
//! WebSocket endpoint carries the live chat events. The core gateway is
//! synchronous; each handler calls into it directly and each connection
//! gets a writer task draining an unbounded channel, so delivery never
//! blocks the core.
//!
//! # Components
//!
//! - [`http`]: request/response handlers and error mapping
//! - [`ws`]: WebSocket upgrade, read loop and per-connection sink
//! - [`ServerError`]: startup and runtime failures

mod error;
pub mod http;
pub mod ws;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use careline_core::{ChatGateway, GatewayConfig, MemoryStore};
pub use error::{ApiError, ServerError};
use tower_http::cors::CorsLayer;

/// Runtime configuration for the server binary.
#[derive(Debug, Clone)]
pub struct ServerRuntimeConfig {
    /// Address to bind to (e.g., "0.0.0.0:3001")
    pub bind_address: String,
    /// Messages replayed to a session on join
    pub history_replay: usize,
    /// Maximum concurrent WebSocket connections
    pub max_connections: usize,
}

impl Default for ServerRuntimeConfig {
    fn default() -> Self {
        Self { bind_address: "0.0.0.0:3001".to_string(), history_replay: 50, max_connections: 10000 }
    }
}

/// Shared handler state: the gateway plus connection limits.
#[derive(Clone)]
pub struct AppState {
    /// The chat core.
    pub gateway: Arc<ChatGateway<MemoryStore>>,
    /// Maximum concurrent WebSocket connections.
    pub max_connections: usize,
}

impl AppState {
    /// Build state over a fresh in-memory store.
    pub fn new(config: &ServerRuntimeConfig) -> Result<Self, ServerError> {
        let gateway = ChatGateway::new(
            MemoryStore::new(),
            GatewayConfig { history_replay: config.history_replay },
        )?;
        Ok(Self { gateway: Arc::new(gateway), max_connections: config.max_connections })
    }
}

/// The full route table.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(http::health))
        .route("/chat/room", post(http::request_room))
        .route("/chat/room/{room_id}", get(http::get_room))
        .route("/chat/messages/{room_id}", get(http::history))
        .route("/chat/waiting-rooms", get(http::waiting_rooms))
        .route("/chat/accept/{room_id}", post(http::accept))
        .route("/chat/ws", get(ws::chat_ws))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until shutdown.
pub async fn run(config: ServerRuntimeConfig) -> Result<(), ServerError> {
    let state = AppState::new(&config)?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
