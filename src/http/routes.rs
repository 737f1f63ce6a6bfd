//! HTTP route definitions

use std::collections::HashMap;
use std::sync::atomic::Ordering;

use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::app::AppState;
use crate::game::obstacle::Obstacle;
use crate::game::player::Player;
use crate::util::time::uptime_secs;
use crate::ws::handler::ws_handler;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    // CORS configuration - support multiple origins (comma-separated in CLIENT_ORIGIN)
    let allowed_origins: Vec<header::HeaderValue> = state
        .config
        .client_origin
        .split(',')
        .filter_map(|s| s.trim().parse::<header::HeaderValue>().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    Router::new()
        .route("/", get(game_state_handler))
        .route("/health", get(health_handler))
        .route("/ws", get(ws_handler))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    active_players: usize,
    open_connections: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        active_players: state.player_count.load(Ordering::Relaxed),
        open_connections: state.bus.connection_count(),
    })
}

// ============================================================================
// Game state query endpoint
// ============================================================================

#[derive(Serialize)]
struct GameStateResponse {
    status: &'static str,
    data: GameStateData,
}

#[derive(Serialize)]
struct GameStateData {
    obstacles: Vec<Obstacle>,
    players: HashMap<String, Player>,
}

/// Read-only snapshot of the stored game state. Served from the external
/// store, so it may lag live sessions by up to one flush interval.
async fn game_state_handler(
    State(state): State<AppState>,
) -> Result<Json<GameStateResponse>, AppError> {
    let obstacles = state
        .snapshots
        .read_obstacles()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let players = state
        .snapshots
        .read_players()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(GameStateResponse {
        status: "success",
        data: GameStateData { obstacles, players },
    }))
}

// ============================================================================
// Error handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}
