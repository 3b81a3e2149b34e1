//! Health endpoints of both services.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::HealthResponse;
use crate::app_state::{TeamState, TournamentState};

/// Service name reported by the team registry.
pub const TEAM_SERVICE: &str = "team-service";

/// Service name reported by the tournament registry.
pub const TOURNAMENT_SERVICE: &str = "tournament-service";

/// `GET /health`: Team registry health.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn team_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: TEAM_SERVICE.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        event_feed: None,
    })
}

/// `GET /health`: Tournament registry health.
///
/// Reports `degraded` while the event subscriber has no upstream
/// connection. The HTTP status stays 200: the service still serves reads.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Includes the state of the TeamRegistered event feed.",
    responses(
        (status = 200, description = "Service health and event feed state", body = HealthResponse),
    )
)]
pub async fn tournament_health(State(state): State<TournamentState>) -> Json<HealthResponse> {
    let receiving = state.events.is_receiving().await;
    Json(HealthResponse {
        status: if receiving { "healthy" } else { "degraded" }.to_string(),
        service: TOURNAMENT_SERVICE.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        event_feed: Some(if receiving { "connected" } else { "disconnected" }.to_string()),
    })
}

/// Team registry system routes.
pub fn team_routes() -> Router<TeamState> {
    Router::new().route("/health", get(team_health))
}

/// Tournament registry system routes.
pub fn tournament_routes() -> Router<TournamentState> {
    Router::new().route("/health", get(tournament_health))
}
