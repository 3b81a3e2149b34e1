//! Tournament registry handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{
    CreateNamedRequest, TournamentDto, TournamentTeamDto, TournamentWithTeamsDto,
    group_by_tournament,
};
use crate::app_state::TournamentState;
use crate::error::{ErrorResponse, ServiceError};

/// `POST /tournaments`: Create a tournament.
///
/// # Errors
///
/// Returns [`ServiceError`] on an invalid name or a failed insert.
#[utoipa::path(
    post,
    path = "/tournaments",
    tag = "Tournaments",
    summary = "Create a tournament",
    request_body = CreateNamedRequest,
    responses(
        (status = 201, description = "Tournament created", body = TournamentDto),
        (status = 400, description = "Invalid name", body = ErrorResponse),
        (status = 500, description = "Persistence failure", body = ErrorResponse),
    )
)]
pub async fn create_tournament(
    State(state): State<TournamentState>,
    Json(req): Json<CreateNamedRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let name = req.validated_name()?;
    let tournament = state.store.create_tournament(name).await?;
    tracing::info!(id = tournament.id, name = %tournament.name, "tournament created");
    Ok((StatusCode::CREATED, Json(TournamentDto::from(tournament))))
}

/// `GET /tournaments`: List tournaments with their teams.
///
/// # Errors
///
/// Returns [`ServiceError`] if a query fails.
#[utoipa::path(
    get,
    path = "/tournaments",
    tag = "Tournaments",
    summary = "List tournaments",
    description = "Returns every tournament together with the teams recorded against it from TeamRegistered events.",
    responses(
        (status = 200, description = "Tournaments with teams", body = Vec<TournamentWithTeamsDto>),
        (status = 500, description = "Persistence failure", body = ErrorResponse),
    )
)]
pub async fn list_tournaments(
    State(state): State<TournamentState>,
) -> Result<Json<Vec<TournamentWithTeamsDto>>, ServiceError> {
    let tournaments = state.store.list_tournaments().await?;
    let rows = state.store.list_tournament_teams().await?;
    Ok(Json(group_by_tournament(tournaments, rows)))
}

/// `GET /tournament-teams`: List all tournament-team rows.
///
/// # Errors
///
/// Returns [`ServiceError`] if the query fails.
#[utoipa::path(
    get,
    path = "/tournament-teams",
    tag = "Tournaments",
    summary = "List recorded tournament teams",
    responses(
        (status = 200, description = "All tournament-team rows", body = Vec<TournamentTeamDto>),
        (status = 500, description = "Persistence failure", body = ErrorResponse),
    )
)]
pub async fn list_tournament_teams(
    State(state): State<TournamentState>,
) -> Result<Json<Vec<TournamentTeamDto>>, ServiceError> {
    let rows = state.store.list_tournament_teams().await?;
    Ok(Json(rows.into_iter().map(TournamentTeamDto::from).collect()))
}

/// Tournament routes.
pub fn routes() -> Router<TournamentState> {
    Router::new()
        .route("/tournaments", get(list_tournaments).post(create_tournament))
        .route("/tournament-teams", get(list_tournament_teams))
}
