//! Team registry handlers: register and list teams.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{CreateNamedRequest, TeamDto};
use crate::app_state::TeamState;
use crate::error::{ErrorResponse, ServiceError};

/// `POST /teams`: Register a new team.
///
/// The team is committed first; the `TeamRegistered` announcement follows
/// and its outcome never affects the response.
///
/// # Errors
///
/// Returns [`ServiceError`] on an invalid name or a failed insert.
#[utoipa::path(
    post,
    path = "/teams",
    tag = "Teams",
    summary = "Register a team",
    description = "Stores the team and announces it to subscribed services as a TeamRegistered event.",
    request_body = CreateNamedRequest,
    responses(
        (status = 201, description = "Team registered", body = TeamDto),
        (status = 400, description = "Invalid name", body = ErrorResponse),
        (status = 500, description = "Persistence failure", body = ErrorResponse),
    )
)]
pub async fn create_team(
    State(state): State<TeamState>,
    Json(req): Json<CreateNamedRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let name = req.validated_name()?;
    let team = state.store.create_team(name).await?;
    tracing::info!(team_id = %team.team_id, name = %team.name, "team registered");

    state
        .publisher
        .notify_team_registered(&team.team_id, &team.name)
        .await;

    Ok((StatusCode::CREATED, Json(TeamDto::from(team))))
}

/// `GET /teams`: List all teams.
///
/// # Errors
///
/// Returns [`ServiceError`] if the query fails.
#[utoipa::path(
    get,
    path = "/teams",
    tag = "Teams",
    summary = "List teams",
    responses(
        (status = 200, description = "All registered teams", body = Vec<TeamDto>),
        (status = 500, description = "Persistence failure", body = ErrorResponse),
    )
)]
pub async fn list_teams(
    State(state): State<TeamState>,
) -> Result<Json<Vec<TeamDto>>, ServiceError> {
    let teams = state.store.list_teams().await?;
    Ok(Json(teams.into_iter().map(TeamDto::from).collect()))
}

/// Team routes.
pub fn routes() -> Router<TeamState> {
    Router::new().route("/teams", get(list_teams).post(create_team))
}
