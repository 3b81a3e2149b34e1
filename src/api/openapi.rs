//! OpenAPI documents of the two services.

use utoipa::OpenApi;

use crate::api::dto::{
    CreateNamedRequest, HealthResponse, TeamDto, TournamentDto, TournamentTeamDto,
    TournamentWithTeamsDto,
};
use crate::api::handlers::{system, teams, tournaments};
use crate::error::{ErrorBody, ErrorResponse};

/// OpenAPI document of the team registry.
#[derive(Debug, OpenApi)]
#[openapi(
    paths(teams::create_team, teams::list_teams, system::team_health),
    components(schemas(CreateNamedRequest, TeamDto, HealthResponse, ErrorResponse, ErrorBody)),
    tags(
        (name = "Teams", description = "Team registration"),
        (name = "System", description = "Health"),
    ),
    info(
        title = "Team Service API",
        description = "Registers teams and announces every registration as a TeamRegistered event."
    )
)]
pub struct TeamApiDoc;

/// OpenAPI document of the tournament registry.
#[derive(Debug, OpenApi)]
#[openapi(
    paths(
        tournaments::create_tournament,
        tournaments::list_tournaments,
        tournaments::list_tournament_teams,
        system::tournament_health,
    ),
    components(schemas(
        CreateNamedRequest,
        TournamentDto,
        TournamentTeamDto,
        TournamentWithTeamsDto,
        HealthResponse,
        ErrorResponse,
        ErrorBody,
    )),
    tags(
        (name = "Tournaments", description = "Tournaments and the teams recorded from events"),
        (name = "System", description = "Health and event feed state"),
    ),
    info(
        title = "Tournament Service API",
        description = "Manages tournaments and records teams announced by the team service."
    )
)]
pub struct TournamentApiDoc;
