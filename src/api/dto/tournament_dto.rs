//! Tournament registry DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::persistence::{Tournament, TournamentTeam};

/// A tournament, returned by `POST /tournaments` (201).
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TournamentDto {
    /// Row ID.
    pub id: i64,
    /// External identifier.
    pub tournament_id: String,
    /// Tournament name.
    pub name: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<Tournament> for TournamentDto {
    fn from(t: Tournament) -> Self {
        Self {
            id: t.id,
            tournament_id: t.tournament_id,
            name: t.name,
            created_at: t.created_at,
        }
    }
}

/// A team recorded against a tournament from a `TeamRegistered` event.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TournamentTeamDto {
    /// Row ID.
    pub id: i64,
    /// Row ID of the tournament.
    pub tournament_id: i64,
    /// External team identifier from the team registry.
    pub team_id: String,
    /// Team name as announced.
    pub team_name: String,
    /// Time the event was recorded.
    pub created_at: DateTime<Utc>,
}

impl From<TournamentTeam> for TournamentTeamDto {
    fn from(row: TournamentTeam) -> Self {
        Self {
            id: row.id,
            tournament_id: row.tournament_id,
            team_id: row.team_id,
            team_name: row.team_name,
            created_at: row.created_at,
        }
    }
}

/// A tournament with its registered teams, for `GET /tournaments`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TournamentWithTeamsDto {
    /// The tournament itself.
    #[serde(flatten)]
    pub tournament: TournamentDto,
    /// Teams recorded against it, oldest first.
    pub teams: Vec<TournamentTeamDto>,
}

/// Groups `rows` under their tournaments, preserving the order of both.
///
/// Rows referencing an unknown tournament are left out.
#[must_use]
pub fn group_by_tournament(
    tournaments: Vec<Tournament>,
    rows: Vec<TournamentTeam>,
) -> Vec<TournamentWithTeamsDto> {
    let mut grouped: Vec<TournamentWithTeamsDto> = tournaments
        .into_iter()
        .map(|t| TournamentWithTeamsDto {
            tournament: t.into(),
            teams: Vec::new(),
        })
        .collect();

    for row in rows {
        if let Some(entry) = grouped
            .iter_mut()
            .find(|g| g.tournament.id == row.tournament_id)
        {
            entry.teams.push(row.into());
        }
    }
    grouped
}
