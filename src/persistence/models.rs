//! Database models for teams, tournaments and tournament registrations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A row from the team registry's `teams` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// Auto-increment row ID.
    pub id: i64,
    /// External identifier shared with other services (UUID v4 string).
    pub team_id: String,
    /// Team name.
    pub name: String,
    /// Server-side creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A row from the tournament registry's `tournaments` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tournament {
    /// Auto-increment row ID.
    pub id: i64,
    /// External identifier (UUID v4 string).
    pub tournament_id: String,
    /// Tournament name.
    pub name: String,
    /// Server-side creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A row from the `tournament_teams` table, written by the event handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentTeam {
    /// Auto-increment row ID.
    pub id: i64,
    /// Row ID of the owning tournament.
    pub tournament_id: i64,
    /// External team identifier from the team registry.
    pub team_id: String,
    /// Team name as carried by the event.
    pub team_name: String,
    /// Server-side creation timestamp.
    pub created_at: DateTime<Utc>,
}

pub(crate) type TeamRow = (i64, String, String, DateTime<Utc>);
pub(crate) type TournamentRow = (i64, String, String, DateTime<Utc>);
pub(crate) type TournamentTeamRow = (i64, i64, String, String, DateTime<Utc>);

impl From<TeamRow> for Team {
    fn from((id, team_id, name, created_at): TeamRow) -> Self {
        Self {
            id,
            team_id,
            name,
            created_at,
        }
    }
}

impl From<TournamentRow> for Tournament {
    fn from((id, tournament_id, name, created_at): TournamentRow) -> Self {
        Self {
            id,
            tournament_id,
            name,
            created_at,
        }
    }
}

impl From<TournamentTeamRow> for TournamentTeam {
    fn from((id, tournament_id, team_id, team_name, created_at): TournamentTeamRow) -> Self {
        Self {
            id,
            tournament_id,
            team_id,
            team_name,
            created_at,
        }
    }
}
