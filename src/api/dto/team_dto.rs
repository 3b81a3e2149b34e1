//! Team registry DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::persistence::Team;

/// A registered team, returned by `POST /teams` (201) and `GET /teams`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TeamDto {
    /// Row ID.
    pub id: i64,
    /// External identifier announced to other services.
    #[schema(example = "0b6f6c1e-8a43-4d7b-9a36-5c3f1f1f2a11")]
    pub team_id: String,
    /// Team name.
    pub name: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<Team> for TeamDto {
    fn from(team: Team) -> Self {
        Self {
            id: team.id,
            team_id: team.team_id,
            name: team.name,
            created_at: team.created_at,
        }
    }
}
