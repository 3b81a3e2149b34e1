//! In-memory stores used when `PERSISTENCE_ENABLED=false` and in tests.
//!
//! Each store keeps its rows in a `Vec` behind a [`tokio::sync::RwLock`].
//! A write takes the lock once, so every insert is all-or-nothing like the
//! transactional PostgreSQL stores.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::models::{Team, Tournament, TournamentTeam};
use super::{StoreError, TeamStore, TournamentStore};

/// Team store backed by process memory.
#[derive(Debug, Default)]
pub struct InMemoryTeamStore {
    teams: RwLock<Vec<Team>>,
}

impl InMemoryTeamStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TeamStore for InMemoryTeamStore {
    async fn create_team(&self, name: &str) -> Result<Team, StoreError> {
        let mut teams = self.teams.write().await;
        let team = Team {
            id: next_id(teams.last().map(|t| t.id)),
            team_id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        teams.push(team.clone());
        Ok(team)
    }

    async fn list_teams(&self) -> Result<Vec<Team>, StoreError> {
        Ok(self.teams.read().await.clone())
    }
}

#[derive(Debug, Default)]
struct TournamentTables {
    tournaments: Vec<Tournament>,
    tournament_teams: Vec<TournamentTeam>,
}

/// Tournament store backed by process memory.
///
/// Enforces the `tournament_teams.tournament_id` foreign key so that a
/// missing default tournament surfaces the same way as in PostgreSQL.
#[derive(Debug, Default)]
pub struct InMemoryTournamentStore {
    tables: RwLock<TournamentTables>,
}

impl InMemoryTournamentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TournamentStore for InMemoryTournamentStore {
    async fn create_tournament(&self, name: &str) -> Result<Tournament, StoreError> {
        let mut tables = self.tables.write().await;
        let id = next_id(tables.tournaments.iter().map(|t| t.id).max());
        let tournament = Tournament {
            id,
            tournament_id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        tables.tournaments.push(tournament.clone());
        Ok(tournament)
    }

    async fn ensure_tournament(&self, id: i64, name: &str) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.tournaments.iter().any(|t| t.id == id) {
            return Ok(false);
        }
        tables.tournaments.push(Tournament {
            id,
            tournament_id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            created_at: Utc::now(),
        });
        tables.tournaments.sort_by_key(|t| t.id);
        Ok(true)
    }

    async fn list_tournaments(&self) -> Result<Vec<Tournament>, StoreError> {
        Ok(self.tables.read().await.tournaments.clone())
    }

    async fn record_tournament_team(
        &self,
        tournament_id: i64,
        team_id: &str,
        team_name: &str,
    ) -> Result<TournamentTeam, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.tournaments.iter().any(|t| t.id == tournament_id) {
            return Err(StoreError::MissingTournament(tournament_id));
        }
        let row = TournamentTeam {
            id: next_id(tables.tournament_teams.last().map(|t| t.id)),
            tournament_id,
            team_id: team_id.to_string(),
            team_name: team_name.to_string(),
            created_at: Utc::now(),
        };
        tables.tournament_teams.push(row.clone());
        Ok(row)
    }

    async fn list_tournament_teams(&self) -> Result<Vec<TournamentTeam>, StoreError> {
        Ok(self.tables.read().await.tournament_teams.clone())
    }
}

fn next_id(last: Option<i64>) -> i64 {
    last.map_or(1, |id| id.saturating_add(1))
}
