//! Persistence layer: team and tournament stores.
//!
//! Each service talks to its store through a trait so that request handlers
//! and the event dispatcher share one implementation. `postgres` provides
//! the `sqlx::PgPool` backed stores with embedded migrations; `memory`
//! provides `RwLock`-protected stores used when persistence is disabled and
//! in tests.

pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;

pub use memory::{InMemoryTeamStore, InMemoryTournamentStore};
pub use models::{Team, Tournament, TournamentTeam};
pub use postgres::{PostgresTeamStore, PostgresTournamentStore};

/// Persistence failure.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database driver error; the surrounding transaction was rolled back.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed at startup.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A tournament-team row referenced a tournament that does not exist.
    #[error("tournament {0} does not exist")]
    MissingTournament(i64),
}

/// Storage for the team registry.
#[async_trait]
pub trait TeamStore: Send + Sync + std::fmt::Debug {
    /// Inserts a new team with a freshly generated external `team_id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the insert fails.
    async fn create_team(&self, name: &str) -> Result<Team, StoreError>;

    /// Returns all teams in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    async fn list_teams(&self) -> Result<Vec<Team>, StoreError>;
}

/// Storage for the tournament registry.
#[async_trait]
pub trait TournamentStore: Send + Sync + std::fmt::Debug {
    /// Inserts a new tournament.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the insert fails.
    async fn create_tournament(&self, name: &str) -> Result<Tournament, StoreError>;

    /// Creates the tournament with the given row id unless it already exists.
    ///
    /// Returns `true` if a row was created.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    async fn ensure_tournament(&self, id: i64, name: &str) -> Result<bool, StoreError>;

    /// Returns all tournaments in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    async fn list_tournaments(&self) -> Result<Vec<Tournament>, StoreError>;

    /// Associates an external team with a tournament.
    ///
    /// Plain insert: recording the same team twice yields two rows.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails; no partial row is left
    /// behind.
    async fn record_tournament_team(
        &self,
        tournament_id: i64,
        team_id: &str,
        team_name: &str,
    ) -> Result<TournamentTeam, StoreError>;

    /// Returns all tournament-team rows in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    async fn list_tournament_teams(&self) -> Result<Vec<TournamentTeam>, StoreError>;
}
