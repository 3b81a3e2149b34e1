//! PostgreSQL implementation of the persistence layer.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::models::{
    Team, TeamRow, Tournament, TournamentRow, TournamentTeam, TournamentTeamRow,
};
use super::{StoreError, TeamStore, TournamentStore};
use crate::config::DatabaseConfig;

/// Opens a connection pool sized from `config`.
///
/// # Errors
///
/// Returns [`StoreError::Database`] if the database cannot be reached.
pub async fn connect_pool(config: &DatabaseConfig) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .connect(&config.url)
        .await?;
    Ok(pool)
}

/// PostgreSQL-backed team store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresTeamStore {
    pool: PgPool,
}

impl PostgresTeamStore {
    /// Creates a store on an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects and applies the team registry migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if connecting or migrating fails.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = connect_pool(config).await?;
        sqlx::migrate!("./migrations/team").run(&pool).await?;
        tracing::info!("team database migrated");
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl TeamStore for PostgresTeamStore {
    async fn create_team(&self, name: &str) -> Result<Team, StoreError> {
        let team_id = uuid::Uuid::new_v4().to_string();
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, TeamRow>(
            "INSERT INTO teams (team_id, name) VALUES ($1, $2) \
             RETURNING id, team_id, name, created_at",
        )
        .bind(&team_id)
        .bind(name)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(Team::from(row))
    }

    async fn list_teams(&self) -> Result<Vec<Team>, StoreError> {
        let rows = sqlx::query_as::<_, TeamRow>(
            "SELECT id, team_id, name, created_at FROM teams ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Team::from).collect())
    }
}

/// PostgreSQL-backed tournament store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresTournamentStore {
    pool: PgPool,
}

impl PostgresTournamentStore {
    /// Creates a store on an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects and applies the tournament registry migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if connecting or migrating fails.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = connect_pool(config).await?;
        sqlx::migrate!("./migrations/tournament").run(&pool).await?;
        tracing::info!("tournament database migrated");
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl TournamentStore for PostgresTournamentStore {
    async fn create_tournament(&self, name: &str) -> Result<Tournament, StoreError> {
        let tournament_id = uuid::Uuid::new_v4().to_string();
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, TournamentRow>(
            "INSERT INTO tournaments (tournament_id, name) VALUES ($1, $2) \
             RETURNING id, tournament_id, name, created_at",
        )
        .bind(&tournament_id)
        .bind(name)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(Tournament::from(row))
    }

    async fn ensure_tournament(&self, id: i64, name: &str) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;
        let inserted = sqlx::query(
            "INSERT INTO tournaments (id, tournament_id, name) VALUES ($1, $2, $3) \
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(id)
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(name)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        // An explicit id bypasses the identity sequence; move it past the
        // highest id so later inserts do not collide.
        sqlx::query(
            "SELECT setval(pg_get_serial_sequence('tournaments', 'id'), \
             GREATEST((SELECT MAX(id) FROM tournaments), 1))",
        )
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(inserted > 0)
    }

    async fn list_tournaments(&self) -> Result<Vec<Tournament>, StoreError> {
        let rows = sqlx::query_as::<_, TournamentRow>(
            "SELECT id, tournament_id, name, created_at FROM tournaments ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Tournament::from).collect())
    }

    async fn record_tournament_team(
        &self,
        tournament_id: i64,
        team_id: &str,
        team_name: &str,
    ) -> Result<TournamentTeam, StoreError> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, TournamentTeamRow>(
            "INSERT INTO tournament_teams (tournament_id, team_id, team_name) VALUES ($1, $2, $3) \
             RETURNING id, tournament_id, team_id, team_name, created_at",
        )
        .bind(tournament_id)
        .bind(team_id)
        .bind(team_name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            let missing = e
                .as_database_error()
                .is_some_and(|db| db.is_foreign_key_violation());
            if missing {
                StoreError::MissingTournament(tournament_id)
            } else {
                StoreError::Database(e)
            }
        })?;
        tx.commit().await?;

        Ok(TournamentTeam::from(row))
    }

    async fn list_tournament_teams(&self) -> Result<Vec<TournamentTeam>, StoreError> {
        let rows = sqlx::query_as::<_, TournamentTeamRow>(
            "SELECT id, tournament_id, team_id, team_name, created_at \
             FROM tournament_teams ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(TournamentTeam::from).collect())
    }
}
