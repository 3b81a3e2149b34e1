//! Handler recording registered teams against the default tournament.

use std::sync::Arc;

use async_trait::async_trait;

use super::dispatch::EventHandler;
use super::domain_event::{DomainEvent, NAME_FIELD, Scalar, TEAM_ID_FIELD};
use super::error::DispatchError;
use crate::persistence::TournamentStore;

/// Writes a `tournament_teams` row for every valid `TeamRegistered` event.
#[derive(Debug)]
pub struct TeamRegisteredHandler {
    store: Arc<dyn TournamentStore>,
    tournament_id: i64,
}

impl TeamRegisteredHandler {
    /// Creates a handler attaching teams to `tournament_id`.
    #[must_use]
    pub fn new(store: Arc<dyn TournamentStore>, tournament_id: i64) -> Self {
        Self {
            store,
            tournament_id,
        }
    }
}

#[async_trait]
impl EventHandler for TeamRegisteredHandler {
    async fn handle(&self, event: &DomainEvent) -> Result<(), DispatchError> {
        let team_id = required_str(event, TEAM_ID_FIELD)?;
        let name = required_str(event, NAME_FIELD)?;

        let row = self
            .store
            .record_tournament_team(self.tournament_id, team_id, name)
            .await?;

        tracing::info!(
            team_id,
            name,
            tournament_id = self.tournament_id,
            row_id = row.id,
            "team added to tournament"
        );
        Ok(())
    }
}

/// Extracts a non-blank string field.
fn required_str<'a>(event: &'a DomainEvent, field: &'static str) -> Result<&'a str, DispatchError> {
    match event.get(field) {
        None | Some(Scalar::Null) => Err(DispatchError::MissingField(field)),
        Some(Scalar::String(s)) if s.trim().is_empty() => Err(DispatchError::MissingField(field)),
        Some(Scalar::String(s)) => Ok(s),
        Some(_) => Err(DispatchError::InvalidField {
            field,
            expected: "string",
        }),
    }
}
