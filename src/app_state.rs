//! Shared application state injected into the Axum handlers of each service.

use std::sync::Arc;

use crate::events::{Publisher, SubscriberLifecycle};
use crate::persistence::{TeamStore, TournamentStore};

/// State of the team registry, available via Axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct TeamState {
    /// Team persistence.
    pub store: Arc<dyn TeamStore>,
    /// Publisher announcing registrations.
    pub publisher: Arc<Publisher>,
}

/// State of the tournament registry.
#[derive(Debug, Clone)]
pub struct TournamentState {
    /// Tournament persistence, shared with the event handler.
    pub store: Arc<dyn TournamentStore>,
    /// Subscriber lifecycle, queried by the health endpoint.
    pub events: Arc<SubscriberLifecycle>,
}
