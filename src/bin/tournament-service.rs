//! tournament-service entry point.
//!
//! Serves the tournament registry over HTTP and records teams announced by
//! the team service's event feed.

use std::sync::Arc;

use league_events::api;
use league_events::app_state::TournamentState;
use league_events::config::TournamentServiceConfig;
use league_events::events::{
    Dispatcher, SubscriberLifecycle, TEAM_REGISTERED, TeamRegisteredHandler,
};
use league_events::persistence::{
    InMemoryTournamentStore, PostgresTournamentStore, TournamentStore,
};
use league_events::{shutdown, telemetry};

const DEFAULT_TOURNAMENT_NAME: &str = "Default Tournament";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    telemetry::init_tracing();

    let config = TournamentServiceConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, "starting tournament-service");

    let store: Arc<dyn TournamentStore> = if config.database.persistence_enabled {
        Arc::new(PostgresTournamentStore::connect(&config.database).await?)
    } else {
        tracing::warn!("persistence disabled; tournaments are kept in memory");
        Arc::new(InMemoryTournamentStore::new())
    };

    if store
        .ensure_tournament(config.default_tournament_id, DEFAULT_TOURNAMENT_NAME)
        .await?
    {
        tracing::info!(id = config.default_tournament_id, "default tournament created");
    }

    let handler = TeamRegisteredHandler::new(Arc::clone(&store), config.default_tournament_id);
    let dispatcher = Dispatcher::new().with_handler(TEAM_REGISTERED, Arc::new(handler));
    let events = Arc::new(SubscriberLifecycle::new(
        config.subscriber.clone(),
        Arc::new(dispatcher),
    ));

    // Persistence is ready; only now may events be applied.
    events.startup().await;

    let app = api::tournament_router(TournamentState {
        store,
        events: Arc::clone(&events),
    });

    let listener = match tokio::net::TcpListener::bind(config.listen_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            events.shutdown().await;
            return Err(e.into());
        }
    };
    tracing::info!(addr = %config.listen_addr, "server listening");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::signal())
        .await;

    events.shutdown().await;
    served?;

    tracing::info!("tournament-service stopped");
    Ok(())
}
