//! team-service entry point.
//!
//! Serves the team registry over HTTP and publishes `TeamRegistered`
//! events on the configured TCP address.

use std::sync::Arc;

use league_events::api;
use league_events::app_state::TeamState;
use league_events::config::TeamServiceConfig;
use league_events::events::Publisher;
use league_events::persistence::{InMemoryTeamStore, PostgresTeamStore, TeamStore};
use league_events::{shutdown, telemetry};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    telemetry::init_tracing();

    let config = TeamServiceConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, "starting team-service");

    let store: Arc<dyn TeamStore> = if config.database.persistence_enabled {
        Arc::new(PostgresTeamStore::connect(&config.database).await?)
    } else {
        tracing::warn!("persistence disabled; teams are kept in memory");
        Arc::new(InMemoryTeamStore::new())
    };

    // A bind failure is fatal: without the publisher nobody hears about
    // new teams.
    let publisher = Arc::new(Publisher::bind(config.publisher.clone()).await?);

    let app = api::team_router(TeamState {
        store,
        publisher: Arc::clone(&publisher),
    });

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::signal())
        .await;

    publisher.close().await;
    served?;

    tracing::info!("team-service stopped");
    Ok(())
}
