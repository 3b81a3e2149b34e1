//! REST API layer: route handlers, DTOs, and router composition.
//!
//! [`team_router`] and [`tournament_router`] build the complete application
//! for each service, including middleware and, with the `swagger-ui`
//! feature, the interactive API docs at `/swagger-ui`.

pub mod dto;
pub mod handlers;
pub mod openapi;

use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::app_state::{TeamState, TournamentState};
use openapi::{TeamApiDoc, TournamentApiDoc};

/// Upper bound on a single request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds the team registry application.
pub fn team_router(state: TeamState) -> Router {
    let routes = Router::new()
        .merge(handlers::teams::routes())
        .merge(handlers::system::team_routes());
    finish(with_docs(routes, TeamApiDoc::openapi()), state)
}

/// Builds the tournament registry application.
pub fn tournament_router(state: TournamentState) -> Router {
    let routes = Router::new()
        .merge(handlers::tournaments::routes())
        .merge(handlers::system::tournament_routes());
    finish(with_docs(routes, TournamentApiDoc::openapi()), state)
}

fn finish<S>(routes: Router<S>, state: S) -> Router
where
    S: Clone + Send + Sync + 'static,
{
    routes
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            REQUEST_TIMEOUT,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(feature = "swagger-ui")]
fn with_docs<S>(routes: Router<S>, doc: utoipa::openapi::OpenApi) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    use utoipa_swagger_ui::SwaggerUi;

    routes.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", doc))
}

#[cfg(not(feature = "swagger-ui"))]
fn with_docs<S>(routes: Router<S>, _doc: utoipa::openapi::OpenApi) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    routes
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, header};
    use tower::ServiceExt;

    use super::*;
    use crate::api::dto::{HealthResponse, TeamDto};
    use crate::config::{PublisherConfig, SubscriberConfig};
    use crate::error::ErrorResponse;
    use crate::events::{Dispatcher, Publisher, SubscriberLifecycle, Topic};
    use crate::persistence::{InMemoryTeamStore, InMemoryTournamentStore};

    async fn team_app() -> Router {
        let Ok(topic) = Topic::new("teamServiceTopic") else {
            panic!("valid topic");
        };
        let config = PublisherConfig {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            topic,
            high_water_mark: 16,
            grace_period: Duration::ZERO,
        };
        let Ok(publisher) = Publisher::bind(config).await else {
            panic!("bind failed");
        };
        team_router(TeamState {
            store: Arc::new(InMemoryTeamStore::new()),
            publisher: Arc::new(publisher),
        })
    }

    fn tournament_app() -> Router {
        let config = SubscriberConfig {
            upstream: "127.0.0.1:1".to_string(),
            topic_filter: Topic::any(),
            poll_timeout: Duration::from_millis(50),
            reconnect_min_delay: Duration::from_millis(10),
            reconnect_max_delay: Duration::from_millis(50),
            max_frame_bytes: 1024,
        };
        tournament_router(TournamentState {
            store: Arc::new(InMemoryTournamentStore::new()),
            events: Arc::new(SubscriberLifecycle::new(config, Arc::new(Dispatcher::new()))),
        })
    }

    fn post_json(uri: &str, body: impl Into<String>) -> Request<Body> {
        let Ok(request) = Request::builder()
            .uri(uri)
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.into()))
        else {
            panic!("request build failed");
        };
        request
    }

    fn get(uri: &str) -> Request<Body> {
        let Ok(request) = Request::builder().uri(uri).body(Body::empty()) else {
            panic!("request build failed");
        };
        request
    }

    async fn json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
            panic!("body read failed");
        };
        let Ok(value) = serde_json::from_slice(&bytes) else {
            panic!("invalid JSON body");
        };
        value
    }

    #[tokio::test]
    async fn create_team_returns_created_with_trimmed_name() {
        let app = team_app().await;
        let Ok(response) = app
            .oneshot(post_json("/teams", r#"{"name":"  Helsinki FC  "}"#))
            .await
        else {
            panic!("request failed");
        };
        assert_eq!(response.status(), StatusCode::CREATED);
        let team: TeamDto = json(response).await;
        assert_eq!(team.name, "Helsinki FC");
        assert_eq!(team.id, 1);
    }

    #[tokio::test]
    async fn blank_team_name_is_bad_request() {
        let app = team_app().await;
        let Ok(response) = app.oneshot(post_json("/teams", r#"{"name":"   "}"#)).await else {
            panic!("request failed");
        };
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = json(response).await;
        assert_eq!(body.error.code, 1001);
    }

    #[tokio::test]
    async fn team_health_is_healthy() {
        let app = team_app().await;
        let Ok(response) = app.oneshot(get("/health")).await else {
            panic!("request failed");
        };
        assert_eq!(response.status(), StatusCode::OK);
        let health: HealthResponse = json(response).await;
        assert_eq!(health.status, "healthy");
        assert_eq!(health.service, "team-service");
        assert!(health.event_feed.is_none());
    }

    #[tokio::test]
    async fn tournament_health_reports_disconnected_feed() {
        let app = tournament_app();
        let Ok(response) = app.oneshot(get("/health")).await else {
            panic!("request failed");
        };
        let health: HealthResponse = json(response).await;
        assert_eq!(health.status, "degraded");
        assert_eq!(health.service, "tournament-service");
        assert_eq!(health.event_feed.as_deref(), Some("disconnected"));
    }

    #[tokio::test]
    async fn overlong_tournament_name_is_bad_request() {
        let app = tournament_app();
        let body = format!(r#"{{"name":"{}"}}"#, "x".repeat(101));
        let Ok(response) = app.oneshot(post_json("/tournaments", body)).await else {
            panic!("request failed");
        };
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[cfg(feature = "swagger-ui")]
    #[tokio::test]
    async fn openapi_document_is_served() {
        let app = tournament_app();
        let Ok(response) = app.oneshot(get("/api-docs/openapi.json")).await else {
            panic!("request failed");
        };
        assert_eq!(response.status(), StatusCode::OK);
    }
}
