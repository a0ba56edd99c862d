use axum::Router;
use axum_helpers::server::{create_router, health_router};

use crate::state::AppState;

pub mod health;
pub mod notes;

/// Creates the API routes without the `/api` prefix.
/// The prefix is added by `create_router`.
pub fn routes(state: &AppState) -> Router {
    Router::new().nest("/notes", notes::router(state))
}

/// Creates a router with the /ready endpoint that pings the database.
pub fn ready_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .route("/ready", get(health::ready_handler))
        .with_state(state)
}

/// The complete HTTP application: API routes, `/health` and `/ready`.
pub fn app(state: &AppState) -> Router {
    create_router(routes(state))
        .merge(health_router(state.config.app))
        .merge(ready_router(state.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use database::ModelRegistry;
    use database::mongodb::{Database, MongoConnectionCache, MongoConnector};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn state() -> AppState {
        let config = Config::for_tests();
        let cache = MongoConnectionCache::new(MongoConnector::from_config(&config.database));
        let registry = Arc::new(ModelRegistry::new().with::<notes::Note>("notes"));
        let db = Database::from_config(&config.database, cache, registry);

        AppState {
            config,
            db: Arc::new(db),
        }
    }

    async fn get(uri: &str) -> (StatusCode, Value) {
        get_from(&state(), uri).await
    }

    async fn get_from(state: &AppState, uri: &str) -> (StatusCode, Value) {
        let response = app(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get("/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["name"], "presence_api");
    }

    #[tokio::test]
    async fn test_notes_before_connect_is_unavailable() {
        let (status, body) = get("/api/notes").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body,
            json!({"error": "ServiceUnavailable", "message": "db not connected"})
        );
    }

    #[tokio::test]
    async fn test_ready_before_connect_reports_disconnected() {
        let (status, body) = get("/ready").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, json!({"status": "not ready", "database": "disconnected"}));
    }

    #[tokio::test]
    async fn test_unknown_route_falls_back_to_json_404() {
        let (status, body) = get("/api/missing").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "NotFound");
    }

    #[tokio::test]
    async fn test_unreachable_database_does_not_hold_up_requests() {
        let state = state();
        let connect = state.spawn_connect();

        // Served while the connect attempt is still waiting on server selection
        let (status, _) = get_from(&state, "/health").await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = get_from(&state, "/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["database"], "disconnected");

        connect.await.unwrap();
        assert!(!state.db.is_connected());
        let (status, _) = get_from(&state, "/api/notes").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
