use axum::{
    routing::{get, post, put},
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn,
};
use tower_http::{
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tower_sessions::{MemoryStore, SessionManagerLayer};
use tower_sessions::cookie::SameSite;
use std::sync::Arc;
use crate::{
    config::Config,
    handlers,
    middleware,
    services::Board,
};

// Application state shared between handlers
#[derive(Clone)]
pub struct AppState {
    pub board: Arc<Board>,
    pub config: Config,
}

pub fn router(state: AppState) -> Router {
    // Session store setup
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_name("session");

    let max_body_size = state.config.limits.max_body_size;

    Router::new()
        // Auth routes
        .route("/health", get(handlers::health))
        .route("/login", post(handlers::handle_login))
        .route("/logout", post(handlers::handle_logout))
        .route("/session", get(handlers::session_info))

        // Task routes
        .route("/tasks", get(handlers::serve_board).post(handlers::add_task))
        .route("/tasks/completed", get(handlers::search_completed))
        .route("/tasks/:task_id", put(handlers::edit_task).delete(handlers::delete_task))
        .route("/tasks/:task_id/complete", post(handlers::complete_task))
        .route("/tasks/:task_id/revert", post(handlers::revert_task))

        // User administration routes
        .route("/users", get(handlers::list_users).post(handlers::register_user))
        .route("/users/:username", axum::routing::delete(handlers::remove_user))
        .route("/users/:username/password", put(handlers::change_password))

        // Manual sync
        .route("/sync/pull", post(handlers::pull_tasks))
        .route("/sync/push", post(handlers::push_all))

        // Add middleware
        .layer(from_fn(middleware::require_auth))
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())

        // Request size limits from config
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_size))

        // Add state
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use crate::services::sync::tests::FlakyProvider;
    use crate::services::{MemoryProvider, PersistenceProvider, PlaintextVerifier, SyncCoordinator};

    async fn test_app() -> Router {
        app_with(Arc::new(MemoryProvider::new())).await
    }

    async fn app_with(provider: Arc<dyn PersistenceProvider>) -> Router {
        let config = Config::for_tests();
        let sync = SyncCoordinator::new(provider, None);
        let board = Board::bootstrap(&config.board, sync, Arc::new(PlaintextVerifier))
            .await
            .unwrap();
        router(AppState { board: Arc::new(board), config })
    }

    fn request(method: Method, uri: &str, cookie: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn login(app: &Router, username: &str, password: &str) -> String {
        let response = app
            .clone()
            .oneshot(request(
                Method::POST,
                "/login",
                None,
                Some(json!({ "username": username, "password": password })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    #[tokio::test]
    async fn unauthenticated_requests_are_rejected() {
        let app = test_app().await;

        let response = app.clone().oneshot(request(Method::GET, "/tasks", None, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app.oneshot(request(Method::GET, "/health", None, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let app = test_app().await;
        let response = app
            .oneshot(request(
                Method::POST,
                "/login",
                None,
                Some(json!({ "username": "TAKEDA", "password": "nope" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn task_lifecycle_over_http() {
        let app = test_app().await;
        let cookie = login(&app, "TAKEDA", "147369").await;

        let response = app
            .clone()
            .oneshot(request(
                Method::POST,
                "/tasks",
                Some(&cookie),
                Some(json!({ "text": "Print reports", "priority": "high" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["data"]["id"], 1);
        assert_eq!(body["data"]["lastModifiedBy"], "TAKEDA");
        assert_eq!(body["synced"], true);
        assert_eq!(body["board"]["pending"]["high"][0]["text"], "Print reports");

        let response = app
            .clone()
            .oneshot(request(Method::POST, "/tasks/1/complete", Some(&cookie), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(request(Method::GET, "/tasks/completed?priority=low", Some(&cookie), None))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["tasks"].as_array().unwrap().len(), 0);
        assert!(body["message"].is_string());

        let response = app
            .clone()
            .oneshot(request(Method::DELETE, "/tasks/1", Some(&cookie), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(request(Method::DELETE, "/tasks/1", Some(&cookie), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn non_principal_cannot_delete_completed_tasks() {
        let app = test_app().await;
        let admin = login(&app, "TAKEDA", "147369").await;

        let response = app
            .clone()
            .oneshot(request(
                Method::POST,
                "/users",
                Some(&admin),
                Some(json!({ "username": "alice", "password": "pw" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(request(
                Method::POST,
                "/users",
                Some(&admin),
                Some(json!({ "username": "alice", "password": "other" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let alice = login(&app, "alice", "pw").await;
        app.clone()
            .oneshot(request(Method::POST, "/tasks", Some(&alice), Some(json!({ "text": "Mine" }))))
            .await
            .unwrap();
        app.clone()
            .oneshot(request(Method::POST, "/tasks/1/complete", Some(&alice), None))
            .await
            .unwrap();

        let response = app
            .clone()
            .oneshot(request(Method::DELETE, "/tasks/1", Some(&alice), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .oneshot(request(Method::DELETE, "/users/TAKEDA", Some(&admin), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn manual_sync_reports_an_unreachable_store() {
        let provider = Arc::new(FlakyProvider::default());
        let app = app_with(provider.clone()).await;
        let cookie = login(&app, "TAKEDA", "147369").await;
        app.clone()
            .oneshot(request(Method::POST, "/tasks", Some(&cookie), Some(json!({ "text": "Kept" }))))
            .await
            .unwrap();

        provider.set_offline(true);
        for uri in ["/sync/pull", "/sync/push"] {
            let response = app.clone().oneshot(request(Method::POST, uri, Some(&cookie), None)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        }

        let response = app.clone().oneshot(request(Method::GET, "/tasks", Some(&cookie), None)).await.unwrap();
        let body = json_body(response).await;
        assert_eq!(body["pending"]["low"][0]["text"], "Kept");

        provider.set_offline(false);
        let response = app
            .clone()
            .oneshot(request(Method::POST, "/sync/push", Some(&cookie), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["pushed"], 1);

        let response = app.oneshot(request(Method::POST, "/sync/pull", Some(&cookie), None)).await.unwrap();
        assert_eq!(json_body(response).await["loaded"], 1);
    }
}
