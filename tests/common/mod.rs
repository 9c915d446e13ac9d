use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tempfile::TempDir;
use tillpoint_api::{config::AppConfig, db, AppState};
use tower::ServiceExt;

/// Helper harness for spinning up an application router backed by a
/// throwaway SQLite database.
pub struct TestApp {
    router: Router,
    #[allow(dead_code)]
    pub db: Arc<DatabaseConnection>,
    _tmp: TempDir,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir for test database");
        let db_file = tmp.path().join("tillpoint_test.db");

        // Minimal configuration suitable for tests.
        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_file.display()),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.auto_migrate = true;
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");

        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let state = AppState::new(db_arc.clone(), cfg);
        let router = tillpoint_api::routes().with_state(state);

        Self {
            router,
            db: db_arc,
            _tmp: tmp,
        }
    }

    /// Send a request through the router without binding a socket.
    pub async fn request(&self, method: Method, uri: &str, json: Option<Value>) -> Response {
        let builder = Request::builder().method(method).uri(uri);

        let request = match json {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .expect("build request"),
            None => builder.body(Body::empty()).expect("build request"),
        };

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("send request")
    }
}

/// Read a response body as JSON.
pub async fn read_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    serde_json::from_slice(&bytes).expect("parse response body")
}
