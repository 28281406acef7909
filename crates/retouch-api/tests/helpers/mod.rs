//! Test helpers: build AppState and router over in-memory stores.
//!
//! Run from workspace root: `cargo test -p retouch-api`.

pub mod auth;

use axum_test::TestServer;
use retouch_api::constants;
use retouch_api::setup::routes;
use retouch_api::state::AppState;
use retouch_core::Config;
use retouch_editor::test_helpers::{MockCreditLedger, MockImageStore};
use std::sync::Arc;
use uuid::Uuid;

/// Debounce window used by test sessions
pub const TEST_DEBOUNCE_MS: u64 = 20;

/// API path prefix for tests (e.g. `/api/v0`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

pub fn test_config(credit_fee: i64) -> Config {
    Config {
        server_port: 0,
        environment: "test".to_string(),
        cors_origins: vec!["*".to_string()],
        database_url: "postgres://localhost/retouch_test".to_string(),
        db_max_connections: 1,
        db_timeout_seconds: 1,
        jwt_secret: auth::TEST_JWT_SECRET.to_string(),
        cloud_name: "demo".to_string(),
        delivery_base_url: "https://res.cloudinary.com".to_string(),
        credit_fee,
        debounce_ms: TEST_DEBOUNCE_MS,
        session_idle_timeout_secs: 1800,
    }
}

/// Test application: server plus handles on the in-memory stores.
pub struct TestApp {
    pub server: TestServer,
    pub images: Arc<MockImageStore>,
    pub ledger: Arc<MockCreditLedger>,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Register a user with `balance` credits and return a bearer token.
    pub fn user_with_credits(&self, balance: i64) -> (Uuid, String) {
        let user_id = Uuid::new_v4();
        self.ledger.set_balance(user_id, balance);
        (user_id, auth::token_for(user_id))
    }
}

pub fn setup_test_app() -> TestApp {
    setup_test_app_with_fee(-1)
}

pub fn setup_test_app_with_fee(credit_fee: i64) -> TestApp {
    let config = test_config(credit_fee);
    let images = Arc::new(MockImageStore::new());
    let ledger = Arc::new(MockCreditLedger::new());
    let state = Arc::new(AppState::new(
        config.clone(),
        None,
        images.clone(),
        ledger.clone(),
    ));

    let router = routes::setup_routes(&config, state).expect("Failed to build routes");
    let server = TestServer::new(router).expect("Failed to start test server");

    TestApp {
        server,
        images,
        ledger,
    }
}
