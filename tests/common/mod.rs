//! Common test utilities for integration tests.
//!
//! Every `TestApp` runs its own server against a fresh SQLite file, so tests
//! can run in parallel without sharing state.

#![allow(dead_code)]

use once_cell::sync::Lazy;
use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::net::TcpListener;

use hospice_rbac::{
    create_db_pool_with_url, create_router, run_pool_migrations, AppState, Config, DbPool,
};

/// Asserts that a response has a specific status code.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $expected:expr) => {
        assert_eq!(
            $response.status().as_u16(),
            $expected,
            "Expected status {}, got {}",
            $expected,
            $response.status()
        );
    };
}

static TEST_CONFIG: Lazy<Config> = Lazy::new(Config::default_for_testing);

pub struct TestApp {
    pub client: Client,
    pub base_url: String,
    pub db_pool: DbPool,
    // Dropping this deletes the database file.
    _db_dir: TempDir,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let db_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_url = db_dir.path().join("rbac.db").to_string_lossy().into_owned();

        let db_pool = create_db_pool_with_url(&db_url).expect("Failed to create pool");
        run_pool_migrations(&db_pool).expect("Failed to run migrations");

        let state = AppState::new(db_pool.clone(), &TEST_CONFIG);
        let app = create_router(state, &TEST_CONFIG);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test server");
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            client: Client::new(),
            base_url: format!("http://127.0.0.1:{}", port),
            db_pool,
            _db_dir: db_dir,
        }
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("Failed to send GET request")
    }

    pub async fn post(&self, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .json(&body)
            .send()
            .await
            .expect("Failed to send POST request")
    }

    pub async fn put(&self, path: &str, body: Value) -> reqwest::Response {
        self.client
            .put(format!("{}{}", self.base_url, path))
            .json(&body)
            .send()
            .await
            .expect("Failed to send PUT request")
    }

    pub async fn delete(&self, path: &str) -> reqwest::Response {
        self.client
            .delete(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("Failed to send DELETE request")
    }

    /// Creates a permission and returns its id.
    pub async fn create_permission(&self, name: &str) -> i64 {
        let response = self.post("/permission/store", json!({ "name": name })).await;
        assert_status!(response, 201);
        let body: Value = response.json().await.expect("Failed to parse response");
        body["permission"]["id"].as_i64().expect("permission id")
    }

    /// Creates a role granting `permissions` and returns its id.
    pub async fn create_role(&self, name: &str, permissions: &[i64]) -> i64 {
        let response = self
            .post(
                "/role/store",
                json!({ "name": name, "permissions": permissions }),
            )
            .await;
        assert_status!(response, 201);
        let body: Value = response.json().await.expect("Failed to parse response");
        body["role"]["id"].as_i64().expect("role id")
    }

    pub async fn assign_role(&self, user_id: i64, role_id: i64) -> reqwest::Response {
        self.post(
            &format!("/users/{}/roles", user_id),
            json!({ "role_id": role_id }),
        )
        .await
    }

    pub async fn json(&self, path: &str) -> Value {
        let response = self.get(path).await;
        assert_status!(response, 200);
        response.json().await.expect("Failed to parse response")
    }
}

/// Names of the entries in a JSON array of roles or permissions.
pub fn names(items: &Value) -> Vec<String> {
    items
        .as_array()
        .expect("expected an array")
        .iter()
        .map(|item| item["name"].as_str().unwrap_or_default().to_string())
        .collect()
}
