//! Common test utilities for HTTP tests
//!
//! This module provides shared infrastructure for the API tests:
//! - A router over fresh in-memory stores
//! - A cheap password work factor so signups stay fast
//! - JSON request helpers
//! - Account and group setup shortcuts

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use duotask_api::app::{build_router, AppState};
use duotask_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig};
use duotask_shared::auth::password::PasswordParams;
use duotask_shared::store::Stores;
use serde_json::{json, Value};
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test-secret-key-at-least-32-bytes-long";

/// Test context containing the router and its backing stores
pub struct TestContext {
    pub stores: Stores,
    pub app: axum::Router,
    pub config: Config,
}

/// A signed-up user as seen by the client
pub struct Session {
    pub token: String,
    pub user: Value,
}

impl Session {
    pub fn id(&self) -> &str {
        self.user["id"].as_str().unwrap_or_default()
    }
}

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["http://localhost:5173".to_string()],
            production: false,
        },
        database: DatabaseConfig {
            url: "postgresql://unused".to_string(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
            ttl_seconds: 3600,
        },
        password: PasswordParams {
            memory_kib: 256,
            iterations: 1,
            parallelism: 1,
        },
    }
}

impl TestContext {
    /// Creates a new context over empty in-memory stores
    pub fn new() -> Self {
        let stores = Stores::in_memory();
        let config = test_config();
        let state = AppState::new(stores.clone(), config.clone())
            .expect("test password parameters are valid");
        let app = build_router(state);

        Self {
            stores,
            app,
            config,
        }
    }

    /// Sends a request and returns the status plus the parsed JSON body
    ///
    /// An empty body parses as `Value::Null`.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        self.send_raw(request).await
    }

    pub async fn send_raw(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, Some(token), None).await
    }

    /// Signs up a user and returns the session
    pub async fn signup(&self, name: &str, email: &str) -> Session {
        let (status, body) = self
            .send(
                Method::POST,
                "/v1/auth/signup",
                None,
                Some(json!({ "name": name, "email": email, "password": "secret1" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "signup failed: {}", body);

        Session {
            token: body["token"].as_str().unwrap().to_string(),
            user: body["user"].clone(),
        }
    }

    /// Two users sharing a freshly created group; returns (founder, joiner, group id)
    pub async fn household(&self) -> (Session, Session, String) {
        let alice = self.signup("Alice", "alice@example.com").await;
        let bob = self.signup("Bob", "bob@example.com").await;

        let (status, body) = self
            .post("/v1/relationships/create-group", &alice.token, json!({ "name": "Home" }))
            .await;
        assert_eq!(status, StatusCode::OK, "create-group failed: {}", body);
        let group_id = body["group"]["id"].as_str().unwrap().to_string();

        let (_, body) = self
            .send(Method::POST, "/v1/relationships/invite-code", Some(&alice.token), None)
            .await;
        let code = body["code"].as_str().unwrap().to_string();

        let (status, body) = self
            .post("/v1/relationships/join-by-code", &bob.token, json!({ "code": code }))
            .await;
        assert_eq!(status, StatusCode::OK, "join failed: {}", body);

        (alice, bob, group_id)
    }

    /// Creates a task and returns its JSON
    pub async fn create_task(&self, token: &str, title: &str, date: &str) -> Value {
        let (status, body) = self
            .post("/v1/tasks", token, json!({ "title": title, "date": date }))
            .await;
        assert_eq!(status, StatusCode::OK, "create task failed: {}", body);
        body["task"].clone()
    }
}
