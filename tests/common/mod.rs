#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use portfolio_api::api::AppState;
use portfolio_api::config::Config;
use portfolio_api::db::TokenKind;
use portfolio_api::services::TokenService;
use portfolio_api::services::{EmailError, Mailer, OutgoingEmail};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub const SUPERUSER: &str = "superuser";
pub const SUPERUSER_EMAIL: &str = "owner@example.com";
pub const SUPERUSER_PASSWORD: &str = "Sup3rSecret!";

/// Keeps every message instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, address: &str) -> Vec<OutgoingEmail> {
        self.sent()
            .into_iter()
            .filter(|e| e.to == address)
            .collect()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), EmailError> {
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub mailer: Arc<RecordingMailer>,
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.general.users_database_url = "sqlite::memory:".to_string();
    config.general.contacts_database_url = "sqlite::memory:".to_string();
    config.security.jwt_signing_key = "integration-test-signing-key-0123456789".to_string();
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config.superuser.password = SUPERUSER_PASSWORD.to_string();
    config.email.owner_address = Some("inbox@example.com".to_string());
    config
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(test_config()).await
}

pub async fn spawn_app_with(config: Config) -> TestApp {
    let mailer = Arc::new(RecordingMailer::default());
    let handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .build_recorder()
        .handle();

    let state =
        portfolio_api::api::create_app_state_with_mailer(config, mailer.clone(), Some(handle))
            .await
            .expect("Failed to create app state");

    TestApp {
        router: portfolio_api::api::router(state.clone()),
        state,
        mailer,
    }
}

impl TestApp {
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }

        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request("GET", uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request("POST", uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request("PUT", uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request("DELETE", uri, token, None).await
    }

    /// Logs in and returns the `data` object of the token response.
    pub async fn login(&self, login: &str, password: &str) -> Value {
        let (status, body) = self
            .post(
                "/api/v1/auth/login",
                None,
                json!({ "login": login, "password": password }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["data"].clone()
    }

    pub async fn superuser_token(&self) -> String {
        self.login(SUPERUSER, SUPERUSER_PASSWORD).await["access_token"]
            .as_str()
            .unwrap()
            .to_string()
    }

    /// Rewrites the expiry of a stored token, looked up by its plaintext.
    pub async fn expire_token(&self, kind: TokenKind, user_id: i32, plaintext: &str) {
        self.state
            .store()
            .token_repo()
            .replace(
                kind,
                user_id,
                &TokenService::hash_token(plaintext),
                chrono::Utc::now() - chrono::Duration::minutes(1),
            )
            .await
            .unwrap();
    }

    pub async fn token_exists(&self, kind: TokenKind, plaintext: &str) -> bool {
        self.state
            .store()
            .token_repo()
            .find(kind, &TokenService::hash_token(plaintext))
            .await
            .unwrap()
            .is_some()
    }

    /// Registers a `User` and returns (id, access token).
    pub async fn register_and_login(&self, username: &str, email: &str) -> (i64, String) {
        let (status, body) = self
            .post(
                "/api/v1/users/register",
                None,
                json!({ "username": username, "email": email, "password": "Passw0rd!" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");

        let id = body["data"]["id"].as_i64().unwrap();
        let token = self.login(username, "Passw0rd!").await["access_token"]
            .as_str()
            .unwrap()
            .to_string();
        (id, token)
    }
}

/// Pulls the 64-character reset token out of a forgot-password email.
pub fn reset_token_from(email: &OutgoingEmail) -> String {
    let start = email.body.find("token=").expect("no reset link in email") + "token=".len();
    email.body[start..start + 64].to_string()
}

pub fn assert_envelope(body: &Value, success: bool) {
    assert_eq!(body["success"], success, "unexpected envelope: {body}");
    assert!(body["message"].is_string(), "missing message: {body}");
    assert!(body.get("data").is_some(), "missing data field: {body}");
}
