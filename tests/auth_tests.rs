//! Integration tests for login, refresh, logout and the password reset flow.

mod common;

use axum::http::StatusCode;
use common::{
    SUPERUSER, SUPERUSER_EMAIL, SUPERUSER_PASSWORD, assert_envelope, reset_token_from, spawn_app,
    spawn_app_with, test_config,
};
use portfolio_api::db::TokenKind;
use serde_json::json;

#[tokio::test]
async fn test_protected_routes_need_a_token() {
    let app = spawn_app().await;

    let (status, body) = app.get("/api/v1/users/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_envelope(&body, false);

    let (status, _) = app.get("/api/v1/contacts", Some("not-a-jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_returns_token_pair() {
    let app = spawn_app().await;

    let tokens = app.login(SUPERUSER, SUPERUSER_PASSWORD).await;
    assert_eq!(tokens["token_type"], "Bearer");
    assert_eq!(tokens["user"]["role"], "SuperUser");
    assert_eq!(tokens["refresh_token"].as_str().unwrap().len(), 64);

    let access = tokens["access_token"].as_str().unwrap();
    let (status, body) = app.get("/api/v1/users/me", Some(access)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], SUPERUSER);
    assert!(body["data"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_login_by_email_and_bad_password() {
    let app = spawn_app().await;

    let tokens = app.login(SUPERUSER_EMAIL, SUPERUSER_PASSWORD).await;
    assert_eq!(tokens["user"]["username"], SUPERUSER);

    let (status, body) = app
        .post(
            "/api/v1/auth/login",
            None,
            json!({ "login": SUPERUSER, "password": "wrong" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_envelope(&body, false);

    let (status, unknown) = app
        .post(
            "/api/v1/auth/login",
            None,
            json!({ "login": "nobody", "password": "wrong" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown["message"], body["message"]);
}

#[tokio::test]
async fn test_new_login_revokes_previous_access_token() {
    let app = spawn_app().await;

    let first = app.superuser_token().await;
    let second = app.superuser_token().await;

    let (status, _) = app.get("/api/v1/users/me", Some(&first)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/api/v1/users/me", Some(&second)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_rotates_tokens() {
    let app = spawn_app().await;

    let tokens = app.login(SUPERUSER, SUPERUSER_PASSWORD).await;
    let refresh = tokens["refresh_token"].as_str().unwrap();

    let (status, body) = app
        .post(
            "/api/v1/auth/refresh",
            None,
            json!({ "refresh_token": refresh }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_envelope(&body, true);

    let new_refresh = body["data"]["refresh_token"].as_str().unwrap();
    let new_access = body["data"]["access_token"].as_str().unwrap();
    assert_ne!(new_refresh, refresh);

    let (status, _) = app.get("/api/v1/users/me", Some(new_access)).await;
    assert_eq!(status, StatusCode::OK);

    // The consumed refresh token is gone.
    let (status, _) = app
        .post(
            "/api/v1/auth/refresh",
            None,
            json!({ "refresh_token": refresh }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_revokes_access_and_refresh() {
    let app = spawn_app().await;

    let tokens = app.login(SUPERUSER, SUPERUSER_PASSWORD).await;
    let access = tokens["access_token"].as_str().unwrap();
    let refresh = tokens["refresh_token"].as_str().unwrap();

    let (status, body) = app.post("/api/v1/auth/logout", Some(access), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_envelope(&body, true);

    let (status, _) = app.get("/api/v1/users/me", Some(access)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .post(
            "/api/v1/auth/refresh",
            None,
            json!({ "refresh_token": refresh }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_forgot_password_does_not_reveal_accounts() {
    let app = spawn_app().await;

    let (known_status, known) = app
        .post(
            "/api/v1/auth/forgot-password",
            None,
            json!({ "email": SUPERUSER_EMAIL }),
        )
        .await;
    let (unknown_status, unknown) = app
        .post(
            "/api/v1/auth/forgot-password",
            None,
            json!({ "email": "ghost@example.com" }),
        )
        .await;

    assert_eq!(known_status, StatusCode::OK);
    assert_eq!(unknown_status, StatusCode::OK);
    assert_eq!(known, unknown);

    assert_eq!(app.mailer.sent_to(SUPERUSER_EMAIL).len(), 1);
    assert!(app.mailer.sent_to("ghost@example.com").is_empty());
}

#[tokio::test]
async fn test_reset_password_flow() {
    let app = spawn_app().await;
    let (_, old_access) = app.register_and_login("ada", "ada@example.com").await;

    app.post(
        "/api/v1/auth/forgot-password",
        None,
        json!({ "email": "ADA@example.com" }),
    )
    .await;

    let email = app
        .mailer
        .sent_to("ada@example.com")
        .into_iter()
        .find(|e| e.subject == "Reset your password")
        .expect("reset email not sent");
    let token = reset_token_from(&email);

    // Weak password is rejected and the token survives.
    let (status, body) = app
        .post(
            "/api/v1/auth/reset-password",
            None,
            json!({ "token": token, "new_password": "weak" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("new_password"));

    let (status, _) = app
        .post(
            "/api/v1/auth/reset-password",
            None,
            json!({ "token": token, "new_password": "N3wPassword" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Old sessions are revoked and the token is single use.
    let (status, _) = app.get("/api/v1/users/me", Some(&old_access)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .post(
            "/api/v1/auth/reset-password",
            None,
            json!({ "token": token, "new_password": "An0therOne" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let tokens = app.login("ada", "N3wPassword").await;
    assert_eq!(tokens["user"]["email"], "ada@example.com");
}

#[tokio::test]
async fn test_reset_with_unknown_token() {
    let app = spawn_app().await;

    let (status, body) = app
        .post(
            "/api/v1/auth/reset-password",
            None,
            json!({ "token": "f".repeat(64), "new_password": "N3wPassword" }),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_envelope(&body, false);
}

#[tokio::test]
async fn test_change_password() {
    let app = spawn_app().await;
    let (_, token) = app.register_and_login("grace", "grace@example.com").await;

    let (status, body) = app
        .put(
            "/api/v1/users/me/password",
            Some(&token),
            json!({ "current_password": "Wrong1234", "new_password": "Different1" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("current_password"));

    let (status, _) = app
        .put(
            "/api/v1/users/me/password",
            Some(&token),
            json!({ "current_password": "Passw0rd!", "new_password": "Passw0rd!" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .put(
            "/api/v1/users/me/password",
            Some(&token),
            json!({ "current_password": "Passw0rd!", "new_password": "Different1" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // The current session stays valid.
    let (status, _) = app.get("/api/v1/users/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);

    app.login("grace", "Different1").await;
}

#[tokio::test]
async fn test_expired_refresh_token_is_rejected_and_deleted() {
    let app = spawn_app().await;

    let tokens = app.login(SUPERUSER, SUPERUSER_PASSWORD).await;
    let refresh = tokens["refresh_token"].as_str().unwrap();
    let user_id = i32::try_from(tokens["user"]["id"].as_i64().unwrap()).unwrap();

    app.expire_token(TokenKind::Refresh, user_id, refresh).await;

    let (status, body) = app
        .post(
            "/api/v1/auth/refresh",
            None,
            json!({ "refresh_token": refresh }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_envelope(&body, false);
    assert_eq!(body["message"], "Token expired");
    assert!(!app.token_exists(TokenKind::Refresh, refresh).await);

    let (status, body) = app
        .post(
            "/api/v1/auth/refresh",
            None,
            json!({ "refresh_token": refresh }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid or unknown token");
}

#[tokio::test]
async fn test_expired_reset_token_is_rejected_and_deleted() {
    let app = spawn_app().await;
    let (id, _) = app.register_and_login("ada", "ada@example.com").await;

    app.post(
        "/api/v1/auth/forgot-password",
        None,
        json!({ "email": "ada@example.com" }),
    )
    .await;
    let email = app
        .mailer
        .sent_to("ada@example.com")
        .into_iter()
        .find(|e| e.subject == "Reset your password")
        .expect("reset email not sent");
    let token = reset_token_from(&email);

    app.expire_token(TokenKind::ForgotPassword, i32::try_from(id).unwrap(), &token)
        .await;

    let (status, body) = app
        .post(
            "/api/v1/auth/reset-password",
            None,
            json!({ "token": token, "new_password": "N3wPassword" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token expired");
    assert!(!app.token_exists(TokenKind::ForgotPassword, &token).await);

    let (status, body) = app
        .post(
            "/api/v1/auth/reset-password",
            None,
            json!({ "token": token, "new_password": "N3wPassword" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid or unknown token");

    // The old password still works.
    app.login("ada", "Passw0rd!").await;
}

#[tokio::test]
async fn test_purge_removes_only_expired_tokens() {
    let app = spawn_app().await;

    let stale = app.login(SUPERUSER, SUPERUSER_PASSWORD).await;
    let stale_refresh = stale["refresh_token"].as_str().unwrap();
    let superuser_id = i32::try_from(stale["user"]["id"].as_i64().unwrap()).unwrap();
    app.expire_token(TokenKind::Refresh, superuser_id, stale_refresh)
        .await;

    let (ada_id, _) = app.register_and_login("ada", "ada@example.com").await;
    let fresh = app.login("ada", "Passw0rd!").await;
    let fresh_refresh = fresh["refresh_token"].as_str().unwrap();

    app.post(
        "/api/v1/auth/forgot-password",
        None,
        json!({ "email": "ada@example.com" }),
    )
    .await;
    let email = app
        .mailer
        .sent_to("ada@example.com")
        .into_iter()
        .find(|e| e.subject == "Reset your password")
        .expect("reset email not sent");
    let reset = reset_token_from(&email);
    app.expire_token(
        TokenKind::ForgotPassword,
        i32::try_from(ada_id).unwrap(),
        &reset,
    )
    .await;

    let purged = app.state.store().purge_expired_tokens().await.unwrap();
    assert_eq!(purged, 2);

    assert!(!app.token_exists(TokenKind::Refresh, stale_refresh).await);
    assert!(!app.token_exists(TokenKind::ForgotPassword, &reset).await);
    assert!(app.token_exists(TokenKind::Refresh, fresh_refresh).await);

    assert_eq!(app.state.store().purge_expired_tokens().await.unwrap(), 0);
}

#[tokio::test]
async fn test_mixed_case_superuser_email_is_normalized() {
    let mut config = test_config();
    config.superuser.email = "Owner@Example.com".to_string();
    let app = spawn_app_with(config).await;

    let tokens = app.login("Owner@Example.com", SUPERUSER_PASSWORD).await;
    assert_eq!(tokens["user"]["email"], SUPERUSER_EMAIL);

    let (status, _) = app
        .post(
            "/api/v1/auth/forgot-password",
            None,
            json!({ "email": "Owner@Example.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.mailer.sent_to(SUPERUSER_EMAIL).len(), 1);
}
