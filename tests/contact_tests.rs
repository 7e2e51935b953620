//! Integration tests for the contact endpoints.

mod common;

use axum::http::StatusCode;
use common::{TestApp, assert_envelope, spawn_app};
use serde_json::{Value, json};

async fn submit(app: &TestApp, name: &str, email: &str) -> Value {
    let (status, body) = app
        .post(
            "/api/v1/contacts",
            None,
            json!({
                "name": name,
                "email": email,
                "phone": "+44 20 7946 0958",
                "message": "Hello there"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    body["data"].clone()
}

#[tokio::test]
async fn test_public_create_sends_emails() {
    let app = spawn_app().await;

    let (status, body) = app
        .post(
            "/api/v1/contacts",
            None,
            json!({ "name": "  Ada Lovelace ", "email": "Ada@Example.com", "message": "Hi" }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_envelope(&body, true);
    assert_eq!(body["message"], "Contact created");
    assert_eq!(body["data"]["name"], "Ada Lovelace");
    assert_eq!(body["data"]["email"], "ada@example.com");
    assert!(body["data"]["phone"].is_null());

    assert_eq!(app.mailer.sent_to("ada@example.com").len(), 1);
    let inbox = app.mailer.sent_to("inbox@example.com");
    assert_eq!(inbox.len(), 1);
    assert!(inbox[0].body.contains("Ada Lovelace"));
}

#[tokio::test]
async fn test_create_rejects_duplicates_and_bad_fields() {
    let app = spawn_app().await;
    submit(&app, "Ada", "ada@example.com").await;

    let (status, body) = app
        .post(
            "/api/v1/contacts",
            None,
            json!({ "name": "Other Ada", "email": "ADA@example.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_envelope(&body, false);

    let (status, body) = app
        .post(
            "/api/v1/contacts",
            None,
            json!({ "email": "not-an-email", "phone": "call me" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("email"), "{message}");
    assert!(message.contains("phone"), "{message}");

    let (status, _) = app
        .post("/api/v1/contacts", None, json!({ "name": "No email" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_manages_all_contacts() {
    let app = spawn_app().await;
    let token = app.superuser_token().await;

    let first = submit(&app, "Ada Lovelace", "ada@example.com").await;
    submit(&app, "Grace Hopper", "grace@example.com").await;
    submit(&app, "Alan Turing", "alan@example.com").await;

    let (status, body) = app
        .get("/api/v1/contacts?page=1&page_size=2", Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["total_items"], 3);
    assert_eq!(body["data"]["total_pages"], 2);

    let id = first["id"].as_i64().unwrap();
    let (status, body) = app
        .put(
            &format!("/api/v1/contacts/{id}"),
            Some(&token),
            json!({ "name": "Augusta Ada King", "email": "ada@example.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Augusta Ada King");
    assert!(body["data"]["message"].is_null());

    // Email already used by another contact.
    let (status, _) = app
        .put(
            &format!("/api/v1/contacts/{id}"),
            Some(&token),
            json!({ "name": "Ada", "email": "grace@example.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .delete(&format!("/api/v1/contacts/{id}"), Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], id);

    let (status, body) = app
        .get(&format!("/api/v1/contacts/{id}"), Some(&token))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_envelope(&body, false);

    let (status, _) = app
        .delete(&format!("/api/v1/contacts/{id}"), Some(&token))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_ids_and_paging() {
    let app = spawn_app().await;
    let token = app.superuser_token().await;

    let (status, _) = app.get("/api/v1/contacts/0", Some(&token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.get("/api/v1/contacts/abc", Some(&token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_envelope(&body, false);

    let (status, _) = app
        .get("/api/v1/contacts?page_size=500", Some(&token))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_user_sees_only_own_contact() {
    let app = spawn_app().await;
    let (_, token) = app.register_and_login("ada", "ada@example.com").await;

    let own = submit(&app, "Ada Lovelace", "ada@example.com").await;
    let other = submit(&app, "Grace Hopper", "grace@example.com").await;

    let (status, body) = app.get("/api/v1/contacts", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["email"], "ada@example.com");

    let other_id = other["id"].as_i64().unwrap();
    let (status, body) = app
        .get(&format!("/api/v1/contacts/{other_id}"), Some(&token))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_envelope(&body, false);

    let (status, _) = app
        .delete(&format!("/api/v1/contacts/{other_id}"), Some(&token))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let own_id = own["id"].as_i64().unwrap();

    // Cannot move their contact onto someone else's address.
    let (status, _) = app
        .put(
            &format!("/api/v1/contacts/{own_id}"),
            Some(&token),
            json!({ "name": "Ada", "email": "someone@example.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .put(
            &format!("/api/v1/contacts/{own_id}"),
            Some(&token),
            json!({ "name": "Ada L.", "email": "ada@example.com", "phone": "555-0100" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["phone"], "555-0100");

    let (status, _) = app
        .delete(&format!("/api/v1/contacts/{own_id}"), Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_fuzzy_search() {
    let app = spawn_app().await;
    let token = app.superuser_token().await;

    submit(&app, "Ada Lovelace", "ada@example.com").await;
    submit(&app, "Adda Byron", "adda@example.com").await;
    submit(&app, "Grace Hopper", "grace@example.com").await;

    let (status, body) = app
        .get("/api/v1/contacts/search?name=ada", Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Found 2 matching contact(s)");

    let hits = body["data"].as_array().unwrap();
    assert_eq!(hits[0]["name"], "Ada Lovelace");
    assert_eq!(hits[1]["name"], "Adda Byron");
    assert!(hits[0]["score"].as_f64().unwrap() > hits[1]["score"].as_f64().unwrap());

    let (status, body) = app
        .get("/api/v1/contacts/search?name=zzzzzz", Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());

    let (status, body) = app
        .get("/api/v1/contacts/search?name=%20%20", Some(&token))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_envelope(&body, false);

    let (status, _) = app.get("/api/v1/contacts/search", Some(&token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_is_scoped_for_users() {
    let app = spawn_app().await;
    let (_, token) = app.register_and_login("ada", "ada@example.com").await;

    submit(&app, "Ada Lovelace", "ada@example.com").await;
    submit(&app, "Ada Byron", "byron@example.com").await;

    let (status, body) = app
        .get("/api/v1/contacts/search?name=ada", Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    let hits = body["data"].as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["email"], "ada@example.com");
}
