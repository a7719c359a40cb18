mod common;

use chrono::Duration;
use common::TestApp;
use reqwest::StatusCode;
use serde_json::json;
use serde_json::Value;

#[tokio::test]
async fn test_register_success() {
    let app = TestApp::spawn().await;

    let response = app
        .post("/api/auth/register")
        .json(&json!({
            "email": "nicola@example.com",
            "password": "pass_word!",
            "first_name": "Nicola"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status_code"], 201);
    assert_eq!(body["data"]["user"]["email"], "nicola@example.com");
    assert_eq!(body["data"]["user"]["display_name"], "Nicola");
    assert!(body["data"]["user"]["id"].is_string());
    assert!(body["data"]["token"].is_string());
    assert!(body["data"]["session_id"].is_string());
    assert!(body["data"]["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let app = TestApp::spawn().await;
    app.register("nicola@example.com", "pass_word!").await;

    let response = app
        .post("/api/auth/register")
        .json(&json!({
            "email": "NICOLA@example.com",
            "password": "another_password"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body: Value = response.json().await.expect("Failed to parse response");
    let message = body["data"]["message"].as_str().unwrap();
    assert!(!message.contains("nicola"));
}

#[tokio::test]
async fn test_register_rejects_weak_password() {
    let app = TestApp::spawn().await;

    let response = app
        .post("/api/auth/register")
        .json(&json!({ "email": "a@x.com", "password": "short" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_register_rejects_invalid_email() {
    let app = TestApp::spawn().await;

    let response = app
        .post("/api/auth/register")
        .json(&json!({ "email": "not-an-email", "password": "password123" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_login_failures_look_the_same() {
    let app = TestApp::spawn().await;
    app.register("a@x.com", "password123").await;

    let wrong_password = app
        .post("/api/auth/login")
        .json(&json!({ "email": "a@x.com", "password": "wrong-password" }))
        .send()
        .await
        .expect("Failed to execute request");
    let unknown_email = app
        .post("/api/auth/login")
        .json(&json!({ "email": "nobody@x.com", "password": "password123" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);

    let first: Value = wrong_password.json().await.unwrap();
    let second: Value = unknown_email.json().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first["data"]["message"], "Invalid credentials");
}

#[tokio::test]
async fn test_profile_requires_valid_token() {
    let app = TestApp::spawn().await;
    let token = app.login_after_register("a@x.com", "password123").await;

    let response = app
        .get_authenticated("/api/auth/profile", &token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["email"], "a@x.com");
    assert_eq!(body["data"]["display_name"], "a");

    let missing = app.get("/api/auth/profile").send().await.unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let garbage = app
        .get_authenticated("/api/auth/profile", "not.a.token")
        .send()
        .await
        .unwrap();
    assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);
    let body: Value = garbage.json().await.unwrap();
    assert_eq!(body["data"]["message"], "Invalid or expired token");
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let app = TestApp::spawn().await;
    let token = app.login_after_register("a@x.com", "password123").await;

    let response = app
        .post_authenticated("/api/auth/logout", &token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let after = app
        .get_authenticated("/api/auth/profile", &token)
        .send()
        .await
        .unwrap();
    assert_eq!(after.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_all_reports_count() {
    let app = TestApp::spawn().await;
    let registered = app.register("a@x.com", "password123").await;
    let first = registered["data"]["token"].as_str().unwrap().to_string();
    let second = app.login("a@x.com", "password123").await;

    let response = app
        .post_authenticated("/api/auth/logout-all", &second)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["revoked"], 2);

    for token in [&first, &second] {
        let response = app
            .get_authenticated("/api/auth/profile", token)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_change_password() {
    let app = TestApp::spawn().await;
    let token = app.login_after_register("a@x.com", "password123").await;

    let wrong = app
        .post_authenticated("/api/auth/change-password", &token)
        .json(&json!({ "current_password": "nope-nope", "new_password": "new-password-1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .post_authenticated("/api/auth/change-password", &token)
        .json(&json!({ "current_password": "password123", "new_password": "new-password-1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let stale = app
        .get_authenticated("/api/auth/profile", &token)
        .send()
        .await
        .unwrap();
    assert_eq!(stale.status(), StatusCode::UNAUTHORIZED);

    app.login("a@x.com", "new-password-1").await;
}

#[tokio::test]
async fn test_password_reset_endpoints() {
    let app = TestApp::spawn().await;
    app.register("a@x.com", "password123").await;

    for email in ["a@x.com", "ghost@x.com"] {
        let response = app
            .post("/api/auth/password-reset")
            .json(&json!({ "email": email }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    let token = app
        .services
        .reset_notifier
        .last_token()
        .expect("reset token delivered");

    let bogus = app
        .post("/api/auth/password-reset/confirm")
        .json(&json!({ "token": "bogus", "new_password": "reset-password-1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(bogus.status(), StatusCode::BAD_REQUEST);

    let response = app
        .post("/api/auth/password-reset/confirm")
        .json(&json!({ "token": token, "new_password": "reset-password-1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    app.login("a@x.com", "reset-password-1").await;
}

#[tokio::test]
async fn test_session_records_client_metadata() {
    let app = TestApp::spawn().await;

    let response = app
        .post("/api/auth/register")
        .header("User-Agent", "integration-test/1.0")
        .header("X-Forwarded-For", "198.51.100.4, 10.0.0.2")
        .header("X-Device-Info", "test-runner")
        .json(&json!({ "email": "a@x.com", "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let sessions = app.services.sessions.all().await;
    assert_eq!(sessions.len(), 1);
    let metadata = &sessions[0].metadata;
    assert_eq!(metadata.user_agent.as_deref(), Some("integration-test/1.0"));
    assert_eq!(metadata.ip_address.as_deref(), Some("198.51.100.4"));
    assert_eq!(metadata.device_info.as_deref(), Some("test-runner"));
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let app = TestApp::spawn().await;
    let token = app.login_after_register("a@x.com", "password123").await;

    app.services.clock.advance(Duration::hours(24) + Duration::seconds(1));

    let response = app
        .get_authenticated("/api/auth/profile", &token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
