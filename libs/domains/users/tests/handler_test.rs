//! Handler tests for the users domain
//!
//! Drives `handlers::router` behind the session middleware with an
//! in-memory repository and a recording mail provider.

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::middleware::from_fn_with_state;
use axum::Router;
use axum_helpers::{AuthState, JwtAuth, JwtConfig, TokenPurpose, authenticate};
use domain_users::*;
use email::{DispatcherConfig, EmailDispatcher, MockSmtpProvider, NotificationConfig, NotificationService};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use test_utils::TestDataBuilder;
use tower::ServiceExt; // For oneshot()

const SECRET: &str = "handler-test-secret-at-least-32-characters";

struct TestApp {
    app: Router,
    service: UserService<InMemoryUserRepository>,
    notifications: NotificationService,
    mailbox: MockSmtpProvider,
}

fn test_app() -> TestApp {
    let jwt = JwtAuth::new(&JwtConfig::new(SECRET));
    let mailbox = MockSmtpProvider::new();
    let dispatcher =
        EmailDispatcher::spawn(Arc::new(mailbox.clone()), DispatcherConfig::immediate());
    let notifications =
        NotificationService::new(dispatcher, NotificationConfig::default()).unwrap();

    let service = UserService::new(InMemoryUserRepository::new(), jwt.clone())
        .with_notifications(notifications.clone());
    let auth = AuthState::new(jwt, Arc::new(service.clone()));

    let app = handlers::router(service.clone()).layer(from_fn_with_state(auth, authenticate));

    TestApp {
        app,
        service,
        notifications,
        mailbox,
    }
}

// Helper to parse JSON response body
async fn json_body(body: Body) -> Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn with_bearer(method: &str, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token));

    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Register through HTTP and verify directly, returning the session token
async fn verified_session(t: &TestApp, email: &str) -> String {
    let response = t
        .app
        .clone()
        .oneshot(post_json(
            "/register",
            json!({ "name": "Test User", "email": email, "password": "password123" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let user = json_body(response.into_body()).await;
    let id = user["id"].as_str().unwrap().parse().unwrap();

    let verify = t.service.issue(id, TokenPurpose::EmailVerification).unwrap();
    t.service.verify_email(&verify).await.unwrap();

    t.service.issue(id, TokenPurpose::Session).unwrap()
}

#[tokio::test]
async fn test_register_returns_201_with_public_profile() {
    let t = test_app();
    let builder = TestDataBuilder::from_test_name("register_201");

    let response = t
        .app
        .clone()
        .oneshot(post_json(
            "/register",
            json!({ "name": "Ada", "email": builder.email("ada"), "password": "password123" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);

    let body = json_body(response.into_body()).await;
    assert_eq!(body["email"], builder.email("ada"));
    assert_eq!(body["emailVerified"], false);
    assert_eq!(body["role"], "user");
    assert!(body.get("passwordHash").is_none());
    assert!(body.get("token").is_none());
}

#[tokio::test]
async fn test_register_validates_input() {
    let t = test_app();

    let response = t
        .app
        .clone()
        .oneshot(post_json(
            "/register",
            json!({ "name": "Ada", "email": "not-an-email", "password": "password123" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_duplicate_returns_409() {
    let t = test_app();
    let body = json!({ "name": "Ada", "email": "dup@example.com", "password": "password123" });

    let first = t.app.clone().oneshot(post_json("/register", body.clone())).await.unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = t.app.clone().oneshot(post_json("/register", body)).await.unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_full_registration_flow_via_emailed_link() {
    let t = test_app();
    let credentials = json!({ "email": "flow@example.com", "password": "password123" });

    let response = t
        .app
        .clone()
        .oneshot(post_json(
            "/register",
            json!({ "name": "Flow", "email": "flow@example.com", "password": "password123" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Unverified login is refused
    let response = t.app.clone().oneshot(post_json("/login", credentials.clone())).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["message"], "Email not verified");

    // Follow the emailed link
    t.notifications.dispatcher().flush().await;
    let sent = t.mailbox.sent_to("flow@example.com").await;
    assert_eq!(sent.len(), 1);
    let text = sent[0].body_text.clone().unwrap();
    let path = text
        .split_whitespace()
        .find_map(|word| word.split_once("/api/users").map(|(_, rest)| rest.to_string()))
        .unwrap();

    let response = t
        .app
        .clone()
        .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = t.app.clone().oneshot(post_json("/login", credentials)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response.into_body()).await;
    assert!(body["token"].as_str().is_some_and(|token| !token.is_empty()));
    assert_eq!(body["user"]["emailVerified"], true);
}

#[tokio::test]
async fn test_login_wrong_password_returns_401() {
    let t = test_app();
    verified_session(&t, "wrongpw@example.com").await;

    let response = t
        .app
        .clone()
        .oneshot(post_json(
            "/login",
            json!({ "email": "wrongpw@example.com", "password": "not-the-password" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["message"], "Invalid email or password");
}

#[tokio::test]
async fn test_verify_email_with_bad_token_returns_400() {
    let t = test_app();

    let response = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/verify-email/garbage")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_profile_requires_token() {
    let t = test_app();

    let response = t
        .app
        .clone()
        .oneshot(Request::builder().uri("/profile").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["message"], "Not authorized, no token");
}

#[tokio::test]
async fn test_profile_rejects_non_session_token() {
    let t = test_app();
    let session = verified_session(&t, "purpose@example.com").await;
    let claims = JwtAuth::new(&JwtConfig::new(SECRET))
        .verify(&session, TokenPurpose::Session)
        .unwrap();
    let reset = t
        .service
        .issue(claims.user_id().unwrap(), TokenPurpose::PasswordReset)
        .unwrap();

    let response = t
        .app
        .clone()
        .oneshot(with_bearer("GET", "/profile", &reset, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_get_and_update_profile() {
    let t = test_app();
    let token = verified_session(&t, "profile@example.com").await;

    let response = t
        .app
        .clone()
        .oneshot(with_bearer("GET", "/profile", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response.into_body()).await["email"], "profile@example.com");

    let response = t
        .app
        .clone()
        .oneshot(with_bearer(
            "PUT",
            "/profile",
            &token,
            Some(json!({ "name": "Renamed" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response.into_body()).await["name"], "Renamed");
}

#[tokio::test]
async fn test_update_profile_wrong_old_password_returns_401() {
    let t = test_app();
    let token = verified_session(&t, "oldpw@example.com").await;

    let response = t
        .app
        .clone()
        .oneshot(with_bearer(
            "PUT",
            "/profile",
            &token,
            Some(json!({ "oldPassword": "nope-nope", "newPassword": "password456" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_update_profile_taken_email_returns_409() {
    let t = test_app();
    verified_session(&t, "taken@example.com").await;
    let token = verified_session(&t, "mover@example.com").await;

    let response = t
        .app
        .clone()
        .oneshot(with_bearer(
            "PUT",
            "/profile",
            &token,
            Some(json!({ "email": "taken@example.com" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_forgot_password_unknown_email_returns_404() {
    let t = test_app();

    let response = t
        .app
        .clone()
        .oneshot(post_json("/forgot-password", json!({ "email": "ghost@example.com" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reset_password_malformed_body_returns_json_400() {
    let t = test_app();
    let reset = t
        .service
        .issue(uuid::Uuid::now_v7(), TokenPurpose::PasswordReset)
        .unwrap();

    let response = t
        .app
        .clone()
        .oneshot(post_json(&format!("/reset-password/{}", reset), json!({ "password": 12345678 })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["error"], "INVALID_JSON");
}

#[tokio::test]
async fn test_verify_token_and_list_users() {
    let t = test_app();
    let token = verified_session(&t, "lister@example.com").await;
    verified_session(&t, "other@example.com").await;

    let response = t
        .app
        .clone()
        .oneshot(with_bearer("GET", "/verify-token", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["valid"], true);
    assert_eq!(body["user"]["email"], "lister@example.com");

    let response = t
        .app
        .clone()
        .oneshot(with_bearer("GET", "/all", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response.into_body()).await.as_array().unwrap().len(), 2);
}
