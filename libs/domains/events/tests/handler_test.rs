//! Handler tests for the events domain
//!
//! Runs `handlers::router` behind the session middleware, with users
//! resolved from an in-memory user service.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::middleware::from_fn_with_state;
use axum_helpers::{AuthState, JwtAuth, JwtConfig, TokenPurpose, authenticate};
use chrono::{Duration, Utc};
use domain_events::*;
use domain_users::{InMemoryUserRepository, Role, User, UserRepository, UserService};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt; // For oneshot()

const SECRET: &str = "events-handler-test-secret-32-characters";

struct TestApp {
    app: Router,
    users: UserService<InMemoryUserRepository>,
    user_repo: InMemoryUserRepository,
}

fn test_app() -> TestApp {
    let jwt = JwtAuth::new(&JwtConfig::new(SECRET));
    let user_repo = InMemoryUserRepository::new();
    let users = UserService::new(user_repo.clone(), jwt.clone());

    let events = EventService::new(InMemoryEventRepository::new())
        .with_user_directory(Arc::new(users.clone()));
    let auth = AuthState::new(jwt, Arc::new(users.clone()));

    let app = handlers::router(events).layer(from_fn_with_state(auth, authenticate));

    TestApp {
        app,
        users,
        user_repo,
    }
}

/// Store a verified user directly and return a session token for them
async fn session(t: &TestApp, name: &str, role: Role) -> String {
    let mut user = User::new(
        name.to_string(),
        format!("{}@example.com", name.to_lowercase()),
        "unused-hash".to_string(),
    );
    user.role = role;
    user.email_verified = true;
    let user = t.user_repo.create(user).await.unwrap();
    t.users.issue(user.id, TokenPurpose::Session).unwrap()
}

async fn json_body(body: Body) -> Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn event_body(title: &str, days_ahead: i64) -> Value {
    json!({
        "title": title,
        "description": "A gathering",
        "location": "Lisbon",
        "date": (Utc::now() + Duration::days(days_ahead)).to_rfc3339(),
    })
}

async fn create(t: &TestApp, token: &str, title: &str, days_ahead: i64) -> Value {
    let response = t
        .app
        .clone()
        .oneshot(request("POST", "/", Some(token), Some(event_body(title, days_ahead))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response.into_body()).await
}

#[tokio::test]
async fn test_create_requires_session() {
    let t = test_app();

    let response = t
        .app
        .clone()
        .oneshot(request("POST", "/", None, Some(event_body("Anon", 3))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_returns_pending_event_with_owner() {
    let t = test_app();
    let token = session(&t, "Olga", Role::User).await;

    let event = create(&t, &token, "Book club", 5).await;

    assert_eq!(event["status"], "pending");
    assert_eq!(event["title"], "Book club");
    assert_eq!(event["owner"]["name"], "Olga");
    assert!(event.get("hasJoined").is_none());
}

#[tokio::test]
async fn test_create_validates_body() {
    let t = test_app();
    let token = session(&t, "Vera", Role::User).await;

    let response = t
        .app
        .clone()
        .oneshot(request(
            "POST",
            "/",
            Some(&token),
            Some(json!({ "title": "", "description": "x", "location": "y", "date": Utc::now() })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_is_public_and_paginated() {
    let t = test_app();
    let token = session(&t, "Pavel", Role::User).await;
    for i in 0..7 {
        create(&t, &token, &format!("Talk {}", i), i + 1).await;
    }

    let response = t
        .app
        .clone()
        .oneshot(request("GET", "/?page=2&limit=5", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response.into_body()).await;
    assert_eq!(body["total"], 7);
    assert_eq!(body["page"], 2);
    assert_eq!(body["pageSize"], 5);
    assert_eq!(body["totalPages"], 2);
    assert_eq!(body["events"].as_array().unwrap().len(), 2);
    assert_eq!(body["events"][0]["title"], "Talk 5");
}

#[tokio::test]
async fn test_list_rejects_unparsable_page_with_json_error() {
    let t = test_app();

    let response = t
        .app
        .clone()
        .oneshot(request("GET", "/?page=abc", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response.into_body()).await;
    assert_eq!(body["error"], "INVALID_QUERY");
    assert!(body["message"].as_str().unwrap().contains("page"));
}

#[tokio::test]
async fn test_list_with_huge_page_is_empty_not_an_error() {
    let t = test_app();
    let token = session(&t, "Quinn", Role::User).await;
    create(&t, &token, "Only", 2).await;

    let response = t
        .app
        .clone()
        .oneshot(request("GET", &format!("/?page={}", u64::MAX), None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response.into_body()).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["page"], MAX_PAGE);
    assert!(body["events"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_pending_rejects_unparsable_limit() {
    let t = test_app();
    let admin = session(&t, "Root", Role::Admin).await;

    let response = t
        .app
        .clone()
        .oneshot(request("GET", "/pending?limit=ten", Some(&admin), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response.into_body()).await["error"], "INVALID_QUERY");
}

#[tokio::test]
async fn test_list_filters_by_search() {
    let t = test_app();
    let token = session(&t, "Nina", Role::User).await;
    create(&t, &token, "Rust Meetup", 2).await;
    create(&t, &token, "Chess night", 3).await;

    let response = t
        .app
        .clone()
        .oneshot(request("GET", "/?search=rust", None, None))
        .await
        .unwrap();

    let body = json_body(response.into_body()).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["events"][0]["title"], "Rust Meetup");
}

#[tokio::test]
async fn test_get_malformed_id_is_400_and_missing_is_404() {
    let t = test_app();

    let response = t
        .app
        .clone()
        .oneshot(request("GET", "/not-a-uuid", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = t
        .app
        .clone()
        .oneshot(request("GET", &format!("/{}", uuid::Uuid::now_v7()), None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["message"], "Event not found");
}

#[tokio::test]
async fn test_only_owner_or_admin_may_update() {
    let t = test_app();
    let owner = session(&t, "Owner", Role::User).await;
    let stranger = session(&t, "Stranger", Role::User).await;
    let admin = session(&t, "Admin", Role::Admin).await;
    let event = create(&t, &owner, "Picnic", 4).await;
    let uri = format!("/{}", event["id"].as_str().unwrap());

    let response = t
        .app
        .clone()
        .oneshot(request("PUT", &uri, Some(&stranger), Some(json!({ "title": "Hijacked" }))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["message"], "Not authorized to update this event");

    let response = t
        .app
        .clone()
        .oneshot(request("PUT", &uri, Some(&admin), Some(json!({ "title": "Picnic 2" }))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["title"], "Picnic 2");

    let response = t
        .app
        .clone()
        .oneshot(request("DELETE", &uri, Some(&owner), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["message"], "Event deleted successfully");
}

#[tokio::test]
async fn test_admin_routes_reject_regular_users() {
    let t = test_app();
    let user = session(&t, "Regular", Role::User).await;
    let event = create(&t, &user, "Hackathon", 10).await;
    let id = event["id"].as_str().unwrap();

    let response = t
        .app
        .clone()
        .oneshot(request("GET", "/pending", Some(&user), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["message"], "Access denied. Admins only.");

    let response = t
        .app
        .clone()
        .oneshot(request(
            "PUT",
            &format!("/{}/approve", id),
            Some(&user),
            Some(json!({ "status": "approved" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_approval_flow() {
    let t = test_app();
    let user = session(&t, "Host", Role::User).await;
    let admin = session(&t, "Boss", Role::Admin).await;
    let event = create(&t, &user, "Concert", 6).await;
    let approve_uri = format!("/{}/approve", event["id"].as_str().unwrap());

    let response = t
        .app
        .clone()
        .oneshot(request("GET", "/pending", Some(&admin), None))
        .await
        .unwrap();
    let body = json_body(response.into_body()).await;
    assert_eq!(body["total"], 1);

    let response = t
        .app
        .clone()
        .oneshot(request("PUT", &approve_uri, Some(&admin), Some(json!({ "status": "maybe" }))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["message"], "Invalid status. Use 'approved' or 'rejected'");

    let response = t
        .app
        .clone()
        .oneshot(request("PUT", &approve_uri, Some(&admin), Some(json!({ "status": "approved" }))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["message"], "Event approved");

    let response = t
        .app
        .clone()
        .oneshot(request("PUT", &approve_uri, Some(&admin), Some(json!({ "status": "rejected" }))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["message"], "Event is already approved");

    let response = t
        .app
        .clone()
        .oneshot(request("GET", "/pending", Some(&admin), None))
        .await
        .unwrap();
    let body = json_body(response.into_body()).await;
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn test_approve_without_status_is_bad_request() {
    let t = test_app();
    let user = session(&t, "Host", Role::User).await;
    let admin = session(&t, "Boss", Role::Admin).await;
    let event = create(&t, &user, "Recital", 4).await;
    let approve_uri = format!("/{}/approve", event["id"].as_str().unwrap());

    let response = t
        .app
        .clone()
        .oneshot(request("PUT", &approve_uri, Some(&admin), Some(json!({}))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["message"], "Invalid status. Use 'approved' or 'rejected'");

    let response = t
        .app
        .clone()
        .oneshot(request("PUT", &approve_uri, Some(&admin), Some(json!({ "status": 7 }))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response.into_body()).await["error"], "INVALID_JSON");
}

#[tokio::test]
async fn test_admin_edit_and_delete() {
    let t = test_app();
    let user = session(&t, "Maker", Role::User).await;
    let admin = session(&t, "Root", Role::Admin).await;
    let event = create(&t, &user, "Workshop", 8).await;
    let id = event["id"].as_str().unwrap();

    let response = t
        .app
        .clone()
        .oneshot(request(
            "PUT",
            &format!("/{}/admin-edit", id),
            Some(&admin),
            Some(json!({ "location": "Porto" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["location"], "Porto");

    let response = t
        .app
        .clone()
        .oneshot(request("DELETE", &format!("/{}/admin-delete", id), Some(&admin), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = t
        .app
        .clone()
        .oneshot(request("GET", &format!("/{}", id), None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_my_events_lists_only_callers_events() {
    let t = test_app();
    let mine = session(&t, "Mine", Role::User).await;
    let theirs = session(&t, "Theirs", Role::User).await;
    create(&t, &mine, "My party", 2).await;
    create(&t, &theirs, "Their party", 3).await;

    let response = t
        .app
        .clone()
        .oneshot(request("GET", "/my-events", Some(&mine), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response.into_body()).await;
    let events = body.as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["title"], "My party");
}
