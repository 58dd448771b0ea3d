//! End-to-end tests driving the router over in-memory state: no network,
//! no database, real handlers and middleware wiring.

use anyhow::{anyhow, Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use regex::Regex;
use secrecy::SecretString;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tower::ServiceExt;
use uuid::Uuid;

use helpdesk::api::{router, AppConfig, AppState};
use helpdesk::auth::{AuthFlow, PasswordHasher, TokenIssuer};
use helpdesk::domain::{Role, User};
use helpdesk::email::{EmailMessage, Mailer};
use helpdesk::store::MemoryStore;

struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
    inbox: UnboundedReceiver<EmailMessage>,
}

fn test_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let config = AppConfig::new(SecretString::from("test-secret".to_string()));
    let tokens = TokenIssuer::new(config.jwt_secret(), config.token_ttl_seconds());
    let (mailer, inbox) = Mailer::channel();
    let auth = AuthFlow::new(store.clone(), tokens.clone(), mailer);

    let state = Arc::new(AppState {
        config,
        auth,
        tickets: store.clone(),
        tokens,
        health: store.clone(),
    });

    TestApp {
        router: router(state),
        store,
        inbox,
    }
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap_or_default()
}

async fn send(router: &Router, req: Request<Body>) -> Result<(StatusCode, Value)> {
    let response = router.clone().oneshot(req).await.map_err(|err| anyhow!("{err}"))?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, body))
}

async fn register(router: &Router, name: &str, email: &str, password: &str) -> Result<Value> {
    let (status, body) = send(
        router,
        request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "name": name, "email": email, "password": password })),
        ),
    )
    .await?;
    if status != StatusCode::CREATED {
        return Err(anyhow!("register returned {status}: {body}"));
    }
    Ok(body)
}

async fn login(router: &Router, email: &str, password: &str) -> Result<(StatusCode, Value)> {
    send(
        router,
        request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        ),
    )
    .await
}

fn token_of(body: &Value) -> Result<String> {
    body["token"]
        .as_str()
        .map(str::to_string)
        .context("login body carries a token")
}

/// Seed an admin directly in the store; there is no registration path
/// that grants the ADMIN role.
async fn seed_admin(store: &MemoryStore, email: &str, password: &str) -> Result<Uuid> {
    let id = Uuid::new_v4();
    store
        .seed_user(User {
            id,
            name: "Root".to_string(),
            email: email.to_string(),
            role: Role::Admin,
            password_hash: PasswordHasher::new().hash(password)?,
            reset_otp_hash: None,
            reset_otp_expires_at: None,
            created_at: chrono::Utc::now(),
        })
        .await;
    Ok(id)
}

#[tokio::test]
async fn health_reports_ok_with_app_header() -> Result<()> {
    let app = test_app();
    let response = app
        .router
        .clone()
        .oneshot(request(Method::GET, "/health", None, None))
        .await
        .map_err(|err| anyhow!("{err}"))?;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("X-App"));
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let body: Value = serde_json::from_slice(&bytes)?;
    assert_eq!(body["database"], "ok");
    Ok(())
}

#[tokio::test]
async fn full_password_reset_journey() -> Result<()> {
    let mut app = test_app();
    let router = &app.router;

    let body = register(router, "Alice", "a@x.com", "p1").await?;
    assert_eq!(body["user"]["role"], "USER");
    let _welcome = app.inbox.recv().await.context("welcome mail")?;

    let (status, body) = login(router, "a@x.com", "p1").await?;
    assert_eq!(status, StatusCode::OK);
    token_of(&body)?;

    let (status, _body) = send(
        router,
        request(
            Method::POST,
            "/api/auth/forgot-password",
            None,
            Some(json!({ "email": "a@x.com" })),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    let mail = app.inbox.recv().await.context("otp mail")?;
    assert_eq!(mail.to, "a@x.com");
    let otp = Regex::new(r"\d{6}")?
        .find(&mail.text)
        .context("otp in mail body")?
        .as_str()
        .to_string();

    let (status, _body) = send(
        router,
        request(
            Method::POST,
            "/api/auth/reset-password",
            None,
            Some(json!({ "email": "a@x.com", "otp": otp, "newPassword": "p2" })),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _body) = login(router, "a@x.com", "p1").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _body) = login(router, "a@x.com", "p2").await?;
    assert_eq!(status, StatusCode::OK);

    // The consumed OTP is gone.
    let (status, body) = send(
        router,
        request(
            Method::POST,
            "/api/auth/reset-password",
            None,
            Some(json!({ "email": "a@x.com", "otp": "000000", "newPassword": "p3" })),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid or expired OTP");
    Ok(())
}

#[tokio::test]
async fn auth_error_statuses() -> Result<()> {
    let app = test_app();
    let router = &app.router;
    register(router, "Alice", "a@x.com", "p1").await?;

    // Duplicate registration, case-insensitive.
    let (status, body) = send(
        router,
        request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "name": "A", "email": "A@X.com", "password": "p9" })),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "User already exists");

    // Missing fields.
    let (status, _body) = send(
        router,
        request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "name": "", "email": "b@x.com", "password": "p" })),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Wrong password and unknown email are both 401.
    let (status, _body) = login(router, "a@x.com", "wrong").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _body) = login(router, "ghost@x.com", "p1").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Forgot password for an unknown account is 404.
    let (status, _body) = send(
        router,
        request(
            Method::POST,
            "/api/auth/forgot-password",
            None,
            Some(json!({ "email": "ghost@x.com" })),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Logout always acknowledges.
    let (status, body) = send(
        router,
        request(Method::POST, "/api/auth/logout", None, None),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logged out successfully");
    Ok(())
}

#[tokio::test]
async fn users_see_only_their_own_tickets() -> Result<()> {
    let app = test_app();
    let router = &app.router;

    register(router, "Alice", "a@x.com", "p1").await?;
    register(router, "Bob", "b@x.com", "p2").await?;
    let (_, body) = login(router, "a@x.com", "p1").await?;
    let alice_token = token_of(&body)?;
    let (_, body) = login(router, "b@x.com", "p2").await?;
    let bob_token = token_of(&body)?;

    let (status, body) = send(
        router,
        request(
            Method::POST,
            "/api/tickets",
            Some(&alice_token),
            Some(json!({ "title": "Printer on fire", "description": "It burns" })),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["ticket"]["status"], "OPEN");
    assert_eq!(body["ticket"]["assigned_to"], Value::Null);

    let (status, body) = send(
        router,
        request(Method::GET, "/api/tickets", Some(&alice_token), None),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tickets"].as_array().map(Vec::len), Some(1));

    let (status, body) = send(
        router,
        request(Method::GET, "/api/tickets", Some(&bob_token), None),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tickets"].as_array().map(Vec::len), Some(0));

    // No token at all.
    let (status, _body) = send(router, request(Method::GET, "/api/tickets", None, None)).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Missing fields on create.
    let (status, _body) = send(
        router,
        request(
            Method::POST,
            "/api/tickets",
            Some(&alice_token),
            Some(json!({ "title": " ", "description": "x" })),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn admin_triage_flow() -> Result<()> {
    let app = test_app();
    let router = &app.router;

    register(router, "Alice", "a@x.com", "p1").await?;
    let (_, body) = login(router, "a@x.com", "p1").await?;
    let user_token = token_of(&body)?;

    let admin_id = seed_admin(&app.store, "root@x.com", "admin-pass").await?;
    let (status, body) = login(router, "root@x.com", "admin-pass").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "ADMIN");
    let admin_token = token_of(&body)?;

    let (_, body) = send(
        router,
        request(
            Method::POST,
            "/api/tickets",
            Some(&user_token),
            Some(json!({ "title": "VPN down", "description": "Cannot connect" })),
        ),
    )
    .await?;
    let ticket_id = body["ticket"]["id"]
        .as_str()
        .context("ticket id")?
        .to_string();

    // Regular users are forbidden from the admin surface.
    let (status, _body) = send(
        router,
        request(Method::GET, "/api/admin/tickets", Some(&user_token), None),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _body) = send(
        router,
        request(Method::GET, "/api/admin/tickets", None, None),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        router,
        request(Method::GET, "/api/admin/tickets", Some(&admin_token), None),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tickets"].as_array().map(Vec::len), Some(1));

    let (status, body) = send(
        router,
        request(
            Method::PATCH,
            &format!("/api/admin/tickets/{ticket_id}/status"),
            Some(&admin_token),
            Some(json!({ "status": "IN_PROGRESS" })),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ticket"]["status"], "IN_PROGRESS");

    // Unknown status values are rejected, including the legacy COMPLETED.
    let (status, body) = send(
        router,
        request(
            Method::PATCH,
            &format!("/api/admin/tickets/{ticket_id}/status"),
            Some(&admin_token),
            Some(json!({ "status": "COMPLETED" })),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid status");

    let (status, body) = send(
        router,
        request(
            Method::PATCH,
            &format!("/api/admin/tickets/{ticket_id}/assign"),
            Some(&admin_token),
            Some(json!({ "assignedTo": admin_id })),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ticket"]["assigned_to"], json!(admin_id));

    // Unknown ticket is a 404.
    let missing = Uuid::new_v4();
    let (status, _body) = send(
        router,
        request(
            Method::PATCH,
            &format!("/api/admin/tickets/{missing}/status"),
            Some(&admin_token),
            Some(json!({ "status": "CLOSED" })),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}
