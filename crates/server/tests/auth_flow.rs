use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use configs::AppConfig;

async fn build_app() -> anyhow::Result<Router> {
    let mut cfg = AppConfig::default();
    cfg.auth.jwt_secret = "test-secret".into();
    let state = server::build_state(&cfg, "memory").await?;
    Ok(server::build_app(state))
}

async fn read_json(resp: axum::response::Response) -> anyhow::Result<Value> {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn login_request(email: &str, password: &str) -> anyhow::Result<Request<Body>> {
    Ok(Request::builder()
        .method("POST")
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&json!({"email": email, "password": password}))?))?)
}

#[tokio::test]
async fn health_is_public() -> anyhow::Result<()> {
    let app = build_app().await?;
    let resp = app.oneshot(Request::builder().uri("/health").body(Body::empty())?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(read_json(resp).await?, json!({"status": "ok"}));
    Ok(())
}

#[tokio::test]
async fn login_returns_token_and_sets_cookie() -> anyhow::Result<()> {
    let app = build_app().await?;
    let resp = app.oneshot(login_request("admin@tel-ran.com", "Admin12345")?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_default();
    assert!(cookie.starts_with("auth_token="), "cookie: {cookie}");
    let body = read_json(resp).await?;
    assert!(body["accessToken"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["user"], json!({"email": "admin@tel-ran.com", "role": "ADMIN"}));
    Ok(())
}

#[tokio::test]
async fn wrong_credentials_give_login_error() -> anyhow::Result<()> {
    let app = build_app().await?;
    let resp = app.clone().oneshot(login_request("admin@tel-ran.com", "wrong")?).await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = read_json(resp).await?;
    assert_eq!(body["error"]["name"], "LoginError");
    assert_eq!(body["error"]["status"], 400);

    let resp = app.oneshot(login_request("nobody@tel-ran.com", "Admin12345")?).await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn malformed_login_body_is_validation_error() -> anyhow::Result<()> {
    let app = build_app().await?;
    let req = Request::builder()
        .method("POST")
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))?;
    let resp = app.oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(resp).await?["error"]["name"], "ValidationError");
    Ok(())
}

#[tokio::test]
async fn protected_routes_need_a_valid_token() -> anyhow::Result<()> {
    let app = build_app().await?;

    let resp = app.clone().oneshot(Request::builder().uri("/employees").body(Body::empty())?).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(read_json(resp).await?["error"]["name"], "AuthenticationError");

    let req = Request::builder()
        .uri("/employees")
        .header(header::AUTHORIZATION, "Bearer not-a-jwt")
        .body(Body::empty())?;
    assert_eq!(app.clone().oneshot(req).await?.status(), StatusCode::UNAUTHORIZED);

    let req = Request::builder().uri("/employees").header(header::AUTHORIZATION, "Basic abc").body(Body::empty())?;
    assert_eq!(app.oneshot(req).await?.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn cookie_token_is_accepted() -> anyhow::Result<()> {
    let app = build_app().await?;
    let resp = app.clone().oneshot(login_request("user@tel-ran.com", "User12345")?).await?;
    let token = read_json(resp).await?["accessToken"].as_str().unwrap_or_default().to_string();

    let req = Request::builder()
        .uri("/employees")
        .header(header::COOKIE, format!("auth_token={token}"))
        .body(Body::empty())?;
    assert_eq!(app.oneshot(req).await?.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn user_role_cannot_write() -> anyhow::Result<()> {
    let app = build_app().await?;
    let resp = app.clone().oneshot(login_request("user@tel-ran.com", "User12345")?).await?;
    let token = read_json(resp).await?["accessToken"].as_str().unwrap_or_default().to_string();

    let req = Request::builder()
        .method("DELETE")
        .uri("/employees/any")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())?;
    let resp = app.oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(read_json(resp).await?["error"]["name"], "AuthorizationError");
    Ok(())
}

#[tokio::test]
async fn openapi_document_is_served() -> anyhow::Result<()> {
    let app = build_app().await?;
    let resp = app.oneshot(Request::builder().uri("/api-docs/openapi.json").body(Body::empty())?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let doc = read_json(resp).await?;
    assert!(doc["paths"]["/employees/{id}"].is_object());
    assert!(doc["paths"]["/login"].is_object());
    Ok(())
}
