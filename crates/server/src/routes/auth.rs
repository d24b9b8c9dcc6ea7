use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use service::auth::{
    domain::{AuthSession, LoginInput},
    repository::InMemoryAccountRepository,
    AuthError, AuthService, Principal, Role,
};
use service::employees::{EmployeeRules, EmployeesFacade};
use tracing::{debug, warn};

use crate::errors::ApiError;

pub const AUTH_COOKIE: &str = "auth_token";
const BEARER_PREFIX: &str = "Bearer ";

/// Shared state injected into every handler.
#[derive(Clone)]
pub struct ServerState {
    pub employees: Arc<EmployeesFacade>,
    pub auth: Arc<AuthService<InMemoryAccountRepository>>,
    pub rules: Arc<EmployeeRules>,
}

#[utoipa::path(post, path = "/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged in", body = crate::openapi::LoginResponse), (status = 400, description = "Wrong credentials or malformed body")))]
pub async fn login(
    State(state): State<ServerState>,
    jar: CookieJar,
    payload: Result<Json<LoginInput>, JsonRejection>,
) -> Result<(CookieJar, Json<AuthSession>), ApiError> {
    let Json(input) = payload?;
    let session = state.auth.login(input).await?;

    let mut cookie = Cookie::new(AUTH_COOKIE, session.access_token.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(false);
    cookie.set_same_site(SameSite::Lax);
    Ok((jar.add(cookie), Json(session)))
}

/// Token from `Authorization: Bearer` first, then the `auth_token` cookie.
fn extract_token(req: &Request) -> Option<String> {
    if let Some(header) = req.headers().get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        return header
            .strip_prefix(BEARER_PREFIX)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
    }
    CookieJar::from_headers(req.headers())
        .get(AUTH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
}

/// Verify the caller's token and attach its [`Principal`] to the request.
pub async fn require_auth(State(state): State<ServerState>, mut req: Request, next: Next) -> Result<Response, ApiError> {
    let Some(token) = extract_token(&req) else {
        warn!(path = %req.uri().path(), "missing or malformed Authorization header");
        return Err(AuthError::Authentication.into());
    };
    let principal = state.auth.verify(&token)?;
    debug!(username = %principal.username, role = %principal.role, "authenticated");
    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

fn guard(state: &ServerState, req: &Request, allowed: &[Role]) -> Result<(), ApiError> {
    let principal = req.extensions().get::<Principal>().ok_or(AuthError::Authentication)?;
    state.auth.authorize(principal, allowed)?;
    Ok(())
}

/// USER or ADMIN.
pub async fn require_any_role(State(state): State<ServerState>, req: Request, next: Next) -> Result<Response, ApiError> {
    guard(&state, &req, &[Role::User, Role::Admin])?;
    Ok(next.run(req).await)
}

/// ADMIN only.
pub async fn require_admin(State(state): State<ServerState>, req: Request, next: Next) -> Result<Response, ApiError> {
    guard(&state, &req, &[Role::Admin])?;
    Ok(next.run(req).await)
}
