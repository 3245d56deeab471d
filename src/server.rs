//!
//! parish HTTP server
//! ------------------
//! Axum front end for the ministry system.
//!
//! Responsibilities:
//! - Session management with a cookie id resolved against the in-memory
//!   session store; the guard re-verifies the session's token per request.
//! - Two login entry points: the server-rendered form (local registry +
//!   token signing) and the client bridge (`/api/auth/login` + `/session`).
//! - Same-origin `/api/*` proxy to the upstream ministry API with a
//!   per-request bearer credential.
//! - Server-rendered pages, including the month calendar on the home page.

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::auth::{AuthService, TokenKeys};
use crate::calendar::{month_grid, MonthRef};
use crate::config::Config;
use crate::error::{AppError, SessionReason};
use crate::security::{self, AuthUser};
use crate::session::SessionManager;
use crate::upstream::ApiClient;
use crate::views;

const SESSION_COOKIE: &str = "parish_session";

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub api: ApiClient,
    pub sessions: SessionManager,
    pub auth: AuthService,
}

/// Build the state from configuration. Registry seeding stays in `run` so
/// tests can provision their own users.
pub fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let api = ApiClient::new(&config.api_url)?;
    let keys = TokenKeys::new(&config.jwt_secret);
    let auth = AuthService::new(config.data_dir.clone(), keys);
    Ok(AppState { api, sessions: SessionManager::default(), auth })
}

pub fn router(state: AppState) -> Router {
    Router::new()
        // JSON proxy to the upstream API
        .route("/api/auth/login", post(proxy_login))
        .route("/api/ministries", get(proxy_list_ministries).post(proxy_create_ministry))
        .route("/api/people", get(proxy_list_people).post(proxy_create_person))
        .route("/api/events", get(proxy_list_events).post(proxy_create_event))
        // Auth bridge and server-rendered login
        .route("/session", post(set_session))
        .route("/login", get(login_form).post(login_submit))
        .route("/logout", get(logout))
        // Pages
        .route("/", get(home))
        .route("/ministerios", get(ministries))
        .route("/pessoas", get(people))
        .route("/eventos", get(events))
        .with_state(state)
}

/// Start the server bound to the configured port.
pub async fn run(config: Config) -> anyhow::Result<()> {
    use anyhow::Context;
    security::ensure_default_admin(&config.data_dir)
        .with_context(|| format!("while seeding user registry under {}", config.data_dir))?;
    let state = build_state(&config)?;
    let app = router(state);
    let addr = config.socket_addr();
    info!("Starting server on {} (upstream {})", addr, config.api_url);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

// --- cookies ---------------------------------------------------------------

fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie = headers.get(header::COOKIE)?;
    let s = cookie.to_str().ok()?;
    for part in s.split(';') {
        let p = part.trim();
        if let Some(eq) = p.find('=') {
            let (k, v) = p.split_at(eq);
            if k == name {
                return Some(v[1..].to_string());
            }
        }
    }
    None
}

fn session_cookie(sid: &str) -> HeaderValue {
    HeaderValue::from_str(&format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age=86400",
        SESSION_COOKIE, sid
    ))
    .unwrap_or_else(|_| HeaderValue::from_static(""))
}

fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_str(&format!(
        "{}=deleted; Expires=Thu, 01 Jan 1970 00:00:00 GMT; HttpOnly; SameSite=Lax; Path=/; Max-Age=0",
        SESSION_COOKIE
    ))
    .unwrap_or_else(|_| HeaderValue::from_static(""))
}

// --- session guard ----------------------------------------------------------

/// Resolve the request's identity from its session. Verification failure
/// destroys the session (implicit logout); the tagged reason is for the
/// caller's log line only, every failure renders as the same redirect.
async fn authorize(state: &AppState, headers: &HeaderMap) -> Result<AuthUser, SessionReason> {
    let Some(sid) = parse_cookie(headers, SESSION_COOKIE) else {
        return Err(SessionReason::Absent);
    };
    let Some(session) = state.sessions.get(&sid).await else {
        return Err(SessionReason::Absent);
    };
    match state.auth.keys().verify(&session.token) {
        Ok(claims) => Ok(claims.user()),
        Err(reason) => {
            state.sessions.destroy(&sid).await;
            Err(reason)
        }
    }
}

fn guard_redirect(path: &str, reason: SessionReason) -> Response {
    warn!("guard {}: session {}, redirecting to /login", path, reason.as_str());
    Redirect::to("/login").into_response()
}

// --- JSON proxy --------------------------------------------------------------

/// Bearer credential for one outgoing upstream call: the incoming
/// Authorization header wins, then the caller's session token.
async fn request_token(state: &AppState, headers: &HeaderMap) -> Option<String> {
    let from_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer ").map(|s| s.to_string()));
    if from_header.is_some() {
        return from_header;
    }
    let sid = parse_cookie(headers, SESSION_COOKIE)?;
    state.sessions.get(&sid).await.map(|s| s.token)
}

fn upstream_reply(route: &str, err: AppError) -> Response {
    error!("proxy {} error: {}", route, err);
    err.into_response()
}

#[derive(Debug, Deserialize)]
struct LoginPayload {
    username: String,
    password: String,
}

async fn proxy_login(State(state): State<AppState>, Json(payload): Json<LoginPayload>) -> Response {
    match state.api.login(&payload.username, &payload.password).await {
        Ok(v) => (StatusCode::OK, Json(v)).into_response(),
        Err(e) => upstream_reply("/auth/login", e),
    }
}

async fn proxy_list_ministries(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let token = request_token(&state, &headers).await;
    match state.api.list_ministries(token.as_deref()).await {
        Ok(v) => (StatusCode::OK, Json(v)).into_response(),
        Err(e) => upstream_reply("/ministries", e),
    }
}

async fn proxy_create_ministry(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let token = request_token(&state, &headers).await;
    match state.api.create_ministry(token.as_deref(), &body).await {
        Ok(v) => (StatusCode::OK, Json(v)).into_response(),
        Err(e) => upstream_reply("POST /ministries", e),
    }
}

async fn proxy_list_people(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let token = request_token(&state, &headers).await;
    match state.api.list_people(token.as_deref()).await {
        Ok(v) => (StatusCode::OK, Json(v)).into_response(),
        Err(e) => upstream_reply("/people", e),
    }
}

async fn proxy_create_person(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let token = request_token(&state, &headers).await;
    match state.api.create_person(token.as_deref(), &body).await {
        Ok(v) => (StatusCode::OK, Json(v)).into_response(),
        Err(e) => upstream_reply("POST /people", e),
    }
}

async fn proxy_list_events(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let token = request_token(&state, &headers).await;
    match state.api.list_events(token.as_deref()).await {
        Ok(v) => (StatusCode::OK, Json(v)).into_response(),
        Err(e) => upstream_reply("/events", e),
    }
}

async fn proxy_create_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let token = request_token(&state, &headers).await;
    match state.api.create_event(token.as_deref(), &body).await {
        Ok(v) => (StatusCode::OK, Json(v)).into_response(),
        Err(e) => upstream_reply("POST /events", e),
    }
}

// --- auth bridge and form login ----------------------------------------------

/// `POST /session`: second half of the client-driven login bridge. The
/// token is required; the user payload is optional and falls back to a
/// placeholder identity, to be refined when the token is next verified.
async fn set_session(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    let token = body.get("token").and_then(|t| t.as_str()).filter(|t| !t.is_empty());
    let Some(token) = token else {
        return (StatusCode::BAD_REQUEST, Json(json!({ "message": "token required" })))
            .into_response();
    };
    let user = body
        .get("user")
        .cloned()
        .and_then(|u| serde_json::from_value::<AuthUser>(u).ok())
        .unwrap_or_else(AuthUser::unknown);
    let sid = state.sessions.issue(user, token.to_string()).await;
    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, session_cookie(&sid));
    (StatusCode::OK, headers, Json(json!({ "ok": true }))).into_response()
}

async fn login_form() -> Html<String> {
    Html(views::login_page(None))
}

#[derive(Debug, Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

/// Server-rendered login: verifies against the local registry, signs a
/// token and stores {user, token} in a fresh session. Independent of the
/// client bridge above.
async fn login_submit(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    match state.auth.login(&form.username, &form.password) {
        Ok(outcome) => {
            let sid = state.sessions.issue(outcome.user, outcome.token).await;
            let mut headers = HeaderMap::new();
            headers.insert(header::SET_COOKIE, session_cookie(&sid));
            (headers, Redirect::to("/")).into_response()
        }
        Err(e) => {
            error!("login error: {}", e);
            Html(views::login_page(Some(e.message()))).into_response()
        }
    }
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(sid) = parse_cookie(&headers, SESSION_COOKIE) {
        state.sessions.destroy(&sid).await;
    }
    let mut h = HeaderMap::new();
    h.insert(header::SET_COOKIE, clear_session_cookie());
    (h, Redirect::to("/login")).into_response()
}

// --- pages --------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CalendarQuery {
    year: Option<i32>,
    month: Option<u32>,
}

/// Unwrap an upstream list, degrading to empty on failure: a page render
/// never fails because the upstream is down.
fn list_or_empty(result: Result<Value, AppError>, what: &str) -> Vec<Value> {
    match result {
        Ok(v) => v.as_array().cloned().unwrap_or_default(),
        Err(e) => {
            warn!("could not fetch {}: {}", what, e);
            Vec::new()
        }
    }
}

async fn home(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CalendarQuery>,
) -> Response {
    let user = match authorize(&state, &headers).await {
        Ok(u) => u,
        Err(reason) => return guard_redirect("/", reason),
    };
    let token = request_token(&state, &headers).await;
    let events = list_or_empty(state.api.list_events(token.as_deref()).await, "events");
    let ministries = list_or_empty(state.api.list_ministries(token.as_deref()).await, "ministries");
    let people = list_or_empty(state.api.list_people(token.as_deref()).await, "people");

    let current = MonthRef::current();
    let month =
        MonthRef::of(query.year.unwrap_or(current.year), query.month.unwrap_or(current.month));
    let grid = month_grid(month, &events);
    Html(views::home_page(&user, month, &grid, &ministries, &people)).into_response()
}

async fn ministries(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let user = match authorize(&state, &headers).await {
        Ok(u) => u,
        Err(reason) => return guard_redirect("/ministerios", reason),
    };
    let token = request_token(&state, &headers).await;
    let list = list_or_empty(state.api.list_ministries(token.as_deref()).await, "ministries");
    Html(views::ministries_page(&user, &list)).into_response()
}

/// Unguarded shell; the list is populated client-side with the browser's
/// stored API token.
async fn people() -> Html<String> {
    Html(views::people_page())
}

async fn events(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let user = match authorize(&state, &headers).await {
        Ok(u) => u,
        Err(reason) => return guard_redirect("/eventos", reason),
    };
    let token = request_token(&state, &headers).await;
    let events = list_or_empty(state.api.list_events(token.as_deref()).await, "events");
    let people = list_or_empty(state.api.list_people(token.as_deref()).await, "people");
    Html(views::events_page(&user, &events, &people)).into_response()
}
