//! Proxy tests against a mock upstream: status/message passthrough,
//! per-resource fallback messages and per-request credential selection.

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::util::ServiceExt;

use parish::config::Config;
use parish::server::{build_state, router};

/// Bind the mock upstream on an ephemeral port and serve it in the
/// background for the lifetime of the test process.
async fn spawn_upstream(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn proxy_app(api_url: &str) -> (Router, TempDir) {
    let tmp = TempDir::new().unwrap();
    let config = Config {
        api_url: api_url.to_string(),
        jwt_secret: "test-secret".into(),
        port: 0,
        data_dir: tmp.path().to_str().unwrap().to_string(),
    };
    let state = build_state(&config).unwrap();
    (router(state), tmp)
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get_req(path: &str) -> Request<Body> {
    Request::builder().uri(path).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn upstream_failure_status_and_message_pass_through() {
    let upstream = Router::new().route(
        "/api/ministries",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "message": "down" }))) }),
    );
    let base = spawn_upstream(upstream).await;
    let (app, _tmp) = proxy_app(&base);

    let resp = app.oneshot(get_req("/api/ministries")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(resp).await, json!({ "message": "down" }));
}

#[tokio::test]
async fn upstream_failure_without_message_uses_the_resource_fallback() {
    let upstream = Router::new()
        .route("/api/ministries", get(|| async { StatusCode::NOT_FOUND }))
        .route("/api/people", post(|| async { StatusCode::INTERNAL_SERVER_ERROR }));
    let base = spawn_upstream(upstream).await;
    let (app, _tmp) = proxy_app(&base);

    let resp = app.clone().oneshot(get_req("/api/ministries")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["message"], "Erro ao listar ministérios");

    let req = Request::builder()
        .method("POST")
        .uri("/api/people")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "name": "Ana" }).to_string()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(resp).await["message"], "Erro ao criar pessoa");
}

#[tokio::test]
async fn unreachable_upstream_maps_to_500_with_fallback() {
    let (app, _tmp) = proxy_app("http://127.0.0.1:1");
    let resp = app.oneshot(get_req("/api/events")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(resp).await["message"], "Erro ao listar eventos");
}

#[tokio::test]
async fn successful_bodies_pass_through_verbatim() {
    let list = json!([
        { "id": 1, "date": "2025-03-15", "title": "Culto", "extra": { "nested": true } }
    ]);
    let reply = list.clone();
    let upstream = Router::new().route(
        "/api/events",
        get(move || async move { Json(reply) })
            .post(|Json(body): Json<Value>| async move { Json(json!({ "created": body })) }),
    );
    let base = spawn_upstream(upstream).await;
    let (app, _tmp) = proxy_app(&base);

    let resp = app.clone().oneshot(get_req("/api/events")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, list);

    let req = Request::builder()
        .method("POST")
        .uri("/api/events")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "title": "Ensaio", "date": "2025-04-01" }).to_string()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_json(resp).await,
        json!({ "created": { "title": "Ensaio", "date": "2025-04-01" } })
    );
}

#[tokio::test]
async fn authorization_header_is_forwarded_and_wins_over_the_session() {
    // The mock echoes whatever Authorization header it receives.
    let upstream = Router::new().route(
        "/api/ministries",
        get(|headers: HeaderMap| async move {
            let auth = headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string());
            Json(json!({ "auth": auth }))
        }),
    );
    let base = spawn_upstream(upstream).await;
    let (app, _tmp) = proxy_app(&base);

    // No credential at all: no Authorization header upstream.
    let resp = app.clone().oneshot(get_req("/api/ministries")).await.unwrap();
    assert_eq!(body_json(resp).await["auth"], Value::Null);

    // Session credential: the session's token is attached.
    let session_req = Request::builder()
        .method("POST")
        .uri("/session")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "token": "sess-tok" }).to_string()))
        .unwrap();
    let resp = app.clone().oneshot(session_req).await.unwrap();
    let cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();

    let req = Request::builder()
        .uri("/api/ministries")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(body_json(resp).await["auth"], "Bearer sess-tok");

    // An explicit Authorization header takes precedence over the session.
    let req = Request::builder()
        .uri("/api/ministries")
        .header(header::COOKIE, &cookie)
        .header(header::AUTHORIZATION, "Bearer caller-tok")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(body_json(resp).await["auth"], "Bearer caller-tok");
}

#[tokio::test]
async fn login_proxy_passes_credentials_and_relays_the_result() {
    let upstream = Router::new().route(
        "/api/auth/login",
        post(|Json(body): Json<Value>| async move {
            if body["username"] == "maria" && body["password"] == "segredo" {
                Json(json!({
                    "token": "upstream-token",
                    "user": { "id": 5, "username": "maria", "role": "leader" }
                }))
                .into_response()
            } else {
                (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Credenciais inválidas" })))
                    .into_response()
            }
        }),
    );
    let base = spawn_upstream(upstream).await;
    let (app, _tmp) = proxy_app(&base);

    let ok = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "username": "maria", "password": "segredo" }).to_string()))
        .unwrap();
    let resp = app.clone().oneshot(ok).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["token"], "upstream-token");
    assert_eq!(body["user"]["role"], "leader");

    let bad = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "username": "maria", "password": "x" }).to_string()))
        .unwrap();
    let resp = app.oneshot(bad).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["message"], "Credenciais inválidas");
}
