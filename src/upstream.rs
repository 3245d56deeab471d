//! HTTP client for the upstream ministry API.
//!
//! One method per (resource, verb) pair. The bearer token is a
//! per-request value threaded into each call; the client itself is
//! immutable after construction, so concurrent requests cannot leak
//! one caller's credential onto another's request.
//!
//! Failures map to `AppError::Upstream`: the upstream status when there
//! is one (500 otherwise) and the upstream body's `message` when present
//! (a per-resource fallback otherwise). Success bodies pass through
//! verbatim. No retries, no caching.

use anyhow::{Context, Result};
use reqwest::{Method, Url};
use serde_json::Value;
use std::time::Duration;
use tracing::error;

use crate::error::{AppError, AppResult};

/// Fixed timeout for every upstream call.
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(5);

/// Pick the outgoing error message: upstream-provided when present, the
/// per-resource fallback otherwise.
fn error_message(body: &Value, fallback: &str) -> String {
    body.get("message")
        .and_then(|m| m.as_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| fallback.to_string())
}

#[derive(Clone)]
pub struct ApiClient {
    base: Url,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base: &str) -> Result<Self> {
        let base = Url::parse(base).context("invalid API base URL")?;
        let client = reqwest::Client::builder().timeout(UPSTREAM_TIMEOUT).build()?;
        Ok(Self { base, client })
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<&Value>,
        fallback: &str,
    ) -> AppResult<Value> {
        let url = self
            .base
            .join(path)
            .map_err(|e| AppError::internal(format!("bad upstream path {}: {}", path, e)))?;
        let mut req = self.client.request(method, url);
        if let Some(t) = token {
            req = req.bearer_auth(t);
        }
        if let Some(b) = body {
            req = req.json(b);
        }
        let resp = match req.send().await {
            Ok(r) => r,
            Err(e) => {
                error!("upstream {} unreachable: {}", path, e);
                return Err(AppError::upstream(500, fallback));
            }
        };
        let status = resp.status();
        let value: Value = resp.json().await.unwrap_or(Value::Null);
        if !status.is_success() {
            return Err(AppError::upstream(status.as_u16(), error_message(&value, fallback)));
        }
        Ok(value)
    }

    // Auth
    pub async fn login(&self, username: &str, password: &str) -> AppResult<Value> {
        let body = serde_json::json!({ "username": username, "password": password });
        self.request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(&body),
            "Erro no proxy de autenticação",
        )
        .await
    }

    // Ministries
    pub async fn list_ministries(&self, token: Option<&str>) -> AppResult<Value> {
        self.request(Method::GET, "/api/ministries", token, None, "Erro ao listar ministérios")
            .await
    }

    pub async fn create_ministry(&self, token: Option<&str>, data: &Value) -> AppResult<Value> {
        self.request(Method::POST, "/api/ministries", token, Some(data), "Erro ao criar ministério")
            .await
    }

    // People
    pub async fn list_people(&self, token: Option<&str>) -> AppResult<Value> {
        self.request(Method::GET, "/api/people", token, None, "Erro ao listar pessoas").await
    }

    pub async fn create_person(&self, token: Option<&str>, data: &Value) -> AppResult<Value> {
        self.request(Method::POST, "/api/people", token, Some(data), "Erro ao criar pessoa").await
    }

    // Events
    pub async fn list_events(&self, token: Option<&str>) -> AppResult<Value> {
        self.request(Method::GET, "/api/events", token, None, "Erro ao listar eventos").await
    }

    pub async fn create_event(&self, token: Option<&str>, data: &Value) -> AppResult<Value> {
        self.request(Method::POST, "/api/events", token, Some(data), "Erro ao criar evento").await
    }
}
