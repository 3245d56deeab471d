//! Server-side sessions keyed by a browser cookie.
//!
//! A session is created on a successful form login or an explicit bridge
//! call (`POST /session`), holds the user identity plus the bearer token,
//! and expires after a fixed TTL. Expired entries are dropped on lookup.
//! Holding a token only proves it was valid when the session was created;
//! the guard re-verifies it on every protected request.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use base64::Engine;
use tokio::sync::RwLock;
use tracing::debug;

use crate::security::AuthUser;

/// Session lifetime; mirrors the 24-hour token lifetime.
pub const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone)]
pub struct SessionData {
    pub user: AuthUser,
    pub token: String,
    pub expires_at: Instant,
}

fn gen_id() -> String {
    // 256-bit random id, base64url without padding
    let mut buf = [0u8; 32];
    let _ = getrandom::getrandom(&mut buf);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf)
}

#[derive(Clone)]
pub struct SessionManager {
    ttl: Duration,
    inner: Arc<RwLock<HashMap<String, SessionData>>>,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(SESSION_TTL)
    }
}

impl SessionManager {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, inner: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Create a session and return its cookie id.
    pub async fn issue(&self, user: AuthUser, token: String) -> String {
        let sid = gen_id();
        let data = SessionData { user, token, expires_at: Instant::now() + self.ttl };
        let mut map = self.inner.write().await;
        map.insert(sid.clone(), data);
        debug!(sid = %sid, "session issued");
        sid
    }

    /// Look up a live session. An expired entry is removed and reported
    /// as absent.
    pub async fn get(&self, sid: &str) -> Option<SessionData> {
        let now = Instant::now();
        let expired = {
            let map = self.inner.read().await;
            match map.get(sid) {
                Some(data) if data.expires_at > now => return Some(data.clone()),
                Some(_) => true,
                None => false,
            }
        };
        if expired {
            self.inner.write().await.remove(sid);
        }
        None
    }

    /// Destroy a session. Destroying an unknown or already-destroyed id
    /// is a no-op, so logout and guard teardown stay idempotent.
    pub async fn destroy(&self, sid: &str) -> bool {
        self.inner.write().await.remove(sid).is_some()
    }
}
