//! Process configuration, loaded once at startup from the environment.

use std::net::SocketAddr;

/// Runtime configuration for the front end.
///
/// Every field has a development default so the server starts with no
/// environment at all; production deployments set `API_URL` and
/// `JWT_SECRET` at minimum.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the upstream ministry API (`API_URL`).
    pub api_url: String,
    /// Shared secret for signing and verifying bearer tokens (`JWT_SECRET`).
    pub jwt_secret: String,
    /// HTTP listening port (`PORT`).
    pub port: u16,
    /// Directory holding the local user registry (`PARISH_DATA_DIR`).
    pub data_dir: String,
}

impl Config {
    pub fn from_env() -> Self {
        let api_url =
            std::env::var("API_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
        let jwt_secret =
            std::env::var("JWT_SECRET").unwrap_or_else(|_| "your-secret-key".to_string());
        let port = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(4000);
        let data_dir =
            std::env::var("PARISH_DATA_DIR").unwrap_or_else(|_| "data".to_string());
        Self { api_url, jwt_secret, port, data_dir }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        // Fields default independently of each other.
        let cfg = Config {
            api_url: "http://localhost:3000".into(),
            jwt_secret: "your-secret-key".into(),
            port: 4000,
            data_dir: "data".into(),
        };
        assert_eq!(cfg.socket_addr().port(), 4000);
    }
}
