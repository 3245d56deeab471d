//! Login service for the server-rendered form: verifies credentials
//! against the local registry and issues a signed token.

use tracing::info;

use crate::error::{AppError, AppResult};
use crate::security::{self, AuthUser};

use super::token::{Claims, TokenKeys, TOKEN_TTL_SECS};

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub user: AuthUser,
}

#[derive(Clone)]
pub struct AuthService {
    data_dir: String,
    keys: TokenKeys,
}

impl AuthService {
    pub fn new(data_dir: String, keys: TokenKeys) -> Self {
        Self { data_dir, keys }
    }

    /// Exchange credentials for a token and the matching user identity.
    /// Wrong username and wrong password produce the same error.
    pub fn login(&self, username: &str, password: &str) -> AppResult<LoginOutcome> {
        let user = security::authenticate(&self.data_dir, username, password)
            .map_err(|e| AppError::internal(e.to_string()))?
            .ok_or_else(|| AppError::auth("Credenciais inválidas"))?;
        let token = self.keys.sign(&Claims::for_user(&user, TOKEN_TTL_SECS))?;
        info!(user = %user.username, "login ok");
        Ok(LoginOutcome { token, user })
    }

    pub fn keys(&self) -> &TokenKeys {
        &self.keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn login_returns_token_matching_registry_user() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().to_str().unwrap().to_string();
        security::add_user(&root, "pedro", "senha", "member").unwrap();

        let svc = AuthService::new(root, TokenKeys::new("s3cret"));
        let out = svc.login("pedro", "senha").unwrap();
        let claims = svc.keys().verify(&out.token).unwrap();
        assert_eq!(claims.id, out.user.id);
        assert_eq!(claims.username, "pedro");
        assert_eq!(claims.role, "member");
    }

    #[test]
    fn invalid_credentials_issue_no_token() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().to_str().unwrap().to_string();
        security::add_user(&root, "pedro", "senha", "member").unwrap();

        let svc = AuthService::new(root, TokenKeys::new("s3cret"));
        let err = svc.login("pedro", "errada").unwrap_err();
        assert_eq!(err.to_string(), "Credenciais inválidas");
        let err = svc.login("ninguem", "senha").unwrap_err();
        assert_eq!(err.to_string(), "Credenciais inválidas");
    }
}
