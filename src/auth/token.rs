//! Signed bearer tokens: HS256 JWTs carrying the user identity and a
//! 24-hour expiry, enforced at decode time.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, SessionReason};
use crate::security::AuthUser;

/// Token lifetime embedded in the `exp` claim.
pub const TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Claims carried by every token this server signs or accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    pub username: String,
    pub role: String,
    /// Expiry, Unix timestamp in seconds.
    pub exp: i64,
}

impl Claims {
    pub fn for_user(user: &AuthUser, ttl_secs: i64) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role.clone(),
            exp: chrono::Utc::now().timestamp() + ttl_secs,
        }
    }

    pub fn user(&self) -> AuthUser {
        AuthUser { id: self.id, username: self.username.clone(), role: self.role.clone() }
    }
}

/// Prepared signing and verification keys over the shared secret.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenKeys {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AppError::internal(format!("falha ao assinar token: {}", e)))
    }

    /// Decode and verify a token, tagging the failure cause. Expiry is
    /// checked by the decoder against the embedded `exp` claim.
    pub fn verify(&self, token: &str) -> Result<Claims, SessionReason> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => SessionReason::Expired,
                _ => SessionReason::Malformed,
            })
    }
}

impl std::fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenKeys").finish_non_exhaustive()
    }
}
