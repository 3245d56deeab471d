//! Local user registry backing the server-rendered login form.
//!
//! Users live in a single `users.json` file under the configured data
//! directory. Passwords are stored as Argon2 PHC strings; authentication
//! returns the public identity (id, username, role) and never the hash.

use anyhow::{anyhow, Result};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Public identity of a registry user; what goes into tokens and sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub role: String,
}

impl AuthUser {
    /// Placeholder identity for sessions established through the bridge
    /// without user info in the payload.
    pub fn unknown() -> Self {
        Self { id: 0, username: "unknown".to_string(), role: String::new() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserRecord {
    id: i64,
    username: String,
    password_hash: String,
    role: String,
}

fn registry_path(data_dir: &str) -> PathBuf {
    Path::new(data_dir).join("users.json")
}

fn hash_password(password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let argon2 = Argon2::default();
    let phc = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!(e.to_string()))?
        .to_string();
    Ok(phc)
}

fn verify_password(hash: &str, password: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(hash) {
        let argon2 = Argon2::default();
        argon2.verify_password(password.as_bytes(), &parsed).is_ok()
    } else {
        false
    }
}

fn read_users(path: &Path) -> Result<Vec<UserRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw = std::fs::read_to_string(path)?;
    let users: Vec<UserRecord> = serde_json::from_str(&raw)?;
    Ok(users)
}

fn write_users(path: &Path, users: &[UserRecord]) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let raw = serde_json::to_string_pretty(users)?;
    std::fs::write(path, raw)?;
    Ok(())
}

/// Seed the registry with an `admin`/`admin` administrator on first start.
/// A registry file that already exists is left untouched.
pub fn ensure_default_admin(data_dir: &str) -> Result<()> {
    let p = registry_path(data_dir);
    if p.exists() {
        return Ok(());
    }
    let admin = UserRecord {
        id: 1,
        username: "admin".to_string(),
        password_hash: hash_password("admin")?,
        role: "admin".to_string(),
    };
    write_users(&p, &[admin])
}

/// Insert or replace a user. The id of a replaced user is kept; a new user
/// gets the next free id.
pub fn add_user(data_dir: &str, username: &str, password: &str, role: &str) -> Result<()> {
    let p = registry_path(data_dir);
    let mut users = read_users(&p)?;
    let id = users
        .iter()
        .find(|u| u.username == username)
        .map(|u| u.id)
        .unwrap_or_else(|| users.iter().map(|u| u.id).max().unwrap_or(0) + 1);
    users.retain(|u| u.username != username);
    users.push(UserRecord {
        id,
        username: username.to_string(),
        password_hash: hash_password(password)?,
        role: role.to_string(),
    });
    write_users(&p, &users)
}

/// Verify credentials against the registry. `Ok(None)` means unknown user
/// or wrong password; the two are deliberately indistinguishable.
pub fn authenticate(data_dir: &str, username: &str, password: &str) -> Result<Option<AuthUser>> {
    let users = read_users(&registry_path(data_dir))?;
    for u in &users {
        if u.username == username {
            if verify_password(&u.password_hash, password) {
                return Ok(Some(AuthUser {
                    id: u.id,
                    username: u.username.clone(),
                    role: u.role.clone(),
                }));
            }
            return Ok(None);
        }
    }
    Ok(None)
}
