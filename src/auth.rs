//! Authentication plumbing: password hashing, session tokens, and the
//! `CurrentUser` extractor that hands handlers an explicit user id.
//!
//! Tokens are opaque random ids kept in memory with an expiry. A request
//! authenticates with `Authorization: Bearer <token>`, or, for browser pages,
//! with the `token` cookie.

use std::{
    collections::HashMap,
    sync::{Arc, OnceLock},
    time::Duration,
};

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

pub const TOKEN_COOKIE: &str = "token";

/// PHC-formatted argon2 hash with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut rand::rngs::OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| {
            warn!(target: "auth", error = %e, "Password hashing failed");
            AppError::Internal("Failed to hash password".into())
        })
}

/// False for a wrong password and for a hash that cannot be parsed.
pub fn verify_password(hash: &str, password: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!(target: "auth", error = %e, "Stored password hash is malformed");
            false
        }
    }
}

/// Hash checked against when the email is unknown, so a failed login costs
/// the same whether or not the account exists. Built on first use.
pub fn dummy_hash() -> &'static str {
    static DUMMY: OnceLock<String> = OnceLock::new();
    DUMMY.get_or_init(|| hash_password("not-a-real-password").unwrap_or_default())
}

#[derive(Clone, Debug)]
struct Session {
    user_id: u64,
    expires_at: DateTime<Utc>,
}

/// In-memory session table.
#[derive(Clone)]
pub struct Sessions {
    by_token: Arc<RwLock<HashMap<String, Session>>>,
    ttl: Duration,
}

impl Sessions {
    pub fn new(ttl: Duration) -> Self {
        Self {
            by_token: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn issue(&self, user_id: u64) -> String {
        let token = Uuid::new_v4().simple().to_string();
        let ttl = chrono::Duration::from_std(self.ttl).unwrap_or_else(|_| chrono::Duration::days(1));
        let session = Session { user_id, expires_at: Utc::now() + ttl };
        let mut by_token = self.by_token.write().await;
        // Opportunistic sweep so the table does not grow without bound.
        let now = Utc::now();
        by_token.retain(|_, s| s.expires_at > now);
        by_token.insert(token.clone(), session);
        token
    }

    /// User id behind a live token.
    pub async fn resolve(&self, token: &str) -> Option<u64> {
        let by_token = self.by_token.read().await;
        by_token
            .get(token)
            .filter(|s| s.expires_at > Utc::now())
            .map(|s| s.user_id)
    }

    pub async fn revoke(&self, token: &str) -> bool {
        self.by_token.write().await.remove(token).is_some()
    }
}

/// Bearer header first, then the `token` cookie. An empty header does not
/// hide the cookie.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|value| value.trim())
        .map(|value| value.strip_prefix("Bearer ").unwrap_or(value).trim())
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == TOKEN_COOKIE)
        .map(|(_, value)| value.to_string())
}

pub fn session_cookie(token: &str, ttl: Duration) -> String {
    format!(
        "{TOKEN_COOKIE}={token}; Max-Age={}; Path=/; HttpOnly; SameSite=Lax",
        ttl.as_secs()
    )
}

pub fn clear_cookie() -> String {
    format!("{TOKEN_COOKIE}=; Max-Age=0; Path=/; HttpOnly; SameSite=Lax")
}

/// Authenticated caller. Core operations receive `user_id` from here as a
/// plain argument; nothing downstream reads request-scoped state.
#[derive(Clone, Copy, Debug)]
pub struct CurrentUser(pub u64);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = Arc::<AppState>::from_ref(state);
        let token = match token_from_headers(&parts.headers) {
            Some(t) if !t.is_empty() => t,
            _ => return Err(AppError::Unauthorized("Authorization token required".into())),
        };
        match state.sessions.resolve(&token).await {
            Some(user_id) => {
                debug!(target: "auth", user_id, "Request authenticated");
                Ok(CurrentUser(user_id))
            }
            None => Err(AppError::Unauthorized("Invalid token".into())),
        }
    }
}
