use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use sqlx::PgPool;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;
use poll_shared::session::token_digest;
use crate::store::StoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
    pub expires_at: OffsetDateTime,
}

impl Session {
    pub fn is_live(&self, now: OffsetDateTime) -> bool {
        self.expires_at > now
    }
}

/// Read-only view of the identity provider's sessions and user records.
#[rocket::async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn session(&self, token_hash: &str) -> Result<Option<Session>, StoreError>;
    async fn user_exists(&self, user_id: Uuid) -> Result<bool, StoreError>;
}

pub struct PgIdentity {
    pool: PgPool,
}

impl PgIdentity {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[rocket::async_trait]
impl IdentityProvider for PgIdentity {
    async fn session(&self, token_hash: &str) -> Result<Option<Session>, StoreError> {
        let row = sqlx::query_as::<_, (Uuid, OffsetDateTime)>(
            "SELECT user_id, expires_at FROM auth_sessions WHERE token_hash = $1",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(user_id, expires_at)| Session { user_id, expires_at }))
    }

    async fn user_exists(&self, user_id: Uuid) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}

#[derive(Debug, Default)]
pub struct MemoryIdentity {
    sessions: Mutex<HashMap<String, Session>>,
    users: Mutex<HashSet<Uuid>>,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, user_id: Uuid) {
        if let Ok(mut users) = self.users.lock() {
            users.insert(user_id);
        }
    }

    /// Registers a session for `token` valid for `ttl` from now.
    pub fn add_session(&self, token: &str, user_id: Uuid, ttl: Duration) {
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.insert(token_digest(token), Session {
                user_id,
                expires_at: OffsetDateTime::now_utc() + ttl,
            });
        }
    }
}

#[cfg(test)]
impl MemoryIdentity {
    pub fn remove_user(&self, user_id: Uuid) {
        if let Ok(mut users) = self.users.lock() {
            users.remove(&user_id);
        }
    }

    /// Convenience for a registered user holding a one-hour session.
    pub fn sign_in(&self, token: &str) -> Uuid {
        let user_id = Uuid::new_v4();
        self.add_user(user_id);
        self.add_session(token, user_id, Duration::hours(1));
        user_id
    }
}

#[rocket::async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn session(&self, token_hash: &str) -> Result<Option<Session>, StoreError> {
        let sessions = self.sessions.lock().map_err(|_| StoreError::LockFailed)?;
        Ok(sessions.get(token_hash).cloned())
    }

    async fn user_exists(&self, user_id: Uuid) -> Result<bool, StoreError> {
        let users = self.users.lock().map_err(|_| StoreError::LockFailed)?;
        Ok(users.contains(&user_id))
    }
}
