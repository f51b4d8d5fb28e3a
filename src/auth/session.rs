//! Session management
//!
//! Opaque session ids mapped to users in memory, keyed per session so
//! concurrent logins never observe each other's identity. State lives
//! only for the lifetime of the process; it is not distributed-safe.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use tokio::sync::RwLock;

use crate::error::AppError;

use super::identity::NormalizedUser;

const SESSION_ID_LEN: usize = 48;

/// Server-held session record
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub user: NormalizedUser,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

/// In-memory session store
///
/// Clones share the underlying map, so every request handler sees the
/// same sessions.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionRecord>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a session for the user and return its id
    pub async fn insert(&self, user: NormalizedUser, max_age_secs: i64) -> String {
        let id: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SESSION_ID_LEN)
            .map(char::from)
            .collect();

        let now = Utc::now();
        let record = SessionRecord {
            user,
            created_at: now,
            expires_at: now + Duration::seconds(max_age_secs),
        };

        let mut sessions = self.sessions.write().await;
        sessions.insert(id.clone(), record);
        id
    }

    /// Resolve a session id to its user
    ///
    /// Expired records are removed on sight and reported as invalid.
    pub async fn resolve(&self, id: &str) -> Result<NormalizedUser, AppError> {
        {
            let sessions = self.sessions.read().await;
            match sessions.get(id) {
                Some(record) if !record.is_expired() => return Ok(record.user.clone()),
                Some(_) => {}
                None => return Err(AppError::InvalidSession),
            }
        }

        self.sessions.write().await.remove(id);
        Err(AppError::InvalidSession)
    }

    /// Delete a session (logout). Unknown ids are not an error.
    pub async fn remove(&self, id: &str) {
        self.sessions.write().await.remove(id);
    }
}
