//! Credential issuance
//!
//! One `issue`/`verify` pair polymorphic over the configured strategy:
//! signed bearer tokens or server-side sessions. The strategy is fixed
//! at startup; request handlers only see this type.

use crate::config::{AppConfig, AuthStrategy};
use crate::error::AppError;

use super::identity::NormalizedUser;
use super::session::SessionStore;
use super::token::BearerIssuer;

/// Proof of authentication handed to the client
#[derive(Debug, Clone)]
pub enum Credential {
    /// Signed JWT, delivered as a `token` query parameter on the
    /// post-login redirect
    Bearer(String),
    /// Opaque session id, delivered as a cookie
    Session(String),
}

pub enum Issuer {
    Bearer(BearerIssuer),
    Session {
        store: SessionStore,
        max_age_secs: i64,
    },
}

impl Issuer {
    pub fn from_config(config: &AppConfig) -> Self {
        match config.auth.strategy {
            AuthStrategy::Bearer => Issuer::Bearer(BearerIssuer::new(
                config.auth.token.secret.clone(),
                config.auth.token.ttl_secs,
            )),
            AuthStrategy::Session => Issuer::Session {
                store: SessionStore::new(),
                max_age_secs: config.auth.session_max_age,
            },
        }
    }

    pub fn strategy(&self) -> AuthStrategy {
        match self {
            Issuer::Bearer(_) => AuthStrategy::Bearer,
            Issuer::Session { .. } => AuthStrategy::Session,
        }
    }

    /// Mint a credential for a freshly authenticated user
    pub async fn issue(&self, user: &NormalizedUser) -> Result<Credential, AppError> {
        match self {
            Issuer::Bearer(bearer) => Ok(Credential::Bearer(bearer.issue(user)?)),
            Issuer::Session {
                store,
                max_age_secs,
            } => Ok(Credential::Session(
                store.insert(user.clone(), *max_age_secs).await,
            )),
        }
    }

    /// Verify a presented credential and recover the user
    pub async fn verify(&self, credential: &str) -> Result<NormalizedUser, AppError> {
        match self {
            Issuer::Bearer(bearer) => bearer.verify(credential),
            Issuer::Session { store, .. } => store.resolve(credential).await,
        }
    }

    /// Invalidate a credential if the strategy supports it
    ///
    /// Bearer tokens are stateless and simply expire; only sessions can
    /// be revoked.
    pub async fn revoke(&self, credential: &str) {
        if let Issuer::Session { store, .. } = self {
            store.remove(credential).await;
        }
    }
}
