//! Bearer token issuance
//!
//! Signed, stateless JWTs embedding the normalized user. Tokens carry
//! an expiry, enforced on verification; an expired or tampered token is
//! rejected as [`AppError::InvalidToken`], never a panic.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

use super::identity::NormalizedUser;

/// JWT claims for an authenticated user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Provider-assigned user id
    pub sub: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

/// Mints and verifies signed bearer tokens
pub struct BearerIssuer {
    secret: String,
    ttl_secs: i64,
}

impl BearerIssuer {
    pub fn new(secret: String, ttl_secs: i64) -> Self {
        Self { secret, ttl_secs }
    }

    /// Sign a token embedding the user's identity
    pub fn issue(&self, user: &NormalizedUser) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.clone(),
            username: user.username.clone(),
            profile_url: user.profile_url.clone(),
            avatar_url: user.avatar_url.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.ttl_secs)).timestamp(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(e.into()))
    }

    /// Verify a token's signature and expiry, recovering the user
    pub fn verify(&self, token: &str) -> Result<NormalizedUser, AppError> {
        let validation = Validation::new(Algorithm::HS256);

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|_| AppError::InvalidToken)?;

        Ok(NormalizedUser {
            id: data.claims.sub,
            username: data.claims.username,
            profile_url: data.claims.profile_url,
            avatar_url: data.claims.avatar_url,
        })
    }
}
