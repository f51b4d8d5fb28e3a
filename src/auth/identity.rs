//! Identity normalization
//!
//! Maps provider-specific profile payloads into the one user shape
//! the rest of the application works with.

use serde::{Deserialize, Serialize};

use super::provider::Provider;

/// Profile as returned by a provider adapter
///
/// Carries the raw JSON payload alongside the extracted fields so the
/// adapter can log field-level problems while debugging. The raw blob
/// never leaves this module: `materialize` drops it before the user is
/// issued a credential or rendered anywhere.
#[derive(Debug, Clone)]
pub struct RawProfile {
    pub provider: Provider,
    /// Provider-assigned user id, stringified
    pub id: String,
    pub username: String,
    pub profile_url: Option<String>,
    pub avatar_url: Option<String>,
    /// Untouched provider response body
    pub raw: serde_json::Value,
}

/// Normalized user identity
///
/// Created once per successful login callback and embedded into the
/// issued credential. Missing optional provider fields map to `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedUser {
    pub id: String,
    pub username: String,
    pub profile_url: Option<String>,
    pub avatar_url: Option<String>,
}

/// Convert a raw provider profile into a [`NormalizedUser`]
///
/// Strips the raw JSON blob so provider-internal structure cannot leak
/// into credentials, storage, or logs.
pub fn materialize(profile: RawProfile) -> NormalizedUser {
    NormalizedUser {
        id: profile.id,
        username: profile.username,
        profile_url: profile.profile_url,
        avatar_url: profile.avatar_url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn materialize_keeps_extracted_fields() {
        let raw = RawProfile {
            provider: Provider::GitHub,
            id: "42".to_string(),
            username: "alice".to_string(),
            profile_url: Some("https://github.com/alice".to_string()),
            avatar_url: Some("https://avatars.githubusercontent.com/u/42".to_string()),
            raw: serde_json::json!({"login": "alice", "id": 42, "node_id": "MDQ6..."}),
        };

        let user = materialize(raw);
        assert_eq!(user.id, "42");
        assert_eq!(user.username, "alice");
        assert_eq!(user.profile_url.as_deref(), Some("https://github.com/alice"));
    }

    #[test]
    fn materialize_tolerates_missing_optional_fields() {
        let raw = RawProfile {
            provider: Provider::Google,
            id: "108234".to_string(),
            username: "Bob Example".to_string(),
            profile_url: None,
            avatar_url: None,
            raw: serde_json::json!({"sub": "108234", "name": "Bob Example"}),
        };

        let user = materialize(raw);
        assert_eq!(user.username, "Bob Example");
        assert!(user.profile_url.is_none());
        assert!(user.avatar_url.is_none());
    }

    #[test]
    fn normalized_user_serializes_without_raw_blob() {
        let raw = RawProfile {
            provider: Provider::GitHub,
            id: "7".to_string(),
            username: "carol".to_string(),
            profile_url: None,
            avatar_url: None,
            raw: serde_json::json!({"internal_flag": true}),
        };

        let json = serde_json::to_value(materialize(raw)).unwrap();
        assert!(json.get("raw").is_none());
        assert!(json.get("internal_flag").is_none());
    }
}
