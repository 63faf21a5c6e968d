//! Session Entity
//!
//! Server-side record of a browser session. The client holds a random
//! opaque token in a cookie; only the SHA-256 hash of that token is stored.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Duration, Utc};
use bson::serde_helpers::chrono_datetime_as_bson_datetime;

/// Session entity
///
/// Stored in the database to enable:
/// 1. Cookie-to-user resolution on each request
/// 2. Server-side invalidation on logout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// UUID as primary key
    #[serde(rename = "_id")]
    pub id: String,

    /// SHA-256 hash of the session token
    /// Only the hash is stored; the raw token is sent to the client once
    pub token_hash: String,

    /// The authenticated user
    pub user_id: String,

    /// When the session was created
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    /// When the session expires
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Create a new session
    ///
    /// Note: The raw token should be generated separately and hashed before
    /// storage. Use `generate()` to create both the raw token and entity.
    pub fn new(
        token_hash: impl Into<String>,
        user_id: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            token_hash: token_hash.into(),
            user_id: user_id.into(),
            created_at: now,
            expires_at: now + ttl,
        }
    }

    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Generate a cryptographically random token string
    pub fn generate_raw_token() -> String {
        use rand::Rng;
        use base64::Engine;

        let mut bytes = [0u8; 32];
        rand::thread_rng().fill(&mut bytes);
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Hash a raw token for storage
    pub fn hash_token(raw_token: &str) -> String {
        use sha2::{Sha256, Digest};
        use base64::Engine;

        let mut hasher = Sha256::new();
        hasher.update(raw_token.as_bytes());
        let hash = hasher.finalize();
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(hash)
    }

    /// Generate a session pair (raw token for the cookie, entity for storage)
    pub fn generate(user_id: impl Into<String>, ttl: Duration) -> (String, Self) {
        let raw_token = Self::generate_raw_token();
        let token_hash = Self::hash_token(&raw_token);
        let entity = Self::new(token_hash, user_id, ttl);
        (raw_token, entity)
    }
}
