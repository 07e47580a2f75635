use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Token grant as returned by the `/auth/oauth2/token` endpoint.
///
/// `expires_in` is a delta in seconds from the response time; the client
/// converts it to an absolute expiration instant when storing the grant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: String,
    /// Seconds until the access token expires (delta, not absolute)
    pub expires_in: i64,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub account_id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// In-memory bearer credential held by one client instance.
///
/// The expiration instant is always derived from the issue instant plus the
/// grant's lifetime; it is never set directly. Absence of a `TokenSet` on
/// the client means "unauthenticated".
#[derive(Debug, Clone)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: String,
    pub issued_at: DateTime<Utc>,
    pub ttl_seconds: i64,
    pub expiration: DateTime<Utc>,
}

impl TokenSet {
    pub fn new(access_token: String, refresh_token: String, ttl_seconds: i64) -> Self {
        let issued_at = Utc::now();
        Self {
            access_token,
            refresh_token,
            issued_at,
            ttl_seconds,
            expiration: issued_at + Duration::seconds(ttl_seconds),
        }
    }

    pub fn from_grant(grant: TokenGrant) -> Self {
        Self::new(grant.access_token, grant.refresh_token, grant.expires_in)
    }

    /// True once the current UTC instant is no longer strictly before the
    /// expiration instant.
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expiration
    }

    pub fn is_valid(&self) -> bool {
        !self.is_expired()
    }
}
