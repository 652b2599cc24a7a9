//! API key model for authentication.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// API key stored in database. The key itself is never stored, only its hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKey {
    /// Unique identifier (UUID)
    pub id: String,
    /// SHA-256 hash of the full key
    pub key_hash: String,
    /// First 8 characters of the key for identification
    pub key_prefix: String,
    /// Human-readable name (e.g., "Mobile app - J. Mertens")
    pub name: String,
    /// User this key authenticates as
    pub user_id: i64,
    /// Expiration timestamp (optional)
    pub expires_at: Option<DateTime<Utc>>,
    /// Last used timestamp
    pub last_used_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Soft delete timestamp (revoked)
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ApiKey {
    /// Check if the key is revoked.
    pub fn is_revoked(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Check if the key is expired.
    pub fn is_expired(&self) -> bool {
        if let Some(expires_at) = self.expires_at {
            Utc::now() > expires_at
        } else {
            false
        }
    }
}

/// Request to create a new API key for a user.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateApiKeyRequest {
    pub name: String,
    pub user_id: i64,
    /// Expiration like "365d", "6m", "1y" (optional).
    #[serde(default)]
    pub expires_in: Option<String>,
}

/// Response when creating a new API key (includes the full key).
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiKeyCreateResponse {
    pub id: String,
    /// Full key - only shown once
    pub key: String,
    pub name: String,
    pub user_id: i64,
    pub expires_at: Option<String>,
    pub created_at: String,
}

/// Response for listing API keys (key masked).
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiKeyListItem {
    pub id: String,
    pub key_prefix: String,
    pub name: String,
    pub user_id: i64,
    pub expires_at: Option<String>,
    pub last_used_at: Option<String>,
    pub created_at: String,
    pub is_revoked: bool,
}

impl From<ApiKey> for ApiKeyListItem {
    fn from(key: ApiKey) -> Self {
        Self {
            id: key.id,
            key_prefix: key.key_prefix,
            name: key.name,
            user_id: key.user_id,
            expires_at: key.expires_at.map(|d| d.to_rfc3339()),
            last_used_at: key.last_used_at.map(|d| d.to_rfc3339()),
            created_at: key.created_at.to_rfc3339(),
            is_revoked: key.deleted_at.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_key() -> ApiKey {
        ApiKey {
            id: "k1".to_string(),
            key_hash: "hash".to_string(),
            key_prefix: "desk_abc".to_string(),
            name: "test".to_string(),
            user_id: 1,
            expires_at: None,
            last_used_at: None,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn test_revoked_and_expired() {
        let mut key = sample_key();
        assert!(!key.is_revoked());
        assert!(!key.is_expired());

        key.deleted_at = Some(Utc::now());
        assert!(key.is_revoked());

        let mut key = sample_key();
        key.expires_at = Some(Utc::now() - Duration::days(1));
        assert!(key.is_expired());

        key.expires_at = Some(Utc::now() + Duration::days(1));
        assert!(!key.is_expired());
    }
}
