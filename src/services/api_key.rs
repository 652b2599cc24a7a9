//! API key service for generation, verification, and management.
//!
//! Keys authenticate as a user; the actor role comes from the user record at
//! verification time, so a role change takes effect without reissuing keys.

use chrono::{Duration, Utc};
use rand::RngExt;
use sha2::{Digest, Sha256};

use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{ActorContext, ApiKey, Role};

/// API key prefix.
const KEY_PREFIX: &str = "desk_";
/// Length of random part of the key.
const KEY_RANDOM_LENGTH: usize = 32;
/// Length of the key prefix stored for identification.
pub const KEY_PREFIX_LENGTH: usize = 8;

/// Generate a new random API key for a user.
///
/// Returns the full key (to be shown to the user once) and the key data for
/// storage.
pub fn generate_key(
    name: &str,
    user_id: i64,
    expires_in: Option<&str>,
) -> AppResult<(String, ApiKey)> {
    let random_part: String = rand::rng()
        .sample_iter(rand::distr::Alphanumeric)
        .take(KEY_RANDOM_LENGTH)
        .map(char::from)
        .collect();

    let full_key = format!("{}{}", KEY_PREFIX, random_part);

    // Hash the key for storage
    let key_hash = hash_key(&full_key);

    // Extract prefix for identification (first 8 chars of full key)
    let key_prefix = full_key.chars().take(KEY_PREFIX_LENGTH).collect::<String>();

    // Parse expiration
    let expires_at = expires_in.and_then(parse_duration).map(|d| Utc::now() + d);

    let api_key = ApiKey {
        id: uuid::Uuid::new_v4().to_string(),
        key_hash,
        key_prefix,
        name: name.to_string(),
        user_id,
        expires_at,
        last_used_at: None,
        created_at: Utc::now(),
        deleted_at: None,
    };

    Ok((full_key, api_key))
}

/// Hash an API key using SHA-256.
pub fn hash_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Parse a duration string like "365d", "30d", "1y", "6m".
fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim().to_lowercase();

    if let Some(days) = s.strip_suffix('d') {
        days.parse::<i64>().ok().and_then(Duration::try_days)
    } else if let Some(years) = s.strip_suffix('y') {
        years
            .parse::<i64>()
            .ok()
            .and_then(|y| Duration::try_days(y * 365))
    } else if let Some(months) = s.strip_suffix('m') {
        months
            .parse::<i64>()
            .ok()
            .and_then(|m| Duration::try_days(m * 30))
    } else if let Some(weeks) = s.strip_suffix('w') {
        weeks.parse::<i64>().ok().and_then(Duration::try_weeks)
    } else {
        // Try parsing as days by default
        s.parse::<i64>().ok().and_then(Duration::try_days)
    }
}

/// Verify an API key and resolve the actor it authenticates as.
pub async fn verify_key(pool: &DbPool, key: &str) -> AppResult<ActorContext> {
    let key_hash = hash_key(key);

    let api_key = pool
        .find_api_key_by_hash(&key_hash)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid API key".to_string()))?;

    if api_key.is_revoked() {
        return Err(AppError::Unauthorized(
            "API key has been revoked".to_string(),
        ));
    }

    if api_key.is_expired() {
        return Err(AppError::Unauthorized("API key has expired".to_string()));
    }

    let user = pool
        .get_user_by_id(api_key.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("API key user no longer exists".to_string()))?;

    let role = Role::parse(&user.role)
        .ok_or_else(|| AppError::Unauthorized(format!("Unknown role '{}'", user.role)))?;

    // Update last used timestamp (fire and forget)
    let _ = pool.touch_api_key(&api_key.id).await;

    Ok(ActorContext { id: user.id, role })
}

/// Create a new API key and store it in the database.
///
/// The target user must exist; the key inherits whatever role that user has
/// when the key is later verified.
pub async fn create_key(
    pool: &DbPool,
    name: &str,
    user_id: i64,
    expires_in: Option<&str>,
) -> AppResult<(String, ApiKey)> {
    pool.get_user_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {}", user_id)))?;

    let (full_key, api_key) = generate_key(name, user_id, expires_in)?;
    pool.insert_api_key(&api_key).await?;

    Ok((full_key, api_key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_key_shape() {
        let (full_key, api_key) = generate_key("test", 7, None).unwrap();
        assert!(full_key.starts_with(KEY_PREFIX));
        assert_eq!(full_key.len(), KEY_PREFIX.len() + KEY_RANDOM_LENGTH);
        assert_eq!(api_key.key_prefix.len(), KEY_PREFIX_LENGTH);
        assert!(full_key.starts_with(&api_key.key_prefix));
        assert_eq!(api_key.user_id, 7);
        assert_eq!(api_key.key_hash, hash_key(&full_key));
    }

    #[test]
    fn test_hash_is_stable_and_hex() {
        let a = hash_key("desk_abc");
        let b = hash_key("desk_abc");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(hash_key("desk_abd"), a);
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("30d"), Duration::try_days(30));
        assert_eq!(parse_duration("1y"), Duration::try_days(365));
        assert_eq!(parse_duration("6m"), Duration::try_days(180));
        assert_eq!(parse_duration("2w"), Duration::try_weeks(2));
        assert_eq!(parse_duration("14"), Duration::try_days(14));
        assert_eq!(parse_duration("soon"), None);
    }
}
