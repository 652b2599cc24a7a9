//! Database queries for API keys.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::entity::api_key::{self, Entity as ApiKeyEntity};
use crate::error::{AppError, AppResult};
use crate::models::ApiKey;

use super::DbPool;

fn model_to_api_key(m: api_key::Model) -> ApiKey {
    ApiKey {
        id: m.id,
        key_hash: m.key_hash,
        key_prefix: m.key_prefix,
        name: m.name,
        user_id: m.user_id,
        expires_at: m.expires_at,
        last_used_at: m.last_used_at,
        created_at: m.created_at,
        deleted_at: m.deleted_at,
    }
}

impl DbPool {
    /// Insert a new API key.
    pub async fn insert_api_key(&self, key: &ApiKey) -> AppResult<()> {
        let model = api_key::ActiveModel {
            id: Set(key.id.clone()),
            key_hash: Set(key.key_hash.clone()),
            key_prefix: Set(key.key_prefix.clone()),
            name: Set(key.name.clone()),
            user_id: Set(key.user_id),
            expires_at: Set(key.expires_at),
            last_used_at: Set(key.last_used_at),
            created_at: Set(key.created_at),
            deleted_at: Set(key.deleted_at),
        };

        ApiKeyEntity::insert(model)
            .exec(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert API key: {}", e)))?;

        Ok(())
    }

    /// Find an API key by its SHA-256 hash.
    pub async fn find_api_key_by_hash(&self, key_hash: &str) -> AppResult<Option<ApiKey>> {
        let result = ApiKeyEntity::find()
            .filter(api_key::Column::KeyHash.eq(key_hash))
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to find API key: {}", e)))?;

        Ok(result.map(model_to_api_key))
    }

    /// Find an API key by ID.
    pub async fn find_api_key_by_id(&self, id: &str) -> AppResult<Option<ApiKey>> {
        let result = ApiKeyEntity::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to find API key: {}", e)))?;

        Ok(result.map(model_to_api_key))
    }

    /// Stamp last_used_at. Failures are ignored by callers.
    pub async fn touch_api_key(&self, id: &str) -> AppResult<()> {
        let Some(existing) = ApiKeyEntity::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to find API key: {}", e)))?
        else {
            return Ok(());
        };

        let mut active: api_key::ActiveModel = existing.into();
        active.last_used_at = Set(Some(Utc::now()));
        active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to touch API key: {}", e)))?;

        Ok(())
    }

    /// List all API keys, newest first, revoked included.
    pub async fn list_api_keys(&self) -> AppResult<Vec<ApiKey>> {
        let result = ApiKeyEntity::find()
            .order_by_desc(api_key::Column::CreatedAt)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list API keys: {}", e)))?;

        Ok(result.into_iter().map(model_to_api_key).collect())
    }

    /// Revoke an API key (soft delete). Returns false when absent or already
    /// revoked.
    pub async fn revoke_api_key(&self, id: &str) -> AppResult<bool> {
        let Some(existing) = ApiKeyEntity::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to find API key: {}", e)))?
        else {
            return Ok(false);
        };

        if existing.deleted_at.is_some() {
            return Ok(false);
        }

        let mut active: api_key::ActiveModel = existing.into();
        active.deleted_at = Set(Some(Utc::now()));
        active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to revoke API key: {}", e)))?;

        Ok(true)
    }
}
