//! Database queries for users.

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use crate::entity::user::{self, Entity as User};
use crate::error::{AppError, AppResult};
use crate::models::Role;

use super::DbPool;

impl DbPool {
    /// Get an active (not soft-deleted) user by ID.
    pub async fn get_user_by_id(&self, id: i64) -> AppResult<Option<user::Model>> {
        let result = User::find_by_id(id)
            .filter(user::Column::DeletedAt.is_null())
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get user: {}", e)))?;

        Ok(result)
    }

    /// Get an active user and verify it carries the expected role.
    ///
    /// NotFound when absent, InvalidInput when the role does not match, so
    /// callers can surface "technician_id does not reference a technician"
    /// distinctly from a dangling reference.
    pub async fn get_user_with_role(&self, id: i64, role: Role) -> AppResult<user::Model> {
        let user = self
            .get_user_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {}", id)))?;

        if user.role != role.as_str() {
            return Err(AppError::InvalidInput(format!(
                "User {} is not a {}",
                id, role
            )));
        }

        Ok(user)
    }
}
