//! API key management endpoints (admin only).
//!
//! The first key is issued with the bootstrap admin key (`X-Admin-Key`);
//! after that an admin-role API key works as well.

use actix_web::{HttpResponse, delete, get, post, web};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::ActorAuth;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{ApiKeyCreateResponse, ApiKeyListItem, CreateApiKeyRequest};
use crate::services::api_key;

/// List response for API keys.
#[derive(Serialize, ToSchema)]
pub struct ApiKeyListResponse {
    pub keys: Vec<ApiKeyListItem>,
}

/// Configure API key management routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(create_key)
        .service(list_keys)
        .service(get_key)
        .service(revoke_key);
}

fn require_admin(auth: &ActorAuth) -> AppResult<()> {
    if !auth.actor.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can manage API keys".to_string(),
        ));
    }
    Ok(())
}

/// Create a new API key for a user.
///
/// The full key is returned exactly once; only its hash is stored.
#[utoipa::path(
    post,
    path = "/api/v1/auth/keys",
    tag = "Auth",
    request_body = CreateApiKeyRequest,
    responses(
        (status = 201, description = "API key created", body = ApiKeyCreateResponse),
        (status = 403, description = "Forbidden", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = []))
)]
#[post("/auth/keys")]
pub async fn create_key(
    pool: web::Data<DbPool>,
    auth: ActorAuth,
    body: web::Json<CreateApiKeyRequest>,
) -> AppResult<HttpResponse> {
    require_admin(&auth)?;

    let req = body.into_inner();
    if req.name.trim().is_empty() {
        return Err(AppError::InvalidInput("name must not be blank".to_string()));
    }

    let (full_key, key) =
        api_key::create_key(&pool, &req.name, req.user_id, req.expires_in.as_deref()).await?;

    Ok(HttpResponse::Created().json(ApiKeyCreateResponse {
        id: key.id,
        key: full_key,
        name: key.name,
        user_id: key.user_id,
        expires_at: key.expires_at.map(|d| d.to_rfc3339()),
        created_at: key.created_at.to_rfc3339(),
    }))
}

/// List all API keys (hashes and full keys never included).
#[utoipa::path(
    get,
    path = "/api/v1/auth/keys",
    tag = "Auth",
    responses(
        (status = 200, description = "List of API keys", body = ApiKeyListResponse),
        (status = 403, description = "Forbidden", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = []))
)]
#[get("/auth/keys")]
pub async fn list_keys(pool: web::Data<DbPool>, auth: ActorAuth) -> AppResult<HttpResponse> {
    require_admin(&auth)?;

    let keys = pool.list_api_keys().await?;
    Ok(HttpResponse::Ok().json(ApiKeyListResponse {
        keys: keys.into_iter().map(ApiKeyListItem::from).collect(),
    }))
}

/// Get a single API key by ID.
#[utoipa::path(
    get,
    path = "/api/v1/auth/keys/{id}",
    tag = "Auth",
    params(("id" = String, Path, description = "API key ID")),
    responses(
        (status = 200, description = "API key details", body = ApiKeyListItem),
        (status = 403, description = "Forbidden", body = crate::error::ErrorResponse),
        (status = 404, description = "Key not found", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = []))
)]
#[get("/auth/keys/{id}")]
pub async fn get_key(
    pool: web::Data<DbPool>,
    auth: ActorAuth,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    require_admin(&auth)?;

    let id = path.into_inner();
    let key = pool
        .find_api_key_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("API key {}", id)))?;

    Ok(HttpResponse::Ok().json(ApiKeyListItem::from(key)))
}

/// Revoke an API key (soft delete).
#[utoipa::path(
    delete,
    path = "/api/v1/auth/keys/{id}",
    tag = "Auth",
    params(("id" = String, Path, description = "API key ID")),
    responses(
        (status = 204, description = "API key revoked"),
        (status = 403, description = "Forbidden", body = crate::error::ErrorResponse),
        (status = 404, description = "Key not found or already revoked", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = []))
)]
#[delete("/auth/keys/{id}")]
pub async fn revoke_key(
    pool: web::Data<DbPool>,
    auth: ActorAuth,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    require_admin(&auth)?;

    let id = path.into_inner();
    if !pool.revoke_api_key(&id).await? {
        return Err(AppError::NotFound(format!("API key {}", id)));
    }

    Ok(HttpResponse::NoContent().finish())
}
