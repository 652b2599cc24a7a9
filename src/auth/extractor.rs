//! Actix-web extractor resolving request credentials to an actor.
//!
//! # Security
//! - All secret values (API keys, admin keys) are wrapped in `SecretString`
//! - Secret values are never logged or exposed in debug output
//! - Memory is zeroized when secrets are dropped
//! - Constant-time comparison is used for the bootstrap admin key

use actix_web::dev::Payload;
use actix_web::http::StatusCode;
use actix_web::{FromRequest, HttpRequest, HttpResponse, ResponseError, web};
use futures_util::future::LocalBoxFuture;
use secrecy::{ExposeSecret, SecretString};

use super::AdminKey;
use crate::config::{ADMIN_KEY_HEADER, API_KEY_HEADER};
use crate::db::DbPool;
use crate::error::ErrorResponse;
use crate::models::{ActorContext, Role};
use crate::services::api_key;

/// Extract a secret header value, wrapping it in SecretString.
/// Returns None if the header is missing or invalid UTF-8.
fn extract_secret_header(req: &HttpRequest, header_name: &str) -> Option<SecretString> {
    req.headers()
        .get(header_name)
        .and_then(|v| v.to_str().ok())
        .map(|s| SecretString::from(s.to_string()))
}

/// Authentication error for extractors.
#[derive(Debug)]
pub struct AuthError {
    message: String,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ResponseError for AuthError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::UNAUTHORIZED).json(ErrorResponse {
            error: "UNAUTHORIZED".to_string(),
            message: self.message.clone(),
        })
    }
}

/// Extractor that requires a valid API key or the bootstrap admin key.
///
/// Use this in handlers that require authentication:
/// ```ignore
/// async fn protected_handler(auth: ActorAuth) -> impl Responder {
///     // auth.actor carries the caller's user id and role
/// }
/// ```
///
/// The bootstrap admin key authenticates as a synthetic admin actor with
/// user id 0, so it can issue the first real API keys before any user
/// keys exist.
pub struct ActorAuth {
    pub actor: ActorContext,
}

impl FromRequest for ActorAuth {
    type Error = AuthError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        // Get DbPool from app data
        let pool = req.app_data::<web::Data<DbPool>>().cloned();

        // Get stored admin key from app data (optional)
        let admin_key = req.app_data::<web::Data<AdminKey>>().cloned();

        // Extract secrets from headers - immediately wrapped in SecretString
        let provided_api_key: Option<SecretString> = extract_secret_header(req, API_KEY_HEADER);
        let provided_admin_key: Option<SecretString> = extract_secret_header(req, ADMIN_KEY_HEADER);

        Box::pin(async move {
            // Check admin key first (for bootstrap operations)
            // Uses constant-time comparison to prevent timing attacks
            if let (Some(provided), Some(stored)) = (&provided_admin_key, &admin_key) {
                if stored.verify(provided.expose_secret()) {
                    // provided_admin_key is dropped at the end of scope, memory zeroized
                    return Ok(ActorAuth {
                        actor: ActorContext {
                            id: 0,
                            role: Role::Admin,
                        },
                    });
                }
            }

            let pool = pool.ok_or_else(|| AuthError {
                message: "Internal configuration error".to_string(),
            })?;

            // Check API key from database
            match provided_api_key {
                Some(ref key) => {
                    // expose_secret() is the only way to access the value
                    match api_key::verify_key(pool.get_ref(), key.expose_secret()).await {
                        Ok(actor) => Ok(ActorAuth { actor }),
                        Err(e) => Err(AuthError {
                            message: e.to_string(),
                        }),
                    }
                    // key is dropped here, memory zeroized
                }
                None => Err(AuthError {
                    message: "Missing API key. Provide X-API-Key header.".to_string(),
                }),
            }
        })
    }
}
