//! Access logging for the HTTP surface.

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};
use std::time::Instant;
use tracing::{info, warn};

use crate::auth::mask_key;
use crate::config::{ADMIN_KEY_HEADER, API_KEY_HEADER};

/// Middleware factory emitting one access-log line per completed request.
///
/// The line carries the method, path, status, latency and which credential
/// kind the caller presented. Key material never reaches the log beyond the
/// masked prefix.
pub struct AccessLog;

impl<S, B> Transform<S, ServiceRequest> for AccessLog
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AccessLogMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AccessLogMiddleware { service }))
    }
}

pub struct AccessLogMiddleware<S> {
    service: S,
}

/// Describe the credential on a request without exposing it.
///
/// The bootstrap admin key wins over an API key, matching the order the
/// extractor checks them in.
fn credential_label(req: &ServiceRequest) -> String {
    if req.headers().contains_key(ADMIN_KEY_HEADER) {
        return "admin-key".to_string();
    }
    match req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        Some(key) => mask_key(key),
        None => "anonymous".to_string(),
    }
}

impl<S, B> Service<ServiceRequest> for AccessLogMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let started = Instant::now();
        let method = req.method().to_string();
        let path = req.path().to_string();
        let query = req.query_string().to_string();
        let peer = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("-")
            .to_string();
        let credential = credential_label(&req);

        let fut = self.service.call(req);

        Box::pin(async move {
            let res = fut.await?;
            let status = res.status();
            let duration_ms = started.elapsed().as_millis() as u64;

            if status.is_server_error() {
                warn!(
                    target: "servicedesk::access",
                    %method,
                    %path,
                    %query,
                    %peer,
                    %credential,
                    status = status.as_u16(),
                    duration_ms,
                    "request failed"
                );
            } else if status.is_client_error() {
                warn!(
                    target: "servicedesk::access",
                    %method,
                    %path,
                    %query,
                    %peer,
                    %credential,
                    status = status.as_u16(),
                    duration_ms,
                    "request rejected"
                );
            } else {
                info!(
                    target: "servicedesk::access",
                    %method,
                    %path,
                    %peer,
                    %credential,
                    status = status.as_u16(),
                    duration_ms,
                    "request served"
                );
            }

            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_credential_label_prefers_admin_key() {
        let req = TestRequest::default()
            .insert_header((ADMIN_KEY_HEADER, "bootstrap-secret"))
            .insert_header((API_KEY_HEADER, "desk_abcdef123456"))
            .to_srv_request();
        assert_eq!(credential_label(&req), "admin-key");
    }

    #[test]
    fn test_credential_label_masks_api_key() {
        let req = TestRequest::default()
            .insert_header((API_KEY_HEADER, "desk_abcdef123456"))
            .to_srv_request();
        assert_eq!(credential_label(&req), "desk_abc...");
    }

    #[test]
    fn test_credential_label_without_headers() {
        let req = TestRequest::default().to_srv_request();
        assert_eq!(credential_label(&req), "anonymous");
    }
}
