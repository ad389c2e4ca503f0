/// JWT Authentication Middleware
///
/// The per-request gate: validates the access token before any handler
/// logic runs and injects the verified claims into request extensions.
/// The token may arrive as a bearer Authorization header or as the
/// `access_token` cookie; both transports are in use across the
/// application's clients.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage, HttpResponse,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::{decode_token, TokenKind};
use crate::configuration::JwtSettings;

/// JWT middleware for protecting routes
///
/// Must be applied to routes that require authentication.
pub struct JwtMiddleware {
    jwt_config: JwtSettings,
}

impl JwtMiddleware {
    /// Create new JWT middleware instance
    pub fn new(jwt_config: JwtSettings) -> Self {
        Self { jwt_config }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(JwtMiddlewareService {
            service: Rc::new(service),
            jwt_config: self.jwt_config.clone(),
        }))
    }
}

pub struct JwtMiddlewareService<S> {
    service: Rc<S>,
    jwt_config: JwtSettings,
}

/// Pull the access token out of the request: bearer header first, then
/// the `access_token` cookie.
fn extract_access_token(req: &ServiceRequest) -> Option<String> {
    let bearer = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.to_string());

    bearer.or_else(|| req.cookie("access_token").map(|c| c.value().to_string()))
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match extract_access_token(&req) {
            None => {
                tracing::warn!("Missing authorization header and access token cookie");
                let response = HttpResponse::Unauthorized().json(serde_json::json!({
                    "error": "Missing or invalid authorization",
                    "code": "UNAUTHORIZED"
                }));
                Box::pin(async move {
                    Err(actix_web::error::InternalError::from_response(
                        "Unauthorized",
                        response,
                    )
                    .into())
                })
            }
            Some(token) => {
                match decode_token(&token, TokenKind::Access, &self.jwt_config) {
                    Ok(claims) => {
                        // Inject claims into request extensions
                        req.extensions_mut().insert(claims.clone());

                        tracing::debug!(
                            user_id = %claims.sub,
                            "Access token validated"
                        );

                        let service = self.service.clone();
                        Box::pin(async move { service.call(req).await })
                    }
                    Err(e) => {
                        tracing::warn!("Access token validation failed: {}", e);
                        // One body for expired and invalid; the client learns
                        // nothing beyond "present a fresh token".
                        let response = HttpResponse::Unauthorized().json(serde_json::json!({
                            "error": "Invalid or expired token",
                            "code": "TOKEN_INVALID"
                        }));
                        Box::pin(async move {
                            Err(actix_web::error::InternalError::from_response(
                                "Invalid token",
                                response,
                            )
                            .into())
                        })
                    }
                }
            }
        }
    }
}
