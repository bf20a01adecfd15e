use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use uuid::Uuid;

use crate::services::auth_service::AuthService;

/// Extension type to store authenticated user ID in request
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

/// Per-request caller identity handed to the expense operations.
///
/// Extraction never fails: when the middleware did not attach an
/// [`AuthenticatedUser`] the caller is `None` and the operation decides.
#[derive(Clone, Copy, Debug, Default)]
pub struct CallerContext {
    pub caller: Option<Uuid>,
}

impl<S> FromRequestParts<S> for CallerContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self {
            caller: parts
                .extensions
                .get::<AuthenticatedUser>()
                .map(|user| user.user_id),
        })
    }
}

/// Auth middleware that validates JWT tokens and adds user_id to request extensions
pub async fn auth_middleware(
    State(auth_service): State<Arc<dyn AuthService>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_header = headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingToken)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidTokenFormat)?;

    let user_id = auth_service
        .validate_token(token)
        .await
        .map_err(|e| match e {
            crate::services::auth_service::AuthError::TokenExpired => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?;

    request
        .extensions_mut()
        .insert(AuthenticatedUser { user_id });

    Ok(next.run(request).await)
}

/// Auth middleware errors
#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidTokenFormat,
    InvalidToken,
    TokenExpired,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingToken => "Missing authorization token",
            AuthError::InvalidTokenFormat => {
                "Invalid authorization header format. Expected: Bearer <token>"
            }
            AuthError::InvalidToken => "Invalid or malformed token",
            AuthError::TokenExpired => "Token has expired",
        };
        tracing::debug!(reason = message, "rejected request at auth middleware");

        let body = Json(json!({
            "error": message,
        }));

        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}
