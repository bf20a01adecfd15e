use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use validator::Validate;

use super::ErrorResponse;
use crate::models::auth::{AuthToken, LoginRequest};
use crate::models::user::{CreateUserRequest, User};
use crate::services::auth_service::{AuthError, AuthService};
use crate::validation::describe_errors;

/// Convert AuthError to HTTP response
impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AuthError::DuplicateEmail => StatusCode::CONFLICT,
            AuthError::InvalidCredentials | AuthError::InvalidToken | AuthError::TokenExpired => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::Internal(ref msg) => {
                tracing::error!(error = %msg, "auth storage failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let message = match self {
            AuthError::InvalidCredentials => "Invalid email or password".to_string(),
            other => other.to_string(),
        };

        ErrorResponse::new(message).into_response_with(status)
    }
}

/// Handler for user registration
///
/// Creates a new user account with the provided credentials.
#[utoipa::path(
    post,
    path = "/register",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User successfully registered", body = User),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 409, description = "Email already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn register_handler(
    State(auth_service): State<Arc<dyn AuthService>>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), Response> {
    let Json(request) = payload.map_err(|rejection| {
        ErrorResponse::new(rejection.body_text()).into_response_with(StatusCode::BAD_REQUEST)
    })?;

    if let Err(validation_errors) = request.validate() {
        return Err(ErrorResponse::new(describe_errors(&validation_errors))
            .into_response_with(StatusCode::BAD_REQUEST));
    }

    match auth_service.register(request).await {
        Ok(user) => Ok((StatusCode::CREATED, Json(user))),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for user login
///
/// Authenticates a user and returns a JWT token.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthToken),
        (status = 400, description = "Malformed body, bad email or empty password", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(auth_service): State<Arc<dyn AuthService>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthToken>, Response> {
    let Json(request) = payload.map_err(|rejection| {
        ErrorResponse::new(rejection.body_text()).into_response_with(StatusCode::BAD_REQUEST)
    })?;

    request.validate().map_err(|errors| {
        ErrorResponse::new(describe_errors(&errors)).into_response_with(StatusCode::BAD_REQUEST)
    })?;

    match auth_service.login(request).await {
        Ok(token) => Ok(Json(token)),
        Err(e) => Err(e.into_response()),
    }
}
