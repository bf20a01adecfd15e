use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::{ErrorResponse, MessageResponse};
use crate::middleware::auth_middleware::CallerContext;
use crate::models::expense::{
    CreateExpenseRequest, Expense, ExpenseWithOwner, UpdateExpenseRequest,
};
use crate::services::expense_service::{ExpenseError, ExpenseService};

/// Convert ExpenseError to HTTP response
impl IntoResponse for ExpenseError {
    fn into_response(self) -> Response {
        let status = match self {
            // A non-owner gets the same status as a missing identity
            ExpenseError::Unauthenticated | ExpenseError::Forbidden => StatusCode::UNAUTHORIZED,
            ExpenseError::InvalidIdentifier | ExpenseError::ValidationFailure(_) => {
                StatusCode::BAD_REQUEST
            }
            ExpenseError::NotFound => StatusCode::NOT_FOUND,
            ExpenseError::StorageFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        ErrorResponse::new(self.to_string()).into_response_with(status)
    }
}

fn body_rejection(rejection: JsonRejection) -> ExpenseError {
    ExpenseError::ValidationFailure(rejection.body_text())
}

/// Handler for listing every expense
///
/// Returns all expenses in storage, whoever owns them.
#[utoipa::path(
    get,
    path = "/expenses",
    responses(
        (status = 200, description = "All expenses", body = Vec<Expense>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "expenses"
)]
pub async fn list_expenses_handler(
    State(expense_service): State<Arc<dyn ExpenseService>>,
    context: CallerContext,
) -> Result<Json<Vec<Expense>>, ExpenseError> {
    let expenses = expense_service.list_all(context.caller).await?;
    Ok(Json(expenses))
}

/// Handler for listing one user's expenses
#[utoipa::path(
    get,
    path = "/expenses/user/{user_id}",
    params(
        ("user_id" = String, Path, description = "Owner user ID (UUID)")
    ),
    responses(
        (status = 200, description = "Expenses owned by the user", body = Vec<Expense>),
        (status = 400, description = "User ID is not a valid UUID", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "expenses"
)]
pub async fn list_user_expenses_handler(
    State(expense_service): State<Arc<dyn ExpenseService>>,
    context: CallerContext,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Expense>>, ExpenseError> {
    let expenses = expense_service
        .list_for_user(context.caller, &user_id)
        .await?;
    Ok(Json(expenses))
}

/// Handler for creating an expense
///
/// The owner is always the authenticated caller; an owner in the body is ignored.
#[utoipa::path(
    post,
    path = "/expenses",
    request_body = CreateExpenseRequest,
    responses(
        (status = 201, description = "Expense created", body = ExpenseWithOwner),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "expenses"
)]
pub async fn create_expense_handler(
    State(expense_service): State<Arc<dyn ExpenseService>>,
    context: CallerContext,
    payload: Result<Json<CreateExpenseRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ExpenseWithOwner>), ExpenseError> {
    let Json(request) = payload.map_err(body_rejection)?;
    let created = expense_service
        .create_expense(context.caller, request)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Handler for fetching an expense
#[utoipa::path(
    get,
    path = "/expenses/{id}",
    params(
        ("id" = String, Path, description = "Expense ID (UUID)")
    ),
    responses(
        (status = 200, description = "The expense", body = Expense),
        (status = 400, description = "ID is not a valid UUID", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Expense not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "expenses"
)]
pub async fn get_expense_handler(
    State(expense_service): State<Arc<dyn ExpenseService>>,
    context: CallerContext,
    Path(expense_id): Path<String>,
) -> Result<Json<Expense>, ExpenseError> {
    let expense = expense_service
        .get_expense(context.caller, &expense_id)
        .await?;
    Ok(Json(expense))
}

/// Handler for updating an expense
///
/// Only the owner may update. ID and owner are never changed.
#[utoipa::path(
    put,
    path = "/expenses/{id}",
    params(
        ("id" = String, Path, description = "Expense ID (UUID)")
    ),
    request_body = UpdateExpenseRequest,
    responses(
        (status = 200, description = "Expense updated", body = Expense),
        (status = 400, description = "Invalid ID or validation error", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token, or caller does not own the expense", body = ErrorResponse),
        (status = 404, description = "Expense not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "expenses"
)]
pub async fn update_expense_handler(
    State(expense_service): State<Arc<dyn ExpenseService>>,
    context: CallerContext,
    Path(expense_id): Path<String>,
    payload: Result<Json<UpdateExpenseRequest>, JsonRejection>,
) -> Result<Json<Expense>, ExpenseError> {
    let Json(request) = payload.map_err(body_rejection)?;
    let updated = expense_service
        .update_expense(context.caller, &expense_id, request)
        .await?;
    Ok(Json(updated))
}

/// Handler for deleting an expense
///
/// Only the owner may delete.
#[utoipa::path(
    delete,
    path = "/expenses/{id}",
    params(
        ("id" = String, Path, description = "Expense ID (UUID)")
    ),
    responses(
        (status = 200, description = "Expense deleted", body = MessageResponse),
        (status = 400, description = "ID is not a valid UUID", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token, or caller does not own the expense", body = ErrorResponse),
        (status = 404, description = "Expense not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "expenses"
)]
pub async fn delete_expense_handler(
    State(expense_service): State<Arc<dyn ExpenseService>>,
    context: CallerContext,
    Path(expense_id): Path<String>,
) -> Result<Json<MessageResponse>, ExpenseError> {
    expense_service
        .delete_expense(context.caller, &expense_id)
        .await?;
    Ok(Json(MessageResponse {
        message: "Expense deleted successfully".to_string(),
    }))
}
