use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::user::User;
use crate::validation::validate_positive_amount;

/// A single expense record. `user_id` is the owner and never changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Expense {
    pub id: Uuid,
    pub description: String,
    #[schema(value_type = f64, example = 3.5)]
    pub amount: Decimal,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create response: the new expense with its owner embedded
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExpenseWithOwner {
    #[serde(flatten)]
    pub expense: Expense,
    pub user: User,
}

/// Request payload for creating an expense.
///
/// Unknown fields (an `id` or `user_id` sent by the client) are dropped on
/// deserialization; the owner always comes from the authenticated caller.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "description": "Coffee",
    "amount": 3.5
}))]
pub struct CreateExpenseRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Description must be between 1 and 255 characters"
    ))]
    pub description: String,

    #[validate(custom(function = "validate_positive_amount"))]
    #[schema(value_type = f64, minimum = 0.01, example = 3.5)]
    pub amount: Decimal,
}

/// Request payload for updating an expense. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "description": "Flat white"
}))]
pub struct UpdateExpenseRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Description must be between 1 and 255 characters"
    ))]
    pub description: Option<String>,

    #[validate(custom(function = "validate_positive_amount"))]
    #[schema(value_type = Option<f64>, minimum = 0.01, example = 4.0)]
    pub amount: Option<Decimal>,
}

impl Expense {
    /// Apply a partial update. Identity, owner and creation time are left untouched.
    pub fn merge(mut self, update: UpdateExpenseRequest, now: DateTime<Utc>) -> Self {
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(amount) = update.amount {
            self.amount = amount;
        }
        self.updated_at = now;
        self
    }
}
