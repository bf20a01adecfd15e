//! Ownership guard for expense access.
//!
//! Every operation that mutates an expense goes through [`authorize_expense`],
//! which is the only place a caller is compared against an expense owner.
//! Checks run in a fixed order: caller presence, identifier syntax, storage
//! lookup, owner comparison. A malformed identifier never reaches storage.

use uuid::Uuid;

use super::expense_service::ExpenseError;
use crate::models::expense::Expense;
use crate::repositories::expense_repository::ExpenseRepository;

/// An expense the caller has been confirmed to own
#[derive(Debug, Clone)]
pub struct OwnedExpense {
    pub caller: Uuid,
    pub expense: Expense,
}

/// Fails with `Unauthenticated` when no caller identity was attached to the request
pub fn require_caller(caller: Option<Uuid>) -> Result<Uuid, ExpenseError> {
    caller.ok_or(ExpenseError::Unauthenticated)
}

/// Parses a textual UUID taken from a path segment
pub fn parse_identifier(raw: &str) -> Result<Uuid, ExpenseError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ExpenseError::InvalidIdentifier)
}

/// Resolve `expense_id` and confirm `caller` owns it.
pub async fn authorize_expense(
    repository: &dyn ExpenseRepository,
    caller: Option<Uuid>,
    expense_id: &str,
) -> Result<OwnedExpense, ExpenseError> {
    let caller = require_caller(caller)?;
    let expense_id = parse_identifier(expense_id)?;

    let expense = repository
        .find_by_id(expense_id)
        .await?
        .ok_or(ExpenseError::NotFound)?;

    if expense.user_id != caller {
        tracing::warn!(
            caller = %caller,
            expense_id = %expense_id,
            "caller does not own expense"
        );
        return Err(ExpenseError::Forbidden);
    }

    Ok(OwnedExpense { caller, expense })
}
