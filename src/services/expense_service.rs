use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use super::ownership::{OwnedExpense, authorize_expense, parse_identifier, require_caller};
use crate::models::expense::{
    CreateExpenseRequest, Expense, ExpenseWithOwner, UpdateExpenseRequest,
};
use crate::repositories::RepositoryError;
use crate::repositories::expense_repository::ExpenseRepository;
use crate::repositories::user_repository::UserRepository;
use crate::validation::describe_errors;

/// Expense service errors
#[derive(Debug, thiserror::Error)]
pub enum ExpenseError {
    #[error("User ID not found")]
    Unauthenticated,

    #[error("Identifier is not a valid UUID")]
    InvalidIdentifier,

    #[error("Expense not found")]
    NotFound,

    #[error("You are not authorized to access this expense")]
    Forbidden,

    #[error("{0}")]
    StorageFailure(String),

    #[error("{0}")]
    ValidationFailure(String),
}

impl From<RepositoryError> for ExpenseError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ExpenseError::NotFound,
            RepositoryError::DatabaseError(msg) | RepositoryError::ConstraintViolation(msg) => {
                tracing::error!(error = %msg, "expense storage failure");
                ExpenseError::StorageFailure(msg)
            }
        }
    }
}

/// Trait defining expense operations.
///
/// `caller` is the identity the auth middleware attached to the request, or
/// `None` when there was none; every operation rejects `None` itself.
#[async_trait]
pub trait ExpenseService: Send + Sync {
    /// Every expense in storage, regardless of owner
    async fn list_all(&self, caller: Option<Uuid>) -> Result<Vec<Expense>, ExpenseError>;

    /// Every expense owned by `user_id`
    async fn list_for_user(
        &self,
        caller: Option<Uuid>,
        user_id: &str,
    ) -> Result<Vec<Expense>, ExpenseError>;

    /// Create an expense owned by the caller
    async fn create_expense(
        &self,
        caller: Option<Uuid>,
        request: CreateExpenseRequest,
    ) -> Result<ExpenseWithOwner, ExpenseError>;

    /// Fetch a single expense by ID
    async fn get_expense(
        &self,
        caller: Option<Uuid>,
        expense_id: &str,
    ) -> Result<Expense, ExpenseError>;

    /// Apply a partial update to an expense the caller owns
    async fn update_expense(
        &self,
        caller: Option<Uuid>,
        expense_id: &str,
        request: UpdateExpenseRequest,
    ) -> Result<Expense, ExpenseError>;

    /// Permanently remove an expense the caller owns
    async fn delete_expense(
        &self,
        caller: Option<Uuid>,
        expense_id: &str,
    ) -> Result<(), ExpenseError>;
}

/// Implementation of ExpenseService
pub struct ExpenseServiceImpl {
    expense_repository: Arc<dyn ExpenseRepository>,
    user_repository: Arc<dyn UserRepository>,
}

impl ExpenseServiceImpl {
    pub fn new(
        expense_repository: Arc<dyn ExpenseRepository>,
        user_repository: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            expense_repository,
            user_repository,
        }
    }
}

#[async_trait]
impl ExpenseService for ExpenseServiceImpl {
    async fn list_all(&self, caller: Option<Uuid>) -> Result<Vec<Expense>, ExpenseError> {
        require_caller(caller)?;
        // Not scoped to the caller
        Ok(self.expense_repository.find_all().await?)
    }

    async fn list_for_user(
        &self,
        caller: Option<Uuid>,
        user_id: &str,
    ) -> Result<Vec<Expense>, ExpenseError> {
        require_caller(caller)?;
        let user_id = parse_identifier(user_id)?;
        Ok(self.expense_repository.find_by_user(user_id).await?)
    }

    async fn create_expense(
        &self,
        caller: Option<Uuid>,
        request: CreateExpenseRequest,
    ) -> Result<ExpenseWithOwner, ExpenseError> {
        let caller = require_caller(caller)?;
        request
            .validate()
            .map_err(|e| ExpenseError::ValidationFailure(describe_errors(&e)))?;

        let now = Utc::now();
        let expense = Expense {
            id: Uuid::new_v4(),
            description: request.description,
            amount: request.amount,
            user_id: caller,
            created_at: now,
            updated_at: now,
        };

        let expense = self.expense_repository.create(expense).await?;

        // The expense row references the caller, so a missing user here means
        // storage is inconsistent.
        let user = self
            .user_repository
            .find_by_id(caller)
            .await
            .map_err(|e| ExpenseError::StorageFailure(e.to_string()))?
            .ok_or_else(|| {
                tracing::error!(user_id = %caller, expense_id = %expense.id, "owner missing after insert");
                ExpenseError::StorageFailure("Failed to load user data".to_string())
            })?;

        tracing::info!(expense_id = %expense.id, user_id = %caller, "created expense");
        Ok(ExpenseWithOwner { expense, user })
    }

    async fn get_expense(
        &self,
        caller: Option<Uuid>,
        expense_id: &str,
    ) -> Result<Expense, ExpenseError> {
        require_caller(caller)?;
        let expense_id = parse_identifier(expense_id)?;

        // Readable by any authenticated caller; only writes go through the guard.
        self.expense_repository
            .find_by_id(expense_id)
            .await?
            .ok_or(ExpenseError::NotFound)
    }

    async fn update_expense(
        &self,
        caller: Option<Uuid>,
        expense_id: &str,
        request: UpdateExpenseRequest,
    ) -> Result<Expense, ExpenseError> {
        let OwnedExpense { caller, expense } =
            authorize_expense(self.expense_repository.as_ref(), caller, expense_id).await?;

        request
            .validate()
            .map_err(|e| ExpenseError::ValidationFailure(describe_errors(&e)))?;

        let merged = expense.merge(request, Utc::now());
        let updated = self.expense_repository.update(merged).await?;

        tracing::info!(expense_id = %updated.id, user_id = %caller, "updated expense");
        Ok(updated)
    }

    async fn delete_expense(
        &self,
        caller: Option<Uuid>,
        expense_id: &str,
    ) -> Result<(), ExpenseError> {
        let OwnedExpense { caller, expense } =
            authorize_expense(self.expense_repository.as_ref(), caller, expense_id).await?;

        self.expense_repository.delete(expense.id).await?;

        tracing::info!(expense_id = %expense.id, user_id = %caller, "deleted expense");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::User;
    use crate::test_utils::{MockExpenseRepository, MockUserRepository};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    struct Fixture {
        service: ExpenseServiceImpl,
        alice: User,
        bob: User,
    }

    fn fixture() -> Fixture {
        let users = Arc::new(MockUserRepository::new());
        let alice = users.insert("Alice", "alice@example.com");
        let bob = users.insert("Bob", "bob@example.com");
        let expenses = Arc::new(MockExpenseRepository::new());

        Fixture {
            service: ExpenseServiceImpl::new(expenses, users),
            alice,
            bob,
        }
    }

    fn coffee() -> CreateExpenseRequest {
        CreateExpenseRequest {
            description: "Coffee".to_string(),
            amount: Decimal::from_str("3.5").unwrap(),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_caller_as_owner() {
        let f = fixture();

        let created = f
            .service
            .create_expense(Some(f.alice.id), coffee())
            .await
            .unwrap();

        assert_eq!(created.expense.user_id, f.alice.id);
        assert_eq!(created.user.id, f.alice.id);
        assert_eq!(created.expense.description, "Coffee");
        assert_eq!(created.expense.created_at, created.expense.updated_at);
    }

    #[tokio::test]
    async fn test_create_ignores_owner_in_body() {
        let f = fixture();
        let body = serde_json::json!({
            "user_id": f.bob.id.to_string(),
            "description": "d",
            "amount": 5
        });
        let request: CreateExpenseRequest = serde_json::from_value(body).unwrap();

        let created = f
            .service
            .create_expense(Some(f.alice.id), request)
            .await
            .unwrap();

        assert_eq!(created.expense.user_id, f.alice.id);
        assert_eq!(created.expense.amount, Decimal::from(5));
    }

    #[tokio::test]
    async fn test_create_requires_caller() {
        let f = fixture();

        let result = f.service.create_expense(None, coffee()).await;

        assert!(matches!(result, Err(ExpenseError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_body() {
        let f = fixture();
        let request = CreateExpenseRequest {
            description: "Coffee".to_string(),
            amount: Decimal::ZERO,
        };

        let result = f.service.create_expense(Some(f.alice.id), request).await;

        match result {
            Err(ExpenseError::ValidationFailure(msg)) => assert!(msg.contains("amount")),
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_rejects_amount_the_column_cannot_hold() {
        let f = fixture();

        for amount in ["0.001", "10000000000"] {
            let request = CreateExpenseRequest {
                description: "Coffee".to_string(),
                amount: Decimal::from_str(amount).unwrap(),
            };
            let result = f.service.create_expense(Some(f.alice.id), request).await;
            assert!(
                matches!(result, Err(ExpenseError::ValidationFailure(_))),
                "{} should be rejected",
                amount
            );
        }

        let stored = f.service.list_all(Some(f.alice.id)).await.unwrap();
        assert!(stored.is_empty());
    }

    #[tokio::test]
    async fn test_create_with_unknown_user_is_storage_failure() {
        let f = fixture();

        let result = f.service.create_expense(Some(Uuid::new_v4()), coffee()).await;

        assert!(matches!(result, Err(ExpenseError::StorageFailure(_))));
    }

    #[tokio::test]
    async fn test_create_storage_error() {
        let users = Arc::new(MockUserRepository::new());
        let alice = users.insert("Alice", "alice@example.com");
        let service =
            ExpenseServiceImpl::new(Arc::new(MockExpenseRepository::with_failure()), users);

        let result = service.create_expense(Some(alice.id), coffee()).await;

        assert!(matches!(result, Err(ExpenseError::StorageFailure(_))));
    }

    #[tokio::test]
    async fn test_list_all_spans_owners() {
        let f = fixture();
        f.service
            .create_expense(Some(f.alice.id), coffee())
            .await
            .unwrap();
        f.service
            .create_expense(Some(f.bob.id), coffee())
            .await
            .unwrap();

        let all = f.service.list_all(Some(f.bob.id)).await.unwrap();
        assert_eq!(all.len(), 2);

        let anonymous = f.service.list_all(None).await;
        assert!(matches!(anonymous, Err(ExpenseError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_list_for_user_filters_by_owner() {
        let f = fixture();
        f.service
            .create_expense(Some(f.alice.id), coffee())
            .await
            .unwrap();
        f.service
            .create_expense(Some(f.alice.id), coffee())
            .await
            .unwrap();
        f.service
            .create_expense(Some(f.bob.id), coffee())
            .await
            .unwrap();

        // Cross-user listing is permitted
        let alices = f
            .service
            .list_for_user(Some(f.bob.id), &f.alice.id.to_string())
            .await
            .unwrap();

        assert_eq!(alices.len(), 2);
        assert!(alices.iter().all(|e| e.user_id == f.alice.id));
    }

    #[tokio::test]
    async fn test_list_for_user_rejects_malformed_id() {
        let f = fixture();

        let result = f
            .service
            .list_for_user(Some(f.alice.id), "not-a-uuid")
            .await;

        assert!(matches!(result, Err(ExpenseError::InvalidIdentifier)));
    }

    #[tokio::test]
    async fn test_get_does_not_check_ownership() {
        let f = fixture();
        let created = f
            .service
            .create_expense(Some(f.alice.id), coffee())
            .await
            .unwrap();

        let fetched = f
            .service
            .get_expense(Some(f.bob.id), &created.expense.id.to_string())
            .await
            .unwrap();

        assert_eq!(fetched, created.expense);
    }

    #[tokio::test]
    async fn test_get_errors() {
        let f = fixture();

        let missing = f
            .service
            .get_expense(Some(f.alice.id), &Uuid::new_v4().to_string())
            .await;
        assert!(matches!(missing, Err(ExpenseError::NotFound)));

        let malformed = f.service.get_expense(Some(f.alice.id), "not-a-uuid").await;
        assert!(matches!(malformed, Err(ExpenseError::InvalidIdentifier)));
    }

    #[tokio::test]
    async fn test_update_by_owner_merges_fields() {
        let f = fixture();
        let created = f
            .service
            .create_expense(Some(f.alice.id), coffee())
            .await
            .unwrap();

        let updated = f
            .service
            .update_expense(
                Some(f.alice.id),
                &created.expense.id.to_string(),
                UpdateExpenseRequest {
                    description: Some("x".to_string()),
                    amount: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.description, "x");
        assert_eq!(updated.id, created.expense.id);
        assert_eq!(updated.user_id, f.alice.id);
        assert_eq!(updated.amount, created.expense.amount);
        assert!(updated.updated_at >= created.expense.updated_at);
    }

    #[tokio::test]
    async fn test_update_and_delete_by_non_owner_are_forbidden() {
        let f = fixture();
        let created = f
            .service
            .create_expense(Some(f.alice.id), coffee())
            .await
            .unwrap();
        let id = created.expense.id.to_string();

        let update = f
            .service
            .update_expense(Some(f.bob.id), &id, UpdateExpenseRequest::default())
            .await;
        assert!(matches!(update, Err(ExpenseError::Forbidden)));

        let delete = f.service.delete_expense(Some(f.bob.id), &id).await;
        assert!(matches!(delete, Err(ExpenseError::Forbidden)));

        // Still there and unchanged
        let fetched = f.service.get_expense(Some(f.alice.id), &id).await.unwrap();
        assert_eq!(fetched, created.expense);
    }

    #[tokio::test]
    async fn test_update_rejects_invalid_amount() {
        let f = fixture();
        let created = f
            .service
            .create_expense(Some(f.alice.id), coffee())
            .await
            .unwrap();

        let result = f
            .service
            .update_expense(
                Some(f.alice.id),
                &created.expense.id.to_string(),
                UpdateExpenseRequest {
                    description: None,
                    amount: Some(Decimal::from(-2)),
                },
            )
            .await;

        assert!(matches!(result, Err(ExpenseError::ValidationFailure(_))));
    }

    #[tokio::test]
    async fn test_delete_twice_is_not_found() {
        let f = fixture();
        let created = f
            .service
            .create_expense(Some(f.alice.id), coffee())
            .await
            .unwrap();
        let id = created.expense.id.to_string();

        f.service.delete_expense(Some(f.alice.id), &id).await.unwrap();

        let second = f.service.delete_expense(Some(f.alice.id), &id).await;
        assert!(matches!(second, Err(ExpenseError::NotFound)));
    }

    #[tokio::test]
    async fn test_malformed_ids_are_invalid_identifier() {
        let f = fixture();
        let caller = Some(f.alice.id);

        let update = f
            .service
            .update_expense(caller, "not-a-uuid", UpdateExpenseRequest::default())
            .await;
        let delete = f.service.delete_expense(caller, "not-a-uuid").await;

        assert!(matches!(update, Err(ExpenseError::InvalidIdentifier)));
        assert!(matches!(delete, Err(ExpenseError::InvalidIdentifier)));
    }
}
