use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::RepositoryError;
use crate::models::expense::Expense;

/// Trait defining expense repository operations.
///
/// Every call is a single statement; callers get no atomicity across calls.
#[async_trait]
pub trait ExpenseRepository: Send + Sync {
    /// Insert a new expense
    async fn create(&self, expense: Expense) -> Result<Expense, RepositoryError>;

    /// Overwrite description, amount and updated_at of an existing expense.
    /// Returns `NotFound` if the row is gone.
    async fn update(&self, expense: Expense) -> Result<Expense, RepositoryError>;

    /// Find an expense by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Expense>, RepositoryError>;

    /// Every expense in storage, oldest first
    async fn find_all(&self) -> Result<Vec<Expense>, RepositoryError>;

    /// Expenses owned by `user_id`, oldest first
    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Expense>, RepositoryError>;

    /// Delete an expense by ID. Returns `NotFound` if nothing was deleted.
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
}

/// PostgreSQL implementation of ExpenseRepository
pub struct PostgresExpenseRepository {
    pool: PgPool,
}

impl PostgresExpenseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExpenseRepository for PostgresExpenseRepository {
    async fn create(&self, expense: Expense) -> Result<Expense, RepositoryError> {
        let created = sqlx::query_as::<_, Expense>(
            r#"
            INSERT INTO expenses (id, description, amount, user_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, description, amount, user_id, created_at, updated_at
            "#,
        )
        .bind(expense.id)
        .bind(&expense.description)
        .bind(expense.amount)
        .bind(expense.user_id)
        .bind(expense.created_at)
        .bind(expense.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn update(&self, expense: Expense) -> Result<Expense, RepositoryError> {
        // owner is written once, on insert
        let updated = sqlx::query_as::<_, Expense>(
            r#"
            UPDATE expenses
            SET description = $2,
                amount = $3,
                updated_at = $4
            WHERE id = $1
            RETURNING id, description, amount, user_id, created_at, updated_at
            "#,
        )
        .bind(expense.id)
        .bind(&expense.description)
        .bind(expense.amount)
        .bind(expense.updated_at)
        .fetch_optional(&self.pool)
        .await?;

        updated.ok_or(RepositoryError::NotFound)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Expense>, RepositoryError> {
        let expense = sqlx::query_as::<_, Expense>(
            r#"
            SELECT id, description, amount, user_id, created_at, updated_at
            FROM expenses
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(expense)
    }

    async fn find_all(&self) -> Result<Vec<Expense>, RepositoryError> {
        let expenses = sqlx::query_as::<_, Expense>(
            r#"
            SELECT id, description, amount, user_id, created_at, updated_at
            FROM expenses
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(expenses)
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Expense>, RepositoryError> {
        let expenses = sqlx::query_as::<_, Expense>(
            r#"
            SELECT id, description, amount, user_id, created_at, updated_at
            FROM expenses
            WHERE user_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(expenses)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            DELETE FROM expenses
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            Err(RepositoryError::NotFound)
        } else {
            Ok(())
        }
    }
}
