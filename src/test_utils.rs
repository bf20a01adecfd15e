//! In-memory repositories for unit tests and, behind the `test-utils`
//! feature, for the router tests under `tests/`.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::models::expense::Expense;
use crate::models::user::{CreateUserRequest, User};
use crate::repositories::RepositoryError;
use crate::repositories::expense_repository::ExpenseRepository;
use crate::repositories::user_repository::UserRepository;

#[derive(Default)]
pub struct MockUserRepository {
    users: Mutex<HashMap<String, User>>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a user directly, bypassing registration
    pub fn insert(&self, name: &str, email: &str) -> User {
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: "not-a-real-hash".to_string(),
            created_at: Utc::now(),
        };
        self.users
            .lock()
            .unwrap()
            .insert(user.email.clone(), user.clone());
        user
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn create(
        &self,
        user: CreateUserRequest,
        password_hash: String,
    ) -> Result<User, RepositoryError> {
        let mut users = self.users.lock().unwrap();

        if users.contains_key(&user.email) {
            return Err(RepositoryError::ConstraintViolation(
                "Email already exists".to_string(),
            ));
        }

        let new_user = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email.clone(),
            password_hash,
            created_at: Utc::now(),
        };

        users.insert(new_user.email.clone(), new_user.clone());
        Ok(new_user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let users = self.users.lock().unwrap();
        Ok(users.get(email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        let users = self.users.lock().unwrap();
        Ok(users.values().find(|u| u.id == id).cloned())
    }
}

#[derive(Default)]
pub struct MockExpenseRepository {
    expenses: Mutex<Vec<Expense>>,
    should_fail: bool,
}

impl MockExpenseRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails with a database error
    pub fn with_failure() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    fn check(&self) -> Result<(), RepositoryError> {
        if self.should_fail {
            return Err(RepositoryError::DatabaseError(
                "Database connection failed".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ExpenseRepository for MockExpenseRepository {
    async fn create(&self, expense: Expense) -> Result<Expense, RepositoryError> {
        self.check()?;
        self.expenses.lock().unwrap().push(expense.clone());
        Ok(expense)
    }

    async fn update(&self, expense: Expense) -> Result<Expense, RepositoryError> {
        self.check()?;
        let mut expenses = self.expenses.lock().unwrap();
        let stored = expenses
            .iter_mut()
            .find(|e| e.id == expense.id)
            .ok_or(RepositoryError::NotFound)?;
        stored.description = expense.description;
        stored.amount = expense.amount;
        stored.updated_at = expense.updated_at;
        Ok(stored.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Expense>, RepositoryError> {
        self.check()?;
        let expenses = self.expenses.lock().unwrap();
        Ok(expenses.iter().find(|e| e.id == id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Expense>, RepositoryError> {
        self.check()?;
        Ok(self.expenses.lock().unwrap().clone())
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Expense>, RepositoryError> {
        self.check()?;
        let expenses = self.expenses.lock().unwrap();
        Ok(expenses
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        self.check()?;
        let mut expenses = self.expenses.lock().unwrap();
        let before = expenses.len();
        expenses.retain(|e| e.id != id);
        if expenses.len() == before {
            Err(RepositoryError::NotFound)
        } else {
            Ok(())
        }
    }
}
