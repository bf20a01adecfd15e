pub mod auth;
pub mod expense;
pub mod user;

pub use auth::{AuthToken, LoginRequest};
pub use expense::{CreateExpenseRequest, Expense, ExpenseWithOwner, UpdateExpenseRequest};
pub use user::{CreateUserRequest, User};
