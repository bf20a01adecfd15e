pub mod auth_service;
pub mod expense_service;
pub mod ownership;
