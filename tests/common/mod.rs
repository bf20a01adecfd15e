use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use expense_tracker::routes::{AppState, create_router};
use expense_tracker::services::auth_service::{AuthService, AuthServiceImpl};
use expense_tracker::services::expense_service::{ExpenseService, ExpenseServiceImpl};
use expense_tracker::test_utils::{MockExpenseRepository, MockUserRepository};

/// Full router wired to in-memory storage
pub fn create_test_app() -> Router {
    create_test_app_with(MockExpenseRepository::new())
}

/// Full router over in-memory users and the given expense storage
pub fn create_test_app_with(expenses: MockExpenseRepository) -> Router {
    let users = Arc::new(MockUserRepository::new());
    let expenses = Arc::new(expenses);

    let auth_service: Arc<dyn AuthService> =
        Arc::new(AuthServiceImpl::new(users.clone(), "test_secret".to_string()));
    let expense_service: Arc<dyn ExpenseService> =
        Arc::new(ExpenseServiceImpl::new(expenses, users));

    create_router(AppState {
        auth_service,
        expense_service,
    })
}

/// Send one request through the router and return status plus JSON body
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// Register a user and log in, returning (user id, bearer token)
pub async fn register_and_login(app: &Router, name: &str, email: &str) -> (String, String) {
    let (status, user) = send(
        app,
        "POST",
        "/register",
        None,
        Some(serde_json::json!({
            "name": name,
            "email": email,
            "password": "password123"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, token) = send(
        app,
        "POST",
        "/login",
        None,
        Some(serde_json::json!({
            "email": email,
            "password": "password123"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    (
        user["id"].as_str().unwrap().to_string(),
        token["token"].as_str().unwrap().to_string(),
    )
}
