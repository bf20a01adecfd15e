use axum::{
    Router,
    extract::FromRef,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers::auth_handlers::{login_handler, register_handler};
use crate::handlers::expense_handlers::{
    create_expense_handler, delete_expense_handler, get_expense_handler, list_expenses_handler,
    list_user_expenses_handler, update_expense_handler,
};
use crate::handlers::{ErrorResponse, MessageResponse};
use crate::middleware::auth_middleware::auth_middleware;
use crate::models::auth::{AuthToken, LoginRequest};
use crate::models::expense::{
    CreateExpenseRequest, Expense, ExpenseWithOwner, UpdateExpenseRequest,
};
use crate::models::user::{CreateUserRequest, User};
use crate::services::auth_service::AuthService;
use crate::services::expense_service::ExpenseService;

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::auth_handlers::register_handler,
        crate::handlers::auth_handlers::login_handler,
        crate::handlers::expense_handlers::list_expenses_handler,
        crate::handlers::expense_handlers::list_user_expenses_handler,
        crate::handlers::expense_handlers::create_expense_handler,
        crate::handlers::expense_handlers::get_expense_handler,
        crate::handlers::expense_handlers::update_expense_handler,
        crate::handlers::expense_handlers::delete_expense_handler,
    ),
    components(
        schemas(
            User,
            CreateUserRequest,
            LoginRequest,
            AuthToken,
            Expense,
            ExpenseWithOwner,
            CreateExpenseRequest,
            UpdateExpenseRequest,
            ErrorResponse,
            MessageResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration and login"),
        (name = "expenses", description = "Expense records")
    ),
    info(
        title = "Expense Tracker API",
        version = "0.1.0",
        description = "REST API for tracking expenses per user",
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthService>,
    pub expense_service: Arc<dyn ExpenseService>,
}

impl FromRef<AppState> for Arc<dyn AuthService> {
    fn from_ref(state: &AppState) -> Self {
        state.auth_service.clone()
    }
}

impl FromRef<AppState> for Arc<dyn ExpenseService> {
    fn from_ref(state: &AppState) -> Self {
        state.expense_service.clone()
    }
}

/// Build the application router.
///
/// `/expenses` routes sit behind the bearer-token middleware; registration,
/// login, health and docs are open.
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/expenses",
            get(list_expenses_handler).post(create_expense_handler),
        )
        .route("/expenses/user/{user_id}", get(list_user_expenses_handler))
        .route(
            "/expenses/{id}",
            get(get_expense_handler)
                .put(update_expense_handler)
                .delete(delete_expense_handler),
        )
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
        .merge(protected)
        .with_state(state)
        .merge(SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
