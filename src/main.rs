use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use expense_tracker::config::Config;
use expense_tracker::repositories::expense_repository::PostgresExpenseRepository;
use expense_tracker::repositories::user_repository::PostgresUserRepository;
use expense_tracker::routes::{AppState, create_router};
use expense_tracker::services::auth_service::{AuthService, AuthServiceImpl};
use expense_tracker::services::expense_service::{ExpenseService, ExpenseServiceImpl};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("expense_tracker=info,tower_http=info")),
        )
        .init();

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;
    tracing::info!("connected to database");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("migrations completed");

    let user_repository = Arc::new(PostgresUserRepository::new(pool.clone()));
    let expense_repository = Arc::new(PostgresExpenseRepository::new(pool));

    let auth_service: Arc<dyn AuthService> = Arc::new(
        AuthServiceImpl::new(user_repository.clone(), config.jwt_secret.clone())
            .with_token_ttl(chrono::Duration::hours(config.token_ttl_hours)),
    );
    let expense_service: Arc<dyn ExpenseService> = Arc::new(ExpenseServiceImpl::new(
        expense_repository,
        user_repository,
    ));

    let app = create_router(AppState {
        auth_service,
        expense_service,
    });

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("server running on http://{}", addr);
    tracing::info!("API docs at http://{}/api/docs", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
    }
    tracing::info!("shutting down");
}
