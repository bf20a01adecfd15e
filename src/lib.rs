//! Multi-user expense tracking REST API.
//!
//! Users register and log in for a bearer token, then manage expense
//! records. Writes to an expense are restricted to its owner through the
//! ownership guard in [`services::ownership`].

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod validation;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::Config;
pub use routes::{AppState, create_router};
