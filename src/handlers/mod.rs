pub mod auth;
pub mod costs;
pub mod health;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::analytics::CostAnalyzer;
use crate::auth::{middleware::auth_middleware, JwtManager};

/// Shared application state available to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<CostAnalyzer>,
    pub jwt: Arc<JwtManager>,
}

pub fn router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/v1/auth/me", get(auth::me))
        .route("/api/v1/auth/refresh", post(auth::refresh))
        .route("/api/v1/costs/report", get(costs::get_report))
        .route("/api/v1/costs/forecast", get(costs::get_forecast))
        .route("/api/v1/costs/trends", get(costs::get_trends))
        .route("/api/v1/costs/breakdown", get(costs::get_breakdown))
        .route("/api/v1/costs/export", get(costs::export_csv))
        .layer(middleware::from_fn_with_state(state.jwt.clone(), auth_middleware));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(protected_routes)
        .with_state(state)
}
