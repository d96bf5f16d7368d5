//! HTTP API
//!
//! - [`health`] - 健康检查 (公共)
//! - [`courses`] - 课程结构编辑 (修改需要 Bearer JWT)

pub mod courses;
pub mod health;

use std::time::Duration;

use axum::Router;
use axum::middleware as axum_middleware;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::core::ServerState;
use crate::middleware;

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router() -> Router<ServerState> {
    Router::new()
        // Course structure API - identity required
        .merge(courses::router())
        // Health API - public route
        .merge(health::router())
}

/// Build a fully configured application with all middleware and state
pub fn build_app(state: ServerState) -> Router {
    let timeout = Duration::from_millis(state.config.request_timeout_ms);
    let max_concurrent = state.config.max_concurrent_requests;

    build_router()
        .with_state(state)
        // ========== Tower HTTP Middleware ==========
        // CORS - Handle cross-origin requests
        .layer(CorsLayer::permissive())
        // Timeout - 408 when a handler exceeds the configured budget
        .layer(TimeoutLayer::new(timeout))
        // Concurrency - bound in-flight requests
        .layer(ConcurrencyLimitLayer::new(max_concurrent))
        // Request logging
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        // Trace - Request tracing
        .layer(TraceLayer::new_for_http())
}
