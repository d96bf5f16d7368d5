//! 健康检查路由
//!
//! | 路径 | 方法 | 说明 | 认证 |
//! |------|------|------|------|
//! | /api/health | GET | 存活检查 + 存储可读性 | 无 |
//!
//! ```json
//! { "status": "ok", "version": "0.1.0", "environment": "development",
//!   "uptime_seconds": 42, "store": { "readable": true, "courses": 3 } }
//! ```

use std::sync::OnceLock;
use std::time::Instant;

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::core::ServerState;

static STARTED: OnceLock<Instant> = OnceLock::new();

pub fn router() -> Router<ServerState> {
    // First router build marks the start of uptime
    STARTED.get_or_init(Instant::now);
    Router::new().route("/api/health", get(health))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// ok | degraded
    status: &'static str,
    version: &'static str,
    environment: String,
    uptime_seconds: u64,
    store: StoreCheck,
}

#[derive(Debug, Serialize)]
pub struct StoreCheck {
    readable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    courses: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    let store = match state.structure.store().course_count() {
        Ok(count) => StoreCheck {
            readable: true,
            courses: Some(count),
            error: None,
        },
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not read the store");
            StoreCheck {
                readable: false,
                courses: None,
                error: Some(e.to_string()),
            }
        }
    };

    Json(HealthResponse {
        status: if store.readable { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.environment.clone(),
        uptime_seconds: STARTED.get_or_init(Instant::now).elapsed().as_secs(),
        store,
    })
}
