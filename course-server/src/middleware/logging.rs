//! 请求日志中间件
//!
//! 每个请求一条开始日志、一条结束日志，字段统一，便于按 request_id 关联

use axum::{
    extract::{MatchedPath, Request},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::time::Instant;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// 请求日志中间件
///
/// - 请求 ID: 沿用 `x-request-id`，没有则生成，并回写到响应头
/// - 路由模板 (`/api/courses/{course_id}/...`) 而非具体路径
/// - 调用者身份在令牌验证后由业务日志记录，这里不解析令牌
/// - 5xx 记 error，4xx 记 warn，其余 info
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();

    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let method = req.method().clone();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    tracing::debug!(request_id = %request_id, method = %method, route = %route, "Request started");

    let mut response = next.run(req).await;

    let status = response.status().as_u16();
    let latency_ms = start.elapsed().as_millis() as u64;
    match status {
        500.. => tracing::error!(request_id = %request_id, method = %method, route = %route, status, latency_ms, "Request failed"),
        400..500 => tracing::warn!(request_id = %request_id, method = %method, route = %route, status, latency_ms, "Request rejected"),
        _ => tracing::info!(request_id = %request_id, method = %method, route = %route, status, latency_ms, "Request completed"),
    }

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
