//! HTTP routes for the content gateway
//! 内容网关的HTTP路由

use axum::{
    routing::{get, post},
    Router,
};

use super::gateway::GatewayState;
use super::handlers::{get_content, get_section, health_check, refresh_content, refresh_section};

/// Create HTTP routes / 创建HTTP路由
pub(crate) fn create_routes(state: GatewayState) -> Router {
    Router::new()
        // Aggregate endpoints / 聚合端点
        .route("/api/content", get(get_content))
        .route("/api/content/refresh", post(refresh_content))
        .route("/api/content/{section}", get(get_section))
        .route("/api/content/{section}/refresh", post(refresh_section))
        // Health check endpoint / 健康检查端点
        .route("/health", get(health_check))
        .with_state(state)
}
