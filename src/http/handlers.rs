//! HTTP handlers for the content gateway
//! 内容网关的HTTP处理器
//!
//! Every content response carries the `status` / `data` / `error` tri-state
//! of the aggregate, so a client can render stale data next to an error.
//! 每个内容响应都携带聚合的 `status` / `data` / `error` 三态，客户端可以在错误旁显示旧数据。

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::gateway::GatewayState;
use crate::content::{AggregateSnapshot, AggregateStatus, ContentError, Resource};

/// One aggregate key with the aggregate's status / 带聚合状态的单个聚合键
#[derive(Debug, Serialize)]
pub struct SectionResponse {
    pub section: String,
    pub status: AggregateStatus,
    pub data: Value,
    pub error: Option<String>,
}

/// HTTP status for a content error / 内容错误对应的HTTP状态码
pub fn error_status(err: &ContentError) -> StatusCode {
    match err {
        ContentError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        ContentError::Auth => StatusCode::UNAUTHORIZED,
        ContentError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_GATEWAY,
    }
}

fn snapshot_response(snapshot: AggregateSnapshot) -> Response {
    let code = if snapshot.data.is_some() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(snapshot)).into_response()
}

fn error_response(err: &ContentError) -> Response {
    let body = serde_json::json!({
        "status": AggregateStatus::Error,
        "data": Value::Null,
        "error": err.to_string(),
    });
    (error_status(err), Json(body)).into_response()
}

/// Load the aggregate on first use / 首次使用时加载聚合
async fn loaded_snapshot(state: &GatewayState) -> AggregateSnapshot {
    if state.store.status() == AggregateStatus::Empty {
        debug!("Aggregate not loaded yet, fetching");
        return state.store.refetch().await;
    }
    state.store.snapshot()
}

fn section_response(
    name: &str,
    snapshot: &AggregateSnapshot,
    error: Option<String>,
) -> Result<SectionResponse, ContentError> {
    let data = match &snapshot.data {
        Some(data) => data.section_value(name)?,
        None => Value::Null,
    };
    Ok(SectionResponse {
        section: name.to_string(),
        status: snapshot.status,
        data,
        error: error.or_else(|| snapshot.error.clone()),
    })
}

/// Health check endpoint / 健康检查端点
/// GET /health
pub async fn health_check(State(state): State<GatewayState>) -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "content": state.store.status(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "service": "festival-site"
    }))
}

/// Whole aggregate / 完整聚合
/// GET /api/content
pub async fn get_content(State(state): State<GatewayState>) -> Response {
    snapshot_response(loaded_snapshot(&state).await)
}

/// Reload the whole aggregate / 重新加载完整聚合
/// POST /api/content/refresh
pub async fn refresh_content(State(state): State<GatewayState>) -> Response {
    snapshot_response(state.store.refetch().await)
}

/// One aggregate key / 单个聚合键
/// GET /api/content/{section}
pub async fn get_section(
    State(state): State<GatewayState>,
    Path(section): Path<String>,
) -> Response {
    if let Err(e) = section.parse::<Resource>() {
        return error_response(&e);
    }
    let snapshot = loaded_snapshot(&state).await;
    match section_response(&section, &snapshot, None) {
        Ok(body) if snapshot.data.is_some() => (StatusCode::OK, Json(body)).into_response(),
        Ok(body) => (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response(),
        Err(e) => error_response(&e),
    }
}

/// Re-query one section and merge it / 重新查询单个分区并合并
/// POST /api/content/{section}/refresh
///
/// A failed refetch answers 502 with the previous section data.
/// 重新查询失败时返回502并附带先前的分区数据。
pub async fn refresh_section(
    State(state): State<GatewayState>,
    Path(section): Path<String>,
) -> Response {
    if let Err(e) = section.parse::<Resource>() {
        return error_response(&e);
    }
    let outcome = state.store.refetch_section_named(&section).await;
    let snapshot = state.store.snapshot();

    let (code, error) = match (&outcome, &snapshot.data) {
        (Err(e), _) => (error_status(e), Some(e.to_string())),
        (Ok(()), None) => (
            StatusCode::CONFLICT,
            Some("content has not been loaded".to_string()),
        ),
        (Ok(()), Some(_)) => (StatusCode::OK, None),
    };
    match section_response(&section, &snapshot, error) {
        Ok(body) => (code, Json(body)).into_response(),
        Err(e) => error_response(&e),
    }
}
