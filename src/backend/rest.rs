//! HTTP client for the hosted backend (REST tables, RPC, storage, auth)
//! 托管后端的HTTP客户端（REST表、RPC、存储、认证）

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{
    AuthService, AuthUser, BackendError, BackendResult, ContentBackend, FileUpload, ListOptions,
    ObjectInfo, ObjectStorage, SelectQuery, Session,
};
use crate::config::BackendConfig;

const REST_PREFIX: &str = "rest/v1";
const STORAGE_PREFIX: &str = "storage/v1";
const AUTH_PREFIX: &str = "auth/v1";

/// Client for a Supabase-style project / Supabase风格项目的客户端
///
/// Cloning shares the HTTP connection pool and the signed-in session.
/// 克隆会共享HTTP连接池和已登录会话。
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    session: Arc<RwLock<Option<Session>>>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
    user: TokenUser,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    id: String,
    email: Option<String>,
}

impl From<TokenResponse> for Session {
    fn from(token: TokenResponse) -> Self {
        Session {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_in: token.expires_in,
            user: AuthUser {
                id: token.user.id,
                email: token.user.email,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct StorageListEntry {
    name: String,
    id: Option<String>,
    created_at: Option<String>,
    metadata: Option<StorageListMetadata>,
}

#[derive(Debug, Deserialize)]
struct StorageListMetadata {
    size: Option<u64>,
}

impl SupabaseClient {
    /// Create a client with default HTTP settings / 使用默认HTTP设置创建客户端
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self::with_http_client(reqwest::Client::new(), base_url, anon_key)
    }

    /// Create a client around an existing reqwest client / 基于已有reqwest客户端创建
    pub fn with_http_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        anon_key: impl Into<String>,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            session: Arc::new(RwLock::new(None)),
        }
    }

    /// Build a client from backend configuration / 根据后端配置构建客户端
    pub fn from_config(config: &BackendConfig) -> BackendResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;
        Ok(Self::with_http_client(http, &config.url, &config.anon_key))
    }

    /// Project base URL / 项目基础URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn join_url(&self, prefix: &str, path: &str) -> String {
        let p = path.trim_start_matches('/');
        if p.is_empty() {
            format!("{}/{}", self.base_url, prefix)
        } else {
            format!("{}/{}/{}", self.base_url, prefix, p)
        }
    }

    fn bearer(&self) -> String {
        match self.session.read().as_ref() {
            Some(session) => session.access_token.clone(),
            None => self.anon_key.clone(),
        }
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer())
    }

    /// Send and return the parsed JSON body (`Value::Null` when empty)
    /// 发送请求并返回解析后的JSON响应体（为空时为 `Value::Null`）
    async fn send(&self, req: RequestBuilder) -> BackendResult<Value> {
        let resp = req.send().await?;
        let status = resp.status();
        let body = resp.bytes().await?;

        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                message: extract_error_message(status, &body),
            });
        }

        if body.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&body)?)
    }

    fn store_session(&self, session: &Session) {
        *self.session.write() = Some(session.clone());
    }
}

/// Pull a human-readable message out of an error body
/// 从错误响应体中提取可读消息
fn extract_error_message(status: StatusCode, body: &[u8]) -> String {
    if let Ok(json) = serde_json::from_slice::<Value>(body) {
        for key in ["message", "error_description", "msg", "error"] {
            if let Some(msg) = json.get(key).and_then(|v| v.as_str()) {
                if !msg.trim().is_empty() {
                    return msg.to_string();
                }
            }
        }
    }
    let text = String::from_utf8_lossy(body).trim().to_string();
    if !text.is_empty() {
        return text;
    }
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

fn select_params(query: &SelectQuery) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), query.columns.clone())];
    for (column, value) in &query.filters {
        params.push((column.clone(), format!("eq.{}", value)));
    }
    if let Some(order) = &query.order {
        let dir = if order.ascending { "asc" } else { "desc" };
        params.push(("order".to_string(), format!("{}.{}", order.column, dir)));
    }
    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    params
}

#[async_trait]
impl ContentBackend for SupabaseClient {
    async fn select(&self, table: &str, query: &SelectQuery) -> BackendResult<Vec<Value>> {
        let req = self
            .request(Method::GET, self.join_url(REST_PREFIX, table))
            .query(&select_params(query));
        match self.send(req).await? {
            Value::Array(rows) => Ok(rows),
            Value::Null => Ok(Vec::new()),
            other => Err(BackendError::Decode(format!(
                "expected an array of rows from {}, got {}",
                table, other
            ))),
        }
    }

    async fn rpc(&self, function: &str) -> BackendResult<Value> {
        let url = self.join_url(REST_PREFIX, &format!("rpc/{}", function));
        let req = self.request(Method::POST, url).json(&json!({}));
        self.send(req).await
    }

    async fn insert(&self, table: &str, row: &Value) -> BackendResult<()> {
        let req = self
            .request(Method::POST, self.join_url(REST_PREFIX, table))
            .header("Prefer", "return=minimal")
            .json(row);
        self.send(req).await.map(|_| ())
    }

    async fn update(
        &self,
        table: &str,
        column: &str,
        value: &str,
        patch: &Value,
    ) -> BackendResult<()> {
        let req = self
            .request(Method::PATCH, self.join_url(REST_PREFIX, table))
            .query(&[(column, format!("eq.{}", value))])
            .header("Prefer", "return=minimal")
            .json(patch);
        self.send(req).await.map(|_| ())
    }

    async fn delete(&self, table: &str, column: &str, value: &str) -> BackendResult<()> {
        let req = self
            .request(Method::DELETE, self.join_url(REST_PREFIX, table))
            .query(&[(column, format!("eq.{}", value))]);
        self.send(req).await.map(|_| ())
    }
}

#[async_trait]
impl ObjectStorage for SupabaseClient {
    async fn upload(&self, bucket: &str, path: &str, file: &FileUpload) -> BackendResult<()> {
        let url = self.join_url(STORAGE_PREFIX, &format!("object/{}/{}", bucket, path));
        let content_type = file
            .content_type
            .clone()
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let req = self
            .request(Method::POST, url)
            .header("content-type", content_type)
            .header("x-upsert", "false")
            .body(file.bytes.clone());
        self.send(req).await.map(|_| ())
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> BackendResult<()> {
        let url = self.join_url(STORAGE_PREFIX, &format!("object/{}", bucket));
        let req = self
            .request(Method::DELETE, url)
            .json(&json!({ "prefixes": paths }));
        self.send(req).await.map(|_| ())
    }

    async fn list(&self, bucket: &str, options: &ListOptions) -> BackendResult<Vec<ObjectInfo>> {
        let url = self.join_url(STORAGE_PREFIX, &format!("object/list/{}", bucket));
        let order = if options.newest_first { "desc" } else { "asc" };
        let body = json!({
            "prefix": options.prefix,
            "limit": options.limit,
            "offset": options.offset,
            "sortBy": { "column": "created_at", "order": order },
        });
        let value = self.send(self.request(Method::POST, url).json(&body)).await?;
        let entries: Vec<StorageListEntry> = match value {
            Value::Null => Vec::new(),
            other => serde_json::from_value(other)?,
        };
        Ok(entries
            .into_iter()
            .map(|e| ObjectInfo {
                id: e.id,
                name: e.name,
                size: e.metadata.and_then(|m| m.size),
                created_at: e.created_at,
            })
            .collect())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/{}/object/public/{}/{}",
            self.base_url,
            STORAGE_PREFIX,
            bucket,
            path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl AuthService for SupabaseClient {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> BackendResult<Session> {
        let url = self.join_url(AUTH_PREFIX, "token?grant_type=password");
        let req = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }));
        let token: TokenResponse = serde_json::from_value(self.send(req).await?)?;
        let session = Session::from(token);
        self.store_session(&session);
        tracing::debug!(user_id = %session.user.id, "signed in");
        Ok(session)
    }

    async fn refresh_session(&self, refresh_token: &str) -> BackendResult<Session> {
        let url = self.join_url(AUTH_PREFIX, "token?grant_type=refresh_token");
        let req = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&json!({ "refresh_token": refresh_token }));
        let token: TokenResponse = serde_json::from_value(self.send(req).await?)?;
        let session = Session::from(token);
        self.store_session(&session);
        Ok(session)
    }

    async fn sign_out(&self) -> BackendResult<()> {
        // The local session is dropped even if the server call fails
        // 即使服务端调用失败也会丢弃本地会话
        let Some(session) = self.session.write().take() else {
            return Ok(());
        };
        let req = self
            .http
            .post(self.join_url(AUTH_PREFIX, "logout"))
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token);
        self.send(req).await.map(|_| ())
    }

    fn current_session(&self) -> Option<Session> {
        self.session.read().clone()
    }
}
