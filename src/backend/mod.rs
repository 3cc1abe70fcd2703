//! Backend access layer
//! 后端访问层
//!
//! The site talks to a hosted backend-as-a-service through three seams:
//! 站点通过三个接口访问托管后端服务：
//!
//! - [`ContentBackend`]: table reads/writes and the composite RPC / 表读写与组合RPC
//! - [`ObjectStorage`]: bucket objects / 存储桶对象
//! - [`AuthService`]: password sessions / 密码会话
//!
//! [`SupabaseClient`] implements all three over HTTP; [`MemoryBackend`]
//! implements them in process for offline runs and tests.
//! [`SupabaseClient`] 通过HTTP实现全部接口；[`MemoryBackend`] 在进程内实现，用于离线运行和测试。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Debug;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{BackendConfig, BackendKind};
use crate::content::{ContentError, ContentResult};

pub mod memory;
pub mod rest;


pub use memory::MemoryBackend;
pub use rest::SupabaseClient;

/// Transport-level backend error / 传输层后端错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    /// Non-success HTTP status with the backend's message / 非成功HTTP状态及后端消息
    #[error("{message}")]
    Status { status: u16, message: String },

    /// Request never produced a response / 请求未得到响应
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response body did not have the expected shape / 响应体格式不符合预期
    #[error("Decode error: {0}")]
    Decode(String),
}

impl BackendError {
    /// HTTP status if the backend answered / 如果后端有响应则返回HTTP状态
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BackendError::Decode(err.to_string())
        } else {
            BackendError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Decode(err.to_string())
    }
}

/// Result type alias for backend calls / 后端调用的结果类型别名
pub type BackendResult<T> = Result<T, BackendError>;

/// Sort order for a select / 查询排序
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub ascending: bool,
}

/// Table read description / 表读取描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectQuery {
    /// Column list, `*` for all / 列列表，`*` 表示全部
    pub columns: String,
    /// Equality filters / 等值过滤
    pub filters: Vec<(String, String)>,
    pub order: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl Default for SelectQuery {
    fn default() -> Self {
        Self::all()
    }
}

impl SelectQuery {
    /// Select every column / 选择所有列
    pub fn all() -> Self {
        Self {
            columns: "*".to_string(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    /// Select specific columns / 选择指定列
    pub fn columns(columns: impl Into<String>) -> Self {
        Self {
            columns: columns.into(),
            ..Self::all()
        }
    }

    /// Add an equality filter / 添加等值过滤
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((column.into(), value.into()));
        self
    }

    /// Order ascending by a column / 按列升序
    pub fn order_asc(mut self, column: impl Into<String>) -> Self {
        self.order = Some(OrderBy {
            column: column.into(),
            ascending: true,
        });
        self
    }

    /// Order descending by a column / 按列降序
    pub fn order_desc(mut self, column: impl Into<String>) -> Self {
        self.order = Some(OrderBy {
            column: column.into(),
            ascending: false,
        });
        self
    }

    /// Limit row count / 限制行数
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Table access / 表访问
#[async_trait]
pub trait ContentBackend: Send + Sync + Debug {
    /// Read rows / 读取行
    async fn select(&self, table: &str, query: &SelectQuery) -> BackendResult<Vec<Value>>;

    /// Call a stored procedure without arguments / 调用无参数的存储过程
    async fn rpc(&self, function: &str) -> BackendResult<Value>;

    /// Insert one row / 插入一行
    async fn insert(&self, table: &str, row: &Value) -> BackendResult<()>;

    /// Patch the rows whose `column` equals `value` / 更新 `column` 等于 `value` 的行
    async fn update(&self, table: &str, column: &str, value: &str, patch: &Value)
        -> BackendResult<()>;

    /// Delete the rows whose `column` equals `value` / 删除 `column` 等于 `value` 的行
    async fn delete(&self, table: &str, column: &str, value: &str) -> BackendResult<()>;
}

/// Object metadata returned by a bucket listing / 存储桶列表返回的对象元数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectInfo {
    pub id: Option<String>,
    pub name: String,
    pub size: Option<u64>,
    pub created_at: Option<String>,
}

/// Bucket listing options / 存储桶列表选项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions {
    pub prefix: String,
    pub limit: usize,
    pub offset: usize,
    /// Newest first by creation time / 按创建时间从新到旧
    pub newest_first: bool,
}

impl ListOptions {
    /// Newest-first listing of the bucket root / 按时间倒序列出存储桶根目录
    pub fn newest_first(limit: usize) -> Self {
        Self {
            prefix: String::new(),
            limit,
            offset: 0,
            newest_first: true,
        }
    }
}

/// Upload payload / 上传内容
#[derive(Debug, Clone, PartialEq)]
pub struct FileUpload {
    /// Original file name, used for its extension / 原始文件名（用于扩展名）
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Object storage access / 对象存储访问
#[async_trait]
pub trait ObjectStorage: Send + Sync + Debug {
    /// Write an object at `path` / 在 `path` 写入对象
    async fn upload(&self, bucket: &str, path: &str, file: &FileUpload) -> BackendResult<()>;

    /// Remove objects by bucket-relative path / 按相对路径删除对象
    async fn remove(&self, bucket: &str, paths: &[String]) -> BackendResult<()>;

    /// List objects / 列出对象
    async fn list(&self, bucket: &str, options: &ListOptions) -> BackendResult<Vec<ObjectInfo>>;

    /// Public URL of an object; pure, no request / 对象的公共URL（纯计算，不发请求）
    fn public_url(&self, bucket: &str, path: &str) -> String;
}

/// Authenticated user / 已认证用户
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
}

/// Backend session / 后端会话
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
    pub user: AuthUser,
}

/// Password authentication / 密码认证
#[async_trait]
pub trait AuthService: Send + Sync + Debug {
    /// Exchange credentials for a session / 用凭据换取会话
    async fn sign_in_with_password(&self, email: &str, password: &str) -> BackendResult<Session>;

    /// Exchange a refresh token for a new session / 用刷新令牌换取新会话
    async fn refresh_session(&self, refresh_token: &str) -> BackendResult<Session>;

    /// Invalidate the current session / 使当前会话失效
    async fn sign_out(&self) -> BackendResult<()>;

    /// Session currently attached to outgoing requests / 当前附加到请求上的会话
    fn current_session(&self) -> Option<Session>;
}

/// All three seams served by one backend / 由同一后端提供的三个接口
#[derive(Debug, Clone)]
pub struct BackendHandles {
    pub content: Arc<dyn ContentBackend>,
    pub storage: Arc<dyn ObjectStorage>,
    pub auth: Arc<dyn AuthService>,
}

impl BackendHandles {
    /// Share one implementation across every seam / 在所有接口间共享同一实现
    pub fn shared<B>(backend: B) -> Self
    where
        B: ContentBackend + ObjectStorage + AuthService + 'static,
    {
        let backend = Arc::new(backend);
        Self {
            content: backend.clone(),
            storage: backend.clone(),
            auth: backend,
        }
    }

    /// Build the backend selected in the configuration / 构建配置中选定的后端
    pub fn from_config(config: &BackendConfig) -> ContentResult<Self> {
        match config.kind {
            BackendKind::Supabase => {
                let client = SupabaseClient::from_config(config)
                    .map_err(|e| ContentError::Config(e.to_string()))?;
                info!(url = %client.base_url(), "Using hosted backend");
                Ok(Self::shared(client))
            }
            BackendKind::Memory => {
                let backend = match config.fixture.as_deref() {
                    Some(path) => MemoryBackend::from_fixture_file(path).map_err(|e| {
                        ContentError::Config(format!(
                            "failed to load fixture {}: {:#}",
                            path.display(),
                            e
                        ))
                    })?,
                    None => {
                        warn!("Memory backend started without a fixture");
                        MemoryBackend::new()
                    }
                };
                info!("Using in-memory backend");
                Ok(Self::shared(backend))
            }
        }
    }
}
