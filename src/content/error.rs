//! Error types for the content layer
//! 内容层的错误类型

use thiserror::Error;

use super::resource::Resource;
use crate::backend::BackendError;
use crate::constants::AUTH_FAILURE_MESSAGE;

/// Content layer error taxonomy / 内容层错误分类
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContentError {
    /// A read failed or a single-row expectation was violated / 读取失败或单行约束被违反
    #[error("{message}")]
    Query { resource: Resource, message: String },

    /// Both the batched and the parallel fetch failed / 批量获取和并行获取均失败
    #[error("{0}")]
    Aggregate(String),

    /// Upload or forced delete failed / 上传或强制删除失败
    #[error("{0}")]
    Storage(String),

    /// Insert, update or delete failed; carries the backend message verbatim
    /// 插入、更新或删除失败；原样携带后端消息
    #[error("{0}")]
    Write(String),

    /// Sign-in failed for any reason / 任何原因导致的登录失败
    #[error("{}", AUTH_FAILURE_MESSAGE)]
    Auth,

    /// Configuration could not be turned into a working backend / 配置无法构建可用后端
    #[error("Configuration error: {0}")]
    Config(String),

    /// Caller supplied something unusable / 调用方提供了无效输入
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ContentError {
    /// Wrap a backend failure for a resource read / 包装资源读取的后端错误
    pub fn query(resource: Resource, err: impl std::fmt::Display) -> Self {
        ContentError::Query {
            resource,
            message: err.to_string(),
        }
    }

    pub fn storage(err: BackendError) -> Self {
        ContentError::Storage(err.to_string())
    }

    pub fn write(err: BackendError) -> Self {
        ContentError::Write(err.to_string())
    }
}

/// Result type alias for content operations / 内容操作的结果类型别名
pub type ContentResult<T> = Result<T, ContentError>;
