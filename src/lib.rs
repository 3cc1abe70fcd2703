//! festival-site: content layer for the festival website
//! festival-site：节日网站的内容层
//!
//! Public pages read structured site content (hero text, events, gallery,
//! team, ...) from a hosted backend; the admin panel writes it back.
//! 公共页面从托管后端读取结构化站点内容；管理面板负责写回。

// Shared modules / 共享模块
pub mod backend;
pub mod config;
pub mod constants;

// Content layer / 内容层
pub mod admin;
pub mod auth;
pub mod content;
pub mod storage;

// Read-only HTTP surface / 只读HTTP接口
pub mod http;

// Re-exports / 重新导出
pub use backend::{AuthService, BackendError, BackendHandles, ContentBackend, ObjectStorage};
pub use content::{ContentError, ContentResult, Resource, SiteData, SiteDataStore};
