//! Festival site configuration / 节日网站配置

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use figment::providers::Serialized;
use serde::{Deserialize, Serialize};

use super::base::{LogConfig, ServerConfig};
use super::AppConfig;
use crate::constants::{buckets, STORAGE_LIST_LIMIT};

/// Command line arguments / 命令行参数
#[derive(Parser, Debug, Clone)]
#[command(
    name = "festival-site",
    version = "0.1.0",
    about = "Festival site content service\n节日网站内容服务"
)]
pub struct CliArgs {
    /// Configuration file path / 配置文件路径
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Configuration file path / 配置文件路径"
    )]
    pub config: Option<PathBuf>,

    /// Backend kind / 后端类型
    #[arg(
        long,
        value_name = "KIND",
        help = "Backend kind (supabase, memory) / 后端类型"
    )]
    pub backend: Option<String>,

    /// Backend project URL / 后端项目URL
    #[arg(long, value_name = "URL", help = "Backend project URL / 后端项目URL")]
    pub backend_url: Option<String>,

    /// Fixture file for the memory backend / 内存后端的数据文件
    #[arg(long, value_name = "FILE", help = "JSON fixture for the memory backend / 内存后端的JSON数据")]
    pub fixture: Option<PathBuf>,

    /// HTTP gateway address / HTTP网关地址
    #[arg(
        long,
        value_name = "ADDR",
        help = "HTTP gateway address (e.g., 0.0.0.0:8080) / HTTP网关地址"
    )]
    pub http_addr: Option<String>,

    /// Log level / 日志级别
    #[arg(
        long,
        value_name = "LEVEL",
        help = "Log level (trace, debug, info, warn, error) / 日志级别"
    )]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands / 子命令
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Load all site content and print it as JSON / 加载全部站点内容并输出JSON
    Dump,
    /// Load all content, refetch one section and print it / 加载全部内容，重新获取单个分区并输出
    Section {
        /// Section name, e.g. `events` or `heroContent` / 分区名称
        name: String,
    },
    /// List files in the admin documents bucket / 列出管理文档存储桶中的文件
    Documents,
    /// Serve the content over HTTP / 通过HTTP提供内容
    Serve,
    /// Print the effective configuration as TOML / 以TOML输出生效的配置
    Config,
}

/// Which backend implementation to talk to / 使用哪种后端实现
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Hosted REST backend / 托管REST后端
    Supabase,
    /// In-process store / 进程内存储
    Memory,
}

/// Backend connection configuration / 后端连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub kind: BackendKind,
    /// Project base URL / 项目基础URL
    pub url: String,
    /// Public (anon) API key / 公共API密钥
    pub anon_key: String,
    /// HTTP request timeout in milliseconds / HTTP请求超时（毫秒）
    pub request_timeout_ms: u64,
    /// Seed data for the memory backend / 内存后端的种子数据
    pub fixture: Option<PathBuf>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Supabase,
            url: String::new(),
            anon_key: String::new(),
            request_timeout_ms: 15_000,
            fixture: None,
        }
    }
}

/// Object storage configuration / 对象存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub event_posters_bucket: String,
    pub admin_documents_bucket: String,
    /// Maximum objects per listing / 每次列出的最大对象数
    pub list_limit: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            event_posters_bucket: buckets::EVENT_POSTERS.to_string(),
            admin_documents_bucket: buckets::ADMIN_DOCUMENTS.to_string(),
            list_limit: STORAGE_LIST_LIMIT,
        }
    }
}

/// Site application configuration / 站点应用配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SiteConfig {
    pub backend: BackendConfig,
    pub storage: StorageConfig,
    /// HTTP gateway configuration / HTTP网关配置
    pub http: ServerConfig,
    /// Logging configuration / 日志配置
    pub logging: LogConfig,
}

impl AppConfig for SiteConfig {
    const ENV_PREFIX: &'static str = "FESTIVAL_";
    const DEFAULT_FILE: &'static str = "festival-site.toml";

    fn default_config() -> Self {
        Self::default()
    }

    fn validate(&self) -> Result<()> {
        if self.backend.kind == BackendKind::Supabase {
            if self.backend.url.trim().is_empty() {
                bail!("backend.url is required for the supabase backend");
            }
            url::Url::parse(&self.backend.url)
                .with_context(|| format!("invalid backend.url: {}", self.backend.url))?;
            if self.backend.anon_key.trim().is_empty() {
                bail!("backend.anon_key is required for the supabase backend");
            }
        }
        if self.storage.list_limit == 0 {
            bail!("storage.list_limit must be positive");
        }
        Ok(())
    }
}

impl SiteConfig {
    /// Load configuration with CLI arguments override / 使用CLI参数覆盖加载配置
    pub fn load_with_cli(args: &CliArgs) -> Result<Self> {
        let mut figment = Self::figment(args.config.as_deref());

        if let Some(kind) = args.backend.as_ref() {
            figment = figment.merge(Serialized::default("backend.kind", kind.to_ascii_lowercase()));
        }
        if let Some(url) = args.backend_url.as_ref() {
            figment = figment.merge(Serialized::default("backend.url", url));
        }
        if let Some(fixture) = args.fixture.as_ref() {
            figment = figment.merge(Serialized::default("backend.fixture", fixture));
        }
        if let Some(addr) = args.http_addr.as_ref() {
            figment = figment.merge(Serialized::default("http.addr", addr));
        }
        if let Some(level) = args.log_level.as_ref() {
            figment = figment.merge(Serialized::default("logging.level", level));
        }

        let config: Self = figment
            .extract()
            .context("Failed to load configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Render as a TOML document that loads back to the same values
    /// 渲染为可重新加载为相同值的TOML文档
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to render configuration")
    }

    /// Load from a specific file without CLI overrides / 从指定文件加载（无CLI覆盖）
    pub fn load_from_file(path: &Path) -> Result<Self> {
        <Self as AppConfig>::load(Some(path))
    }
}
