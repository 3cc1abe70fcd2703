//! Configuration management for the festival site
//! 节日网站的配置管理
//!
//! Configuration is layered with the following precedence (highest first):
//! 配置按以下优先级分层（从高到低）：
//! - Command line arguments / 命令行参数
//! - Environment variables (`FESTIVAL_` prefix, `__` for nesting) / 环境变量
//! - Configuration file (TOML) / 配置文件（TOML）
//! - Default values / 默认值

use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Base configuration shared by all applications / 所有应用程序共享的基础配置
pub mod base;
pub mod site;


pub use base::*;
pub use site::{BackendConfig, BackendKind, CliArgs, Command, SiteConfig, StorageConfig};

/// Base configuration trait / 基础配置特征
/// All application configurations should implement this trait
/// 所有应用程序配置都应该实现此特征
pub trait AppConfig: for<'de> Deserialize<'de> + Serialize + Clone + std::fmt::Debug {
    /// Environment variable prefix / 环境变量前缀
    const ENV_PREFIX: &'static str;

    /// File read when no explicit path is given / 未指定路径时读取的文件
    const DEFAULT_FILE: &'static str;

    /// Get default configuration values
    /// 获取默认配置值
    fn default_config() -> Self;

    /// Build the layered figment (defaults, file, environment)
    /// 构建分层的figment（默认值、文件、环境变量）
    fn figment(path: Option<&Path>) -> Figment {
        let file = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_FILE));

        Figment::new()
            .merge(Serialized::defaults(Self::default_config()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(Self::ENV_PREFIX).split("__"))
    }

    /// Load configuration from defaults, file and environment
    /// 从默认值、文件和环境变量加载配置
    fn load(path: Option<&Path>) -> Result<Self> {
        let config: Self = Self::figment(path)
            .extract()
            .context("Failed to load configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    /// 验证配置
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Common logging configuration / 通用日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) / 日志级别
    pub level: String,
    /// Log format (json, compact, pretty) / 日志格式
    pub format: String,
    /// Enable file logging / 启用文件日志
    pub file_enabled: bool,
    /// Log file path / 日志文件路径
    pub file_path: Option<PathBuf>,
}

static FILE_LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_enabled: false,
            file_path: None,
        }
    }
}

/// Initialize tracing based on logging configuration
/// 基于日志配置初始化跟踪
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{
        fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
    };

    type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

    fn stdout_layer(format: &str) -> BoxedLayer {
        let layer = fmt::layer()
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .with_level(true);
        match format {
            "json" => layer.json().boxed(),
            "compact" => layer.compact().boxed(),
            _ => layer.pretty().boxed(),
        }
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if config.level.trim().is_empty() {
            EnvFilter::new("info")
        } else {
            EnvFilter::new(config.level.clone())
        }
    });

    let mut layers: Vec<BoxedLayer> = vec![stdout_layer(config.format.as_str())];

    if config.file_enabled {
        if let Some(path) = config.file_path.as_ref() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create log dir: {}", parent.display()))?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("open log file: {}", path.display()))?;
            let (file_writer, guard) = tracing_appender::non_blocking(file);
            let _ = FILE_LOG_GUARD.set(guard);

            // Files always get machine-readable lines / 文件始终写入机器可读格式
            let file_layer = fmt::layer()
                .with_target(true)
                .with_timer(fmt::time::uptime())
                .with_level(true)
                .with_ansi(false)
                .with_writer(file_writer);
            let file_layer: BoxedLayer = if config.format == "json" {
                file_layer.json().boxed()
            } else {
                file_layer.compact().boxed()
            };
            layers.push(file_layer);
        }
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}
