//! Festival site content service main entry point
//! 节日网站内容服务主入口点

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use festival_site::config::{init_tracing, CliArgs, Command, SiteConfig};
use festival_site::content::{AggregateStatus, SiteDataStore};
use festival_site::http::HttpGateway;
use festival_site::storage::StorageGateway;
use festival_site::BackendHandles;

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments / 解析命令行参数
    let args = CliArgs::parse();

    // Load configuration, then apply CLI overrides / 加载配置并应用命令行覆盖
    let config = SiteConfig::load_with_cli(&args)?;

    // Initialize logging with configuration / 使用配置初始化日志
    init_tracing(&config.logging.to_logging_config())?;
    tracing::info!(backend = ?config.backend.kind, command = ?args.command, "Festival site starting");

    let backends = BackendHandles::from_config(&config.backend)?;
    let store = Arc::new(SiteDataStore::new(backends.content.clone()));

    match args.command {
        Command::Config => print!("{}", config.to_toml()?),
        Command::Dump => {
            let snapshot = store.refetch().await;
            print_json(&snapshot)?;
            if snapshot.status == AggregateStatus::Error {
                anyhow::bail!(snapshot.error.unwrap_or_default());
            }
        }
        Command::Section { name } => {
            let snapshot = store.refetch().await;
            let data = snapshot
                .data
                .context(snapshot.error.unwrap_or_default())?;
            store.refetch_section_named(&name).await?;
            let data = store.data().unwrap_or(data);
            print_json(&data.section_value(&name)?)?;
        }
        Command::Documents => {
            let storage = StorageGateway::with_config(backends.storage, config.storage.clone());
            print_json(&storage.list_admin_documents().await?)?;
        }
        Command::Serve => {
            tracing::info!("  - HTTP gateway on: {}", config.http.addr);
            // Warm the cache; failures are served as the error state / 预热缓存；失败以错误状态提供
            let snapshot = store.refetch().await;
            tracing::info!(status = ?snapshot.status, source = ?snapshot.source, "Initial content load");

            let gateway = HttpGateway::new(config.http.addr, store);
            gateway
                .start_with_shutdown(async {
                    let _ = tokio::signal::ctrl_c().await;
                    tracing::info!("Shutdown signal received");
                })
                .await?;
        }
    }

    Ok(())
}
