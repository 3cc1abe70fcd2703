//! HTTP gateway for the festival site content
//! 节日站点内容的HTTP网关

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use super::routes::create_routes;
use crate::content::SiteDataStore;

/// HTTP gateway state / HTTP网关状态
#[derive(Clone, Debug)]
pub struct GatewayState {
    pub store: Arc<SiteDataStore>,
}

/// Create HTTP gateway router / 创建HTTP网关路由器
pub fn create_gateway_router(state: GatewayState) -> Router {
    create_routes(state).layer(CorsLayer::permissive())
}

/// Site content HTTP gateway / 站点内容HTTP网关
pub struct HttpGateway {
    addr: SocketAddr,
    store: Arc<SiteDataStore>,
}

impl HttpGateway {
    pub fn new(addr: SocketAddr, store: Arc<SiteDataStore>) -> Self {
        Self { addr, store }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Start the HTTP gateway / 启动HTTP网关
    pub async fn start(self) -> Result<()> {
        let (listener, app) = self.prepare().await?;
        if let Err(e) = axum::serve(listener, app).await {
            error!("HTTP gateway error: {}", e);
            return Err(e.into());
        }
        Ok(())
    }

    /// Start HTTP gateway with shutdown signal / 使用关闭信号启动HTTP网关
    pub async fn start_with_shutdown<F>(self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let (listener, app) = self.prepare().await?;
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
        {
            error!("HTTP gateway error: {}", e);
            return Err(e.into());
        }
        Ok(())
    }

    async fn prepare(self) -> Result<(tokio::net::TcpListener, Router)> {
        let app = create_gateway_router(GatewayState { store: self.store });
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        info!("HTTP gateway listening on {}", listener.local_addr()?);
        Ok((listener, app))
    }
}
