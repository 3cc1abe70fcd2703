//! Process-wide aggregate of all site content
//! 全站内容的进程级聚合缓存
//!
//! Loading tries the composite procedure first and falls back to the ten
//! individual queries run concurrently. Single sections can be re-queried
//! and merged in after an admin write.
//! 加载时先尝试组合过程，失败后回退为并发执行十个独立查询；管理员写入后可单独重新查询某个分区并合并。

use std::sync::Arc;

use futures::future::join_all;
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::error::{ContentError, ContentResult};
use super::model::{ResourceData, SiteData};
use super::raw;
use super::resource::Resource;
use crate::backend::ContentBackend;
use crate::constants::SITE_CONTENT_RPC;

/// Aggregate lifecycle / 聚合生命周期
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateStatus {
    Empty,
    Loading,
    Ready,
    Error,
}

/// Strategy that produced the current data / 产生当前数据的策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadSource {
    Batched,
    Parallel,
}

/// Point-in-time view of the aggregate / 聚合的时间点快照
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateSnapshot {
    pub status: AggregateStatus,
    pub loading: bool,
    pub error: Option<String>,
    pub source: Option<LoadSource>,
    pub data: Option<SiteData>,
}

#[derive(Debug)]
struct AggregateState {
    status: AggregateStatus,
    data: Option<SiteData>,
    error: Option<String>,
    source: Option<LoadSource>,
}

impl AggregateState {
    fn snapshot(&self) -> AggregateSnapshot {
        AggregateSnapshot {
            status: self.status,
            loading: self.status == AggregateStatus::Loading,
            error: self.error.clone(),
            source: self.source,
            data: self.data.clone(),
        }
    }
}

/// Run the single query of one resource and decode it
/// 执行单个资源的查询并解码
pub async fn fetch_resource(
    backend: &dyn ContentBackend,
    resource: Resource,
) -> ContentResult<ResourceData> {
    let rows = backend
        .select(resource.table(), &resource.query())
        .await
        .map_err(|e| ContentError::query(resource, e))?;
    raw::decode(resource, rows)
}

/// Shared site content cache / 共享的站点内容缓存
///
/// Created once and handed to consumers behind an `Arc`; dropping it discards
/// the cache.
/// 创建一次并通过 `Arc` 传递给使用方；丢弃即清空缓存。
#[derive(Debug)]
pub struct SiteDataStore {
    backend: Arc<dyn ContentBackend>,
    state: RwLock<AggregateState>,
}

impl SiteDataStore {
    pub fn new(backend: Arc<dyn ContentBackend>) -> Self {
        Self {
            backend,
            state: RwLock::new(AggregateState {
                status: AggregateStatus::Empty,
                data: None,
                error: None,
                source: None,
            }),
        }
    }

    pub fn snapshot(&self) -> AggregateSnapshot {
        self.state.read().snapshot()
    }

    pub fn status(&self) -> AggregateStatus {
        self.state.read().status
    }

    pub fn data(&self) -> Option<SiteData> {
        self.state.read().data.clone()
    }

    pub fn loading(&self) -> bool {
        self.state.read().status == AggregateStatus::Loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.read().error.clone()
    }

    /// Load everything: batched procedure, then parallel queries on failure
    /// 加载全部内容：先组合过程，失败后并行查询
    pub async fn refetch(&self) -> AggregateSnapshot {
        {
            let mut state = self.state.write();
            state.status = AggregateStatus::Loading;
            state.error = None;
        }

        let outcome = match self.fetch_batched().await {
            Ok(data) => Ok((data, LoadSource::Batched)),
            Err(batched) => {
                info!(error = %batched, "Batched content fetch failed, running parallel queries");
                self.fetch_parallel()
                    .await
                    .map(|data| (data, LoadSource::Parallel))
            }
        };

        let mut state = self.state.write();
        match outcome {
            Ok((data, source)) => {
                debug!(?source, degraded = data.degraded.len(), "Site content ready");
                state.status = AggregateStatus::Ready;
                state.data = Some(data);
                state.source = Some(source);
            }
            Err(e) => {
                error!(error = %e, "Site content unavailable");
                state.status = AggregateStatus::Error;
                state.error = Some(e.to_string());
            }
        }
        state.snapshot()
    }

    /// Primary path: one call to the composite procedure / 主路径：一次组合过程调用
    pub async fn fetch_batched(&self) -> ContentResult<SiteData> {
        let payload = self
            .backend
            .rpc(SITE_CONTENT_RPC)
            .await
            .map_err(|e| ContentError::Aggregate(e.to_string()))?;
        raw::decode_composite(payload)
    }

    /// Fallback path: all ten queries at once, waiting for every one to settle
    /// 回退路径：同时发出十个查询并等待全部完成
    ///
    /// Failed resources keep their empty default and are listed in
    /// `degraded`. Fails only when every query failed.
    /// 失败的资源保持空默认值并记录在 `degraded` 中；仅当全部查询失败时才返回错误。
    pub async fn fetch_parallel(&self) -> ContentResult<SiteData> {
        let backend = self.backend.as_ref();
        let results = join_all(
            Resource::ALL
                .into_iter()
                .map(|resource| async move { (resource, fetch_resource(backend, resource).await) }),
        )
        .await;

        let mut data = SiteData::default();
        let mut first_error = None;
        for (resource, result) in results {
            match result {
                Ok(fresh) => data.apply(fresh),
                Err(e) => {
                    warn!(%resource, error = %e, "Content query failed during fallback");
                    data.degraded.push(resource);
                    first_error.get_or_insert(e);
                }
            }
        }

        if data.degraded.len() == Resource::ALL.len() {
            let cause = first_error.map(|e| e.to_string()).unwrap_or_default();
            return Err(ContentError::Aggregate(format!(
                "all content queries failed: {}",
                cause
            )));
        }
        Ok(data)
    }

    /// Re-query one resource and merge it into the loaded aggregate
    /// 重新查询单个资源并合并到已加载的聚合中
    ///
    /// Does nothing before the first successful load. On failure the
    /// aggregate is left as it was.
    /// 首次成功加载前不执行任何操作；失败时聚合保持不变。
    pub async fn refetch_section(&self, resource: Resource) -> ContentResult<()> {
        if self.state.read().data.is_none() {
            debug!(%resource, "No aggregate loaded, skipping section refetch");
            return Ok(());
        }

        let fresh = match fetch_resource(self.backend.as_ref(), resource).await {
            Ok(fresh) => fresh,
            Err(e) => {
                warn!(%resource, error = %e, "Section refetch failed");
                return Err(e);
            }
        };

        if let Some(data) = self.state.write().data.as_mut() {
            data.apply(fresh);
        }
        debug!(%resource, "Section refreshed");
        Ok(())
    }

    /// [`refetch_section`](Self::refetch_section) by aggregate key
    /// 按聚合键调用 [`refetch_section`](Self::refetch_section)
    pub async fn refetch_section_named(&self, name: &str) -> ContentResult<()> {
        let resource: Resource = name.parse()?;
        self.refetch_section(resource).await
    }
}
