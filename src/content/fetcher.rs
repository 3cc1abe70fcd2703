//! Single-resource fetchers with {data, loading, error} state
//! 带有 {data, loading, error} 状态的单资源获取器
//!
//! A fetcher issues one read for its resource and keeps the last good data
//! when a later read fails.
//! 获取器为其资源发出一次读取，后续读取失败时保留上一次的有效数据。

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::error::{ContentError, ContentResult};
use super::model::{
    button_text, find_section, partition_team, AboutContent, ButtonLabel, EventCard,
    FooterContent, GalleryImage, HeroContent, OnboardingContent, SectionContent, Statistic,
    TeamMember,
};
use super::raw;
use super::resource::Resource;
use crate::backend::{ContentBackend, SelectQuery};

/// Turns the rows of one query into a view model / 将一次查询的行转换为视图模型
pub type Transform<T> = fn(Vec<Value>) -> ContentResult<T>;

/// Observable fetch state / 可观察的获取状态
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

impl<T> FetchState<T> {
    /// Mark a fetch as started; data is kept / 标记获取开始，保留数据
    pub fn begin(&mut self) {
        self.loading = true;
        self.error = None;
    }

    /// Settle a fetch; on error the previous data stays
    /// 结束获取；出错时保留之前的数据
    pub fn settle(&mut self, result: ContentResult<T>) {
        match result {
            Ok(data) => self.data = Some(data),
            Err(e) => self.error = Some(e.to_string()),
        }
        self.loading = false;
    }
}

/// Fetcher for one resource / 单个资源的获取器
#[derive(Debug)]
pub struct ResourceFetcher<T> {
    backend: Arc<dyn ContentBackend>,
    resource: Resource,
    query: SelectQuery,
    transform: Transform<T>,
    state: RwLock<FetchState<T>>,
}

impl<T: Clone> ResourceFetcher<T> {
    pub fn new(
        backend: Arc<dyn ContentBackend>,
        resource: Resource,
        query: SelectQuery,
        transform: Transform<T>,
    ) -> Self {
        Self {
            backend,
            resource,
            query,
            transform,
            state: RwLock::new(FetchState::default()),
        }
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    pub fn state(&self) -> FetchState<T> {
        self.state.read().clone()
    }

    pub fn data(&self) -> Option<T> {
        self.state.read().data.clone()
    }

    pub fn loading(&self) -> bool {
        self.state.read().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.read().error.clone()
    }

    /// Run the query and transform again / 重新执行查询与转换
    pub async fn refetch(&self) -> FetchState<T> {
        self.state.write().begin();

        let result = self.load().await;
        if let Err(e) = &result {
            warn!(resource = %self.resource, error = %e, "Resource fetch failed");
        } else {
            debug!(resource = %self.resource, "Resource fetched");
        }

        let mut state = self.state.write();
        state.settle(result);
        state.clone()
    }

    async fn load(&self) -> ContentResult<T> {
        let rows = self
            .backend
            .select(self.resource.table(), &self.query)
            .await
            .map_err(|e| ContentError::query(self.resource, e))?;
        (self.transform)(rows)
    }
}

impl ResourceFetcher<Vec<TeamMember>> {
    /// Staff partition of the current data / 当前数据中的教职工分组
    pub fn staff(&self) -> Vec<TeamMember> {
        let state = self.state.read();
        partition_team(state.data.as_deref().unwrap_or_default()).0
    }

    /// Student partition of the current data / 当前数据中的学生分组
    pub fn students(&self) -> Vec<TeamMember> {
        let state = self.state.read();
        partition_team(state.data.as_deref().unwrap_or_default()).1
    }
}

impl ResourceFetcher<Vec<SectionContent>> {
    pub fn get_by_key(&self, key: &str) -> Option<SectionContent> {
        let state = self.state.read();
        find_section(state.data.as_deref().unwrap_or_default(), key).cloned()
    }
}

impl ResourceFetcher<Vec<ButtonLabel>> {
    /// Button text, empty when unknown / 按钮文本，未知时为空
    pub fn text_for(&self, key: &str) -> String {
        let state = self.state.read();
        button_text(state.data.as_deref().unwrap_or_default(), key).to_string()
    }
}

fn fetcher_for<T: Clone>(
    backend: Arc<dyn ContentBackend>,
    resource: Resource,
    transform: Transform<T>,
) -> ResourceFetcher<T> {
    ResourceFetcher::new(backend, resource, resource.query(), transform)
}

pub fn hero_content(backend: Arc<dyn ContentBackend>) -> ResourceFetcher<HeroContent> {
    fetcher_for(backend, Resource::HeroContent, raw::hero_content)
}

pub fn about_content(backend: Arc<dyn ContentBackend>) -> ResourceFetcher<AboutContent> {
    fetcher_for(backend, Resource::AboutContent, raw::about_content)
}

pub fn onboarding_content(backend: Arc<dyn ContentBackend>) -> ResourceFetcher<OnboardingContent> {
    fetcher_for(backend, Resource::OnboardingContent, raw::onboarding_content)
}

pub fn footer_content(backend: Arc<dyn ContentBackend>) -> ResourceFetcher<FooterContent> {
    fetcher_for(backend, Resource::FooterContent, raw::footer_content)
}

pub fn statistics(backend: Arc<dyn ContentBackend>) -> ResourceFetcher<Vec<Statistic>> {
    fetcher_for(backend, Resource::Statistics, raw::statistics)
}

pub fn team_members(backend: Arc<dyn ContentBackend>) -> ResourceFetcher<Vec<TeamMember>> {
    fetcher_for(backend, Resource::TeamMembers, raw::team_members)
}

pub fn events(backend: Arc<dyn ContentBackend>) -> ResourceFetcher<Vec<EventCard>> {
    fetcher_for(backend, Resource::Events, raw::events)
}

pub fn gallery_images(backend: Arc<dyn ContentBackend>) -> ResourceFetcher<Vec<GalleryImage>> {
    fetcher_for(backend, Resource::GalleryImages, raw::gallery_images)
}

/// Gallery preview: only `image_url`, as a plain URL list
/// 图库预览：仅选择 `image_url`，返回URL列表
pub fn gallery_preview(backend: Arc<dyn ContentBackend>) -> ResourceFetcher<Vec<String>> {
    ResourceFetcher::new(
        backend,
        Resource::GalleryImages,
        SelectQuery::columns("image_url").order_asc("order"),
        raw::gallery_urls,
    )
}

pub fn section_content(backend: Arc<dyn ContentBackend>) -> ResourceFetcher<Vec<SectionContent>> {
    fetcher_for(backend, Resource::SectionContent, raw::section_content)
}

pub fn button_labels(backend: Arc<dyn ContentBackend>) -> ResourceFetcher<Vec<ButtonLabel>> {
    fetcher_for(backend, Resource::ButtonLabels, raw::button_labels)
}
