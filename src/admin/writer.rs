//! Admin write path: create, update and delete site content
//! 管理写入路径：创建、更新和删除站点内容
//!
//! Writes go straight to the backend. Nothing here touches a cached
//! aggregate; callers refresh the affected section after a successful write.
//! 写入直接发往后端，不会修改任何缓存的聚合数据；调用方需在写入成功后刷新相应分区。

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{info, warn};

use super::drafts::{slugify, ContentDraft, EventDraft};
use crate::backend::{ContentBackend, FileUpload};
use crate::content::{ContentError, ContentResult, Resource};
use crate::storage::{object_path_from_url, StorageGateway};

/// Column every row is keyed by / 每行使用的主键列
const ID_COLUMN: &str = "id";

fn to_row<D: ContentDraft>(draft: &D) -> ContentResult<Map<String, Value>> {
    match serde_json::to_value(draft) {
        Ok(Value::Object(row)) => Ok(row),
        Ok(other) => Err(ContentError::InvalidInput(format!(
            "{} draft must serialize to an object, got {}",
            D::RESOURCE,
            other
        ))),
        Err(e) => Err(ContentError::InvalidInput(e.to_string())),
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

/// Admin content writer / 管理内容写入器
#[derive(Debug, Clone)]
pub struct AdminWriter {
    backend: Arc<dyn ContentBackend>,
    storage: StorageGateway,
}

impl AdminWriter {
    pub fn new(backend: Arc<dyn ContentBackend>, storage: StorageGateway) -> Self {
        Self { backend, storage }
    }

    /// Insert a new row / 插入新行
    ///
    /// Returns the minted id when the draft supplies one (events).
    /// 如果载荷生成了ID（活动），则返回该ID。
    pub async fn create<D: ContentDraft>(&self, draft: &D) -> ContentResult<Option<String>> {
        draft.validate()?;
        let mut row = to_row(draft)?;
        let id = draft.new_id();
        if let Some(id) = &id {
            row.insert(ID_COLUMN.to_string(), Value::String(id.clone()));
        }

        let table = D::RESOURCE.table();
        self.backend
            .insert(table, &Value::Object(row))
            .await
            .map_err(ContentError::write)?;
        info!(table, id = id.as_deref().unwrap_or("-"), "Row created");
        Ok(id)
    }

    /// Patch a row and stamp `updated_at` / 更新行并写入 `updated_at`
    pub async fn update<D: ContentDraft>(&self, id: &str, draft: &D) -> ContentResult<()> {
        draft.validate()?;
        let row = to_row(draft)?;
        self.patch(D::RESOURCE, id, row).await
    }

    /// Delete a row by id / 按ID删除行
    pub async fn delete(&self, resource: Resource, id: &str) -> ContentResult<()> {
        let table = resource.table();
        self.backend
            .delete(table, ID_COLUMN, id)
            .await
            .map_err(ContentError::write)?;
        info!(table, id, "Row deleted");
        Ok(())
    }

    async fn patch(
        &self,
        resource: Resource,
        id: &str,
        mut row: Map<String, Value>,
    ) -> ContentResult<()> {
        row.insert("updated_at".to_string(), Value::String(now_rfc3339()));
        let table = resource.table();
        self.backend
            .update(table, ID_COLUMN, id, &Value::Object(row))
            .await
            .map_err(ContentError::write)?;
        info!(table, id, "Row updated");
        Ok(())
    }

    /// Create an event, optionally uploading its poster first
    /// 创建活动，可选先上传海报
    ///
    /// The id is the title's slug; an existing id surfaces as the store's
    /// write error.
    /// ID为标题的slug；已存在的ID会以存储的写入错误返回。
    pub async fn create_event(
        &self,
        draft: &EventDraft,
        poster: Option<&FileUpload>,
    ) -> ContentResult<String> {
        draft.validate()?;
        let mut draft = draft.clone();
        if let Some(file) = poster {
            draft.image = self
                .storage
                .upload(self.storage.event_posters_bucket(), file)
                .await?;
        }
        let id = self.create(&draft).await?;
        Ok(id.unwrap_or_else(|| slugify(&draft.title)))
    }

    /// Update an event; a new poster replaces the old one
    /// 更新活动；新海报会替换旧海报
    ///
    /// The upload runs first. Only after it succeeds is the previous image
    /// deleted, and a failed delete is logged without failing the update.
    /// 先执行上传；仅在上传成功后才删除旧图片，删除失败只记录日志而不影响更新。
    pub async fn update_event(
        &self,
        id: &str,
        draft: &EventDraft,
        poster: Option<&FileUpload>,
    ) -> ContentResult<()> {
        draft.validate()?;
        let mut draft = draft.clone();

        if let Some(file) = poster {
            let bucket = self.storage.event_posters_bucket();
            let new_url = self.storage.upload(bucket, file).await?;
            if !draft.image.is_empty() {
                if let Err(e) = self.storage.delete(bucket, &draft.image).await {
                    warn!(event = id, error = %e, "Failed to delete previous poster");
                }
            }
            draft.image = new_url;
        }

        self.patch(Resource::Events, id, to_row(&draft)?).await
    }

    pub async fn delete_event(&self, id: &str) -> ContentResult<()> {
        self.delete(Resource::Events, id).await
    }

    /// Toggle the featured flag of a gallery image / 切换图库图片的精选标记
    pub async fn set_gallery_featured(&self, id: &str, featured: bool) -> ContentResult<()> {
        let mut row = Map::new();
        row.insert("is_featured".to_string(), Value::Bool(featured));
        self.patch(Resource::GalleryImages, id, row).await
    }

    /// Delete a gallery row, then best-effort delete its stored image
    /// 删除图库行，然后尽力删除其存储的图片
    pub async fn delete_gallery_image(&self, id: &str, image_url: &str) -> ContentResult<()> {
        self.delete(Resource::GalleryImages, id).await?;

        let buckets = [
            self.storage.event_posters_bucket(),
            self.storage.admin_documents_bucket(),
        ];
        let Some(bucket) = buckets
            .into_iter()
            .find(|bucket| object_path_from_url(bucket, image_url).is_some())
        else {
            return Ok(());
        };
        if let Err(e) = self.storage.delete(bucket, image_url).await {
            warn!(image = id, error = %e, "Failed to delete gallery object");
        }
        Ok(())
    }
}
