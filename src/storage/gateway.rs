//! Object storage gateway: upload, public URLs, best-effort delete, listing
//! 对象存储网关：上传、公共URL、尽力删除、列表

use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use tracing::{debug, warn};
use url::Url;

use crate::backend::{FileUpload, ListOptions, ObjectStorage};
use crate::config::StorageConfig;
use crate::constants::PUBLIC_OBJECT_PATH;
use crate::content::{AdminDocument, ContentError, ContentResult, StorageFile};

const TOKEN_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const TOKEN_LEN: usize = 10;

/// Collision-resistant object name: `<unix-millis>-<base36 token>[.<ext>]`
/// 抗冲突的对象名称：`<毫秒时间戳>-<base36随机串>[.<扩展名>]`
pub fn generate_object_name(original: &str) -> String {
    let mut rng = rand::thread_rng();
    let token: String = (0..TOKEN_LEN)
        .map(|_| TOKEN_ALPHABET[rng.gen_range(0..TOKEN_ALPHABET.len())] as char)
        .collect();
    let millis = Utc::now().timestamp_millis();

    match file_extension(original) {
        Some(ext) => format!("{}-{}.{}", millis, token, ext),
        None => format!("{}-{}", millis, token),
    }
}

fn file_extension(name: &str) -> Option<&str> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    match base.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => Some(ext),
        _ => None,
    }
}

/// Recover the bucket-relative path from a public object URL
/// 从公共对象URL中恢复存储桶内的相对路径
///
/// Returns `None` for unparseable URLs, other buckets and empty paths.
/// 对于无法解析的URL、其他存储桶或空路径返回 `None`。
pub fn object_path_from_url(bucket: &str, url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let marker = format!("{}{}/", PUBLIC_OBJECT_PATH, bucket);
    let path = parsed.path();
    let start = path.find(&marker)? + marker.len();
    let object = &path[start..];
    if object.is_empty() {
        None
    } else {
        Some(object.to_string())
    }
}

/// Storage gateway over an [`ObjectStorage`] backend / 基于 [`ObjectStorage`] 后端的存储网关
#[derive(Debug, Clone)]
pub struct StorageGateway {
    storage: Arc<dyn ObjectStorage>,
    config: StorageConfig,
}

impl StorageGateway {
    pub fn new(storage: Arc<dyn ObjectStorage>) -> Self {
        Self::with_config(storage, StorageConfig::default())
    }

    pub fn with_config(storage: Arc<dyn ObjectStorage>, config: StorageConfig) -> Self {
        Self { storage, config }
    }

    /// Bucket for event posters / 活动海报存储桶
    pub fn event_posters_bucket(&self) -> &str {
        &self.config.event_posters_bucket
    }

    /// Bucket for admin documents / 管理文档存储桶
    pub fn admin_documents_bucket(&self) -> &str {
        &self.config.admin_documents_bucket
    }

    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        self.storage.public_url(bucket, path)
    }

    /// Upload under a generated name and return its public URL
    /// 以生成的名称上传并返回公共URL
    pub async fn upload(&self, bucket: &str, file: &FileUpload) -> ContentResult<String> {
        let path = generate_object_name(&file.name);
        self.storage
            .upload(bucket, &path, file)
            .await
            .map_err(ContentError::storage)?;
        debug!(bucket, path = %path, size = file.bytes.len(), "Object uploaded");
        Ok(self.storage.public_url(bucket, &path))
    }

    /// Remove the object behind a public URL / 删除公共URL对应的对象
    ///
    /// A URL that does not point into `bucket` is logged and ignored.
    /// 未指向 `bucket` 的URL会被记录并忽略。
    pub async fn delete(&self, bucket: &str, url: &str) -> ContentResult<()> {
        let Some(path) = object_path_from_url(bucket, url) else {
            warn!(bucket, url, "Could not extract object path from URL, skipping delete");
            return Ok(());
        };
        self.storage
            .remove(bucket, &[path.clone()])
            .await
            .map_err(ContentError::storage)?;
        debug!(bucket, path = %path, "Object removed");
        Ok(())
    }

    /// Newest objects first, each with its public URL / 按时间倒序列出对象并附带公共URL
    pub async fn list(&self, bucket: &str) -> ContentResult<Vec<StorageFile>> {
        let objects = self
            .storage
            .list(bucket, &ListOptions::newest_first(self.config.list_limit))
            .await
            .map_err(ContentError::storage)?;

        let now = Utc::now().to_rfc3339();
        Ok(objects
            .into_iter()
            .map(|object| StorageFile {
                id: object.id.unwrap_or_else(|| object.name.clone()),
                url: self.storage.public_url(bucket, &object.name),
                size: object.size.unwrap_or(0),
                created_at: object.created_at.unwrap_or_else(|| now.clone()),
                name: object.name,
            })
            .collect())
    }

    pub async fn list_admin_documents(&self) -> ContentResult<Vec<AdminDocument>> {
        let files = self.list(self.admin_documents_bucket()).await?;
        Ok(files.into_iter().map(AdminDocument::from).collect())
    }

    pub async fn upload_admin_document(&self, file: &FileUpload) -> ContentResult<String> {
        self.upload(self.admin_documents_bucket(), file).await
    }

    pub async fn delete_admin_document(&self, url: &str) -> ContentResult<()> {
        self.delete(self.admin_documents_bucket(), url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_names_keep_extension() {
        let name = generate_object_name("poster.final.PNG");
        let (stamp, rest) = name.split_once('-').unwrap();
        assert!(stamp.parse::<i64>().is_ok());
        assert!(rest.ends_with(".PNG"));
        let token = rest.trim_end_matches(".PNG");
        assert_eq!(token.len(), TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_generated_names_without_extension() {
        let name = generate_object_name("README");
        assert!(!name.contains('.'));
        assert_ne!(generate_object_name("a.png"), generate_object_name("a.png"));
    }

    #[test]
    fn test_object_path_from_url() {
        assert_eq!(
            object_path_from_url(
                "event-posters",
                "https://abc.supabase.co/storage/v1/object/public/event-posters/123-x.png"
            ),
            Some("123-x.png".to_string())
        );
        assert_eq!(
            object_path_from_url(
                "event-posters",
                "https://abc.supabase.co/storage/v1/object/public/event-posters/2025/a.png?t=1"
            ),
            Some("2025/a.png".to_string())
        );
        assert_eq!(
            object_path_from_url(
                "event-posters",
                "https://abc.supabase.co/storage/v1/object/public/admin-documents/a.pdf"
            ),
            None
        );
        assert_eq!(
            object_path_from_url(
                "event-posters",
                "https://abc.supabase.co/storage/v1/object/public/event-posters/"
            ),
            None
        );
        assert_eq!(object_path_from_url("event-posters", "not a url"), None);
        assert_eq!(
            object_path_from_url("event-posters", "https://cdn.example.com/poster.png"),
            None
        );
    }
}
