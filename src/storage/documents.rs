//! Admin document library with fetch state
//! 带获取状态的管理文档库

use parking_lot::RwLock;
use tracing::warn;

use super::gateway::StorageGateway;
use crate::backend::FileUpload;
use crate::content::{AdminDocument, ContentResult, FetchState};

/// Listing of the admin documents bucket / 管理文档存储桶的列表
#[derive(Debug)]
pub struct DocumentLibrary {
    gateway: StorageGateway,
    state: RwLock<FetchState<Vec<AdminDocument>>>,
}

impl DocumentLibrary {
    pub fn new(gateway: StorageGateway) -> Self {
        Self {
            gateway,
            state: RwLock::new(FetchState::default()),
        }
    }

    pub fn state(&self) -> FetchState<Vec<AdminDocument>> {
        self.state.read().clone()
    }

    /// Re-list the bucket; previous entries stay on error
    /// 重新列出存储桶，出错时保留之前的条目
    pub async fn refetch(&self) -> FetchState<Vec<AdminDocument>> {
        self.state.write().begin();
        let result = self.gateway.list_admin_documents().await;
        if let Err(e) = &result {
            warn!(error = %e, "Failed to list admin documents");
        }
        let mut state = self.state.write();
        state.settle(result);
        state.clone()
    }

    /// Upload a document and refresh the listing / 上传文档并刷新列表
    pub async fn upload(&self, file: &FileUpload) -> ContentResult<String> {
        let url = self.gateway.upload_admin_document(file).await?;
        self.refetch().await;
        Ok(url)
    }

    /// Delete a document by URL and refresh the listing / 按URL删除文档并刷新列表
    pub async fn delete(&self, url: &str) -> ContentResult<()> {
        self.gateway.delete_admin_document(url).await?;
        self.refetch().await;
        Ok(())
    }
}
