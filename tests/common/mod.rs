use std::path::PathBuf;
use std::sync::Arc;

use festival_site::backend::MemoryBackend;
use festival_site::config::{BackendConfig, BackendKind};
use festival_site::BackendHandles;

pub fn fixture_path() -> PathBuf {
    PathBuf::from(format!("{}/fixtures/site.json", env!("CARGO_MANIFEST_DIR")))
}

/// Memory backend seeded with the festival fixture / 加载节日种子数据的内存后端
pub fn seeded_backend() -> MemoryBackend {
    MemoryBackend::from_fixture_file(&fixture_path()).expect("fixture loads")
}

/// Handles that share one seeded memory backend / 共享同一内存后端的接口句柄
pub fn seeded_handles() -> (MemoryBackend, BackendHandles) {
    let backend = seeded_backend();
    let handles = BackendHandles {
        content: Arc::new(backend.clone()),
        storage: Arc::new(backend.clone()),
        auth: Arc::new(backend.clone()),
    };
    (backend, handles)
}

pub fn memory_config() -> BackendConfig {
    BackendConfig {
        kind: BackendKind::Memory,
        fixture: Some(fixture_path()),
        ..Default::default()
    }
}
