//! Seeded backends for unit tests
//! 单元测试使用的预置后端

use crate::backend::memory::Fixture;
use crate::backend::MemoryBackend;

pub(crate) const SITE_FIXTURE: &str = include_str!("../../fixtures/site.json");

/// Backend loaded with the festival fixture, composite RPC enabled
/// 加载节日种子数据的后端，已启用组合RPC
pub(crate) fn seeded_backend() -> MemoryBackend {
    let fixture: Fixture = serde_json::from_str(SITE_FIXTURE).expect("fixture parses");
    MemoryBackend::from_fixture(fixture)
}

/// Same data without the composite RPC / 相同数据但没有组合RPC
pub(crate) fn seeded_backend_without_rpc() -> MemoryBackend {
    let mut fixture: Fixture = serde_json::from_str(SITE_FIXTURE).expect("fixture parses");
    fixture.site_content_rpc = false;
    MemoryBackend::from_fixture(fixture)
}
