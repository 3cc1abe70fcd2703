//! Site content: typed resources, fetchers and the aggregate cache
//! 站点内容：类型化资源、获取器与聚合缓存

pub mod aggregator;
pub mod error;
pub mod fetcher;
pub mod model;
pub mod raw;
pub mod resource;

#[cfg(test)]
pub(crate) mod testing;


pub use aggregator::{AggregateSnapshot, AggregateStatus, LoadSource, SiteDataStore};
pub use error::{ContentError, ContentResult};
pub use fetcher::{FetchState, ResourceFetcher};
pub use model::{
    AboutContent, AdminDocument, ButtonLabel, EventCard, EventDay, FooterContent, GalleryImage,
    HeroContent, MemberType, OnboardingContent, ResourceData, SectionContent, SiteData, Statistic,
    StorageFile, TeamMember, Vibe,
};
pub use resource::Resource;
