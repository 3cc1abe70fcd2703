//! Backend object names shared across the crate
//! 整个crate共享的后端对象名称

/// Composite read procedure / 组合读取过程
pub const SITE_CONTENT_RPC: &str = "get_all_site_content";

/// Content tables / 内容表
pub mod tables {
    pub const HERO_CONTENT: &str = "hero_content";
    pub const ABOUT_CONTENT: &str = "about_content";
    pub const ONBOARDING_CONTENT: &str = "onboarding_content";
    pub const FOOTER_CONTENT: &str = "footer_content";
    pub const STATISTICS: &str = "statistics";
    pub const TEAM_MEMBERS: &str = "team_members";
    pub const EVENTS: &str = "events";
    pub const GALLERY_IMAGES: &str = "gallery_images";
    pub const SECTION_CONTENT: &str = "section_content";
    pub const BUTTON_LABELS: &str = "button_labels";
    /// Admin allow-list / 管理员白名单
    pub const ADMINS: &str = "admins";
}

/// Object storage buckets / 对象存储桶
pub mod buckets {
    pub const EVENT_POSTERS: &str = "event-posters";
    pub const ADMIN_DOCUMENTS: &str = "admin-documents";
}

/// Path segment every public object URL carries before `<bucket>/<path>`
/// 公共对象URL中位于 `<bucket>/<path>` 之前的路径段
pub const PUBLIC_OBJECT_PATH: &str = "/storage/v1/object/public/";

/// Maximum number of objects returned by a bucket listing / 存储桶列表返回的最大对象数
pub const STORAGE_LIST_LIMIT: usize = 100;

/// The only message sign-in failures ever carry / 登录失败时唯一返回的消息
pub const AUTH_FAILURE_MESSAGE: &str = "Incorrect email or password";
