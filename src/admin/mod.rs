//! Admin-only content writes
//! 仅限管理员的内容写入

pub mod drafts;
pub mod writer;

#[cfg(test)]
mod writer_test;

pub use drafts::{
    parse_symbols, slugify, AboutContentDraft, ButtonLabelDraft, ContentDraft, EventDraft,
    FooterContentDraft, GalleryImageDraft, HeroContentDraft, OnboardingContentDraft,
    SectionContentDraft, StatisticDraft, TeamMemberDraft,
};
pub use writer::AdminWriter;
