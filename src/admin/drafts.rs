//! Row payloads accepted by the admin write path
//! 管理写入路径接受的行载荷

use serde::Serialize;

use crate::content::{ContentError, ContentResult, EventDay, MemberType, Resource, Vibe};

/// A payload that can be written to one resource table / 可写入某个资源表的载荷
pub trait ContentDraft: Serialize + Send + Sync {
    /// Table the draft belongs to / 载荷所属的表
    const RESOURCE: Resource;

    /// Primary key minted on create; `None` lets the store assign one
    /// 创建时生成的主键；`None` 表示由存储分配
    fn new_id(&self) -> Option<String> {
        None
    }

    fn validate(&self) -> ContentResult<()> {
        Ok(())
    }
}

/// Event id: the title lowercased with every whitespace run replaced by `-`
/// 活动ID：标题转小写，并将连续空白替换为 `-`
pub fn slugify(title: &str) -> String {
    title
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Split a comma-separated symbol list, dropping blanks / 拆分逗号分隔的符号列表并去除空项
pub fn parse_symbols(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn require(field: &str, value: &str) -> ContentResult<()> {
    if value.trim().is_empty() {
        return Err(ContentError::InvalidInput(format!("{} is required", field)));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventDraft {
    pub title: String,
    pub inspiration: String,
    pub description: String,
    /// Current poster URL, replaced when a new poster is uploaded
    /// 当前海报URL，上传新海报时被替换
    pub image: String,
    pub color: String,
    pub symbols: Vec<String>,
    pub day: EventDay,
    pub vibe: Vibe,
}

impl ContentDraft for EventDraft {
    const RESOURCE: Resource = Resource::Events;

    fn new_id(&self) -> Option<String> {
        Some(slugify(&self.title))
    }

    fn validate(&self) -> ContentResult<()> {
        require("title", &self.title)?;
        require("description", &self.description)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamMemberDraft {
    pub name: String,
    pub role: String,
    pub phone: String,
    #[serde(rename = "type")]
    pub member_type: MemberType,
    pub order: i64,
}

impl ContentDraft for TeamMemberDraft {
    const RESOURCE: Resource = Resource::TeamMembers;

    fn validate(&self) -> ContentResult<()> {
        require("name", &self.name)?;
        require("role", &self.role)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticDraft {
    pub label: String,
    pub value: String,
    pub order: i64,
}

impl ContentDraft for StatisticDraft {
    const RESOURCE: Resource = Resource::Statistics;

    fn validate(&self) -> ContentResult<()> {
        require("label", &self.label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GalleryImageDraft {
    pub image_url: String,
    pub order: Option<i64>,
    pub is_featured: bool,
}

impl ContentDraft for GalleryImageDraft {
    const RESOURCE: Resource = Resource::GalleryImages;

    fn validate(&self) -> ContentResult<()> {
        require("image_url", &self.image_url)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeroContentDraft {
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub primary_button_text: String,
    pub secondary_button_text: String,
}

impl ContentDraft for HeroContentDraft {
    const RESOURCE: Resource = Resource::HeroContent;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AboutContentDraft {
    pub paragraphs: Vec<String>,
}

impl ContentDraft for AboutContentDraft {
    const RESOURCE: Resource = Resource::AboutContent;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OnboardingContentDraft {
    pub title: String,
    pub subtitle: String,
    pub button_text: String,
}

impl ContentDraft for OnboardingContentDraft {
    const RESOURCE: Resource = Resource::OnboardingContent;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FooterContentDraft {
    pub copyright_text: String,
    pub note: Option<String>,
}

impl ContentDraft for FooterContentDraft {
    const RESOURCE: Resource = Resource::FooterContent;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionContentDraft {
    pub section_key: String,
    pub label: String,
    pub title: String,
    pub description: Option<String>,
}

impl ContentDraft for SectionContentDraft {
    const RESOURCE: Resource = Resource::SectionContent;

    fn validate(&self) -> ContentResult<()> {
        require("section_key", &self.section_key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ButtonLabelDraft {
    pub key: String,
    pub text: String,
}

impl ContentDraft for ButtonLabelDraft {
    const RESOURCE: Resource = Resource::ButtonLabels;

    fn validate(&self) -> ContentResult<()> {
        require("key", &self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("The Heist Protocol"), "the-heist-protocol");
        assert_eq!(slugify("Into  the\tUpside Down"), "into-the-upside-down");
        assert_eq!(slugify("Ça Va"), "ça-va");
    }

    #[test]
    fn test_parse_symbols() {
        assert_eq!(parse_symbols(" ♠, ♦ ,,♣ "), vec!["♠", "♦", "♣"]);
        assert!(parse_symbols(" , ").is_empty());
    }

    #[test]
    fn test_event_draft_serializes_as_row() {
        let draft = EventDraft {
            title: "The Heist Protocol".to_string(),
            inspiration: "Money Heist".to_string(),
            description: "Crack the vault".to_string(),
            image: String::new(),
            color: "crimson".to_string(),
            symbols: vec!["♠".to_string()],
            day: EventDay::Two,
            vibe: Vibe::Crime,
        };
        let row = serde_json::to_value(&draft).unwrap();
        assert_eq!(row["day"], 2);
        assert_eq!(row["vibe"], "crime");
        assert_eq!(draft.new_id().as_deref(), Some("the-heist-protocol"));

        let blank = EventDraft {
            title: "  ".to_string(),
            ..draft
        };
        assert!(matches!(blank.validate(), Err(ContentError::InvalidInput(_))));
    }
}
