//! Typed view models for site content
//! 站点内容的类型化视图模型
//!
//! Singleton and text content serialize camelCase; gallery and section rows
//! keep their snake_case column names, as the pages consume them that way.
//! 单例和文本内容以camelCase序列化；图库和分区行保留snake_case列名。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{ContentError, ContentResult};
use super::resource::Resource;

/// Wire helpers for loosely typed columns / 松散类型列的解析辅助
pub(crate) mod wire {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Identifier as string or integer / 字符串或整数形式的标识符
    pub fn id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        match Value::deserialize(d)? {
            Value::String(s) if !s.is_empty() => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(D::Error::custom(format!("invalid id: {}", other))),
        }
    }

    /// Text that may arrive as a number / 可能以数字形式出现的文本
    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        match Value::deserialize(d)? {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(D::Error::custom(format!("expected text, got {}", other))),
        }
    }

    /// Text where null means empty / null表示空字符串的文本
    pub fn text_or_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(String::new()),
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(D::Error::custom(format!("expected text, got {}", other))),
        }
    }

    /// Boolean where null means false / null表示false的布尔值
    pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        Ok(Option::<bool>::deserialize(d)?.unwrap_or(false))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroContent {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub primary_button_text: String,
    pub secondary_button_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AboutContent {
    #[serde(deserialize_with = "wire::id")]
    pub id: String,
    pub paragraphs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingContent {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    pub button_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FooterContent {
    pub id: String,
    pub copyright_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Headline number on the landing page / 首页上的统计数字
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistic {
    #[serde(deserialize_with = "wire::id")]
    pub id: String,
    pub label: String,
    /// Display value such as "20+" / 显示值，例如 "20+"
    #[serde(deserialize_with = "wire::text")]
    pub value: String,
    pub order: i64,
}

/// Team member category / 团队成员类别
///
/// Only `staff` and `student` take part in partitioning.
/// 只有 `staff` 和 `student` 参与分组。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MemberType {
    Staff,
    Student,
    Other(String),
}

impl From<String> for MemberType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "staff" => MemberType::Staff,
            "student" => MemberType::Student,
            _ => MemberType::Other(value),
        }
    }
}

impl From<MemberType> for String {
    fn from(value: MemberType) -> Self {
        match value {
            MemberType::Staff => "staff".to_string(),
            MemberType::Student => "student".to_string(),
            MemberType::Other(other) => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    #[serde(deserialize_with = "wire::id")]
    pub id: String,
    pub name: String,
    pub role: String,
    #[serde(default, deserialize_with = "wire::text_or_empty")]
    pub phone: String,
    #[serde(rename = "type")]
    pub member_type: MemberType,
    pub order: i64,
}

/// Split members into (staff, students); other types land in neither
/// 将成员拆分为（教职工，学生）；其他类型不进入任何一组
pub fn partition_team(members: &[TeamMember]) -> (Vec<TeamMember>, Vec<TeamMember>) {
    let staff = members
        .iter()
        .filter(|m| m.member_type == MemberType::Staff)
        .cloned()
        .collect();
    let students = members
        .iter()
        .filter(|m| m.member_type == MemberType::Student)
        .cloned()
        .collect();
    (staff, students)
}

/// Festival day, either 1 or 2 / 节日的第几天（1或2）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum EventDay {
    One,
    Two,
}

impl TryFrom<u8> for EventDay {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(EventDay::One),
            2 => Ok(EventDay::Two),
            other => Err(format!("event day must be 1 or 2, got {}", other)),
        }
    }
}

impl From<EventDay> for u8 {
    fn from(day: EventDay) -> Self {
        match day {
            EventDay::One => 1,
            EventDay::Two => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vibe {
    Thriller,
    Fantasy,
    Action,
    Horror,
    Adventure,
    Crime,
}

impl Vibe {
    pub fn as_str(self) -> &'static str {
        match self {
            Vibe::Thriller => "thriller",
            Vibe::Fantasy => "fantasy",
            Vibe::Action => "action",
            Vibe::Horror => "horror",
            Vibe::Adventure => "adventure",
            Vibe::Crime => "crime",
        }
    }
}

impl fmt::Display for Vibe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Vibe {
    type Err = ContentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "thriller" => Ok(Vibe::Thriller),
            "fantasy" => Ok(Vibe::Fantasy),
            "action" => Ok(Vibe::Action),
            "horror" => Ok(Vibe::Horror),
            "adventure" => Ok(Vibe::Adventure),
            "crime" => Ok(Vibe::Crime),
            other => Err(ContentError::InvalidInput(format!("unknown vibe: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCard {
    /// Slug of the title at creation time / 创建时标题的slug
    pub id: String,
    pub title: String,
    #[serde(default, deserialize_with = "wire::text_or_empty")]
    pub inspiration: String,
    pub description: String,
    /// Poster URL / 海报URL
    #[serde(default, deserialize_with = "wire::text_or_empty")]
    pub image: String,
    /// Style token / 样式标记
    pub color: String,
    #[serde(default)]
    pub symbols: Vec<String>,
    pub day: EventDay,
    pub vibe: Vibe,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryImage {
    #[serde(deserialize_with = "wire::id")]
    pub id: String,
    pub image_url: String,
    #[serde(default)]
    pub order: Option<i64>,
    #[serde(default, deserialize_with = "wire::flag")]
    pub is_featured: bool,
    #[serde(default, deserialize_with = "wire::text_or_empty")]
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionContent {
    #[serde(deserialize_with = "wire::id")]
    pub id: String,
    pub section_key: String,
    pub label: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonLabel {
    #[serde(deserialize_with = "wire::id")]
    pub id: String,
    pub key: String,
    pub text: String,
}

/// Look up a section by its key / 按键查找分区
pub fn find_section<'a>(sections: &'a [SectionContent], key: &str) -> Option<&'a SectionContent> {
    sections.iter().find(|s| s.section_key == key)
}

/// Button text by key; empty when the key is unknown / 按键获取按钮文本，未知键返回空字符串
pub fn button_text<'a>(labels: &'a [ButtonLabel], key: &str) -> &'a str {
    labels
        .iter()
        .find(|b| b.key == key)
        .map(|b| b.text.as_str())
        .unwrap_or("")
}

/// Object in a storage bucket / 存储桶中的对象
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageFile {
    pub id: String,
    pub name: String,
    pub url: String,
    pub size: u64,
    pub created_at: String,
}

/// File in the admin document library / 管理员文档库中的文件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminDocument {
    pub id: String,
    pub name: String,
    pub url: String,
    pub size: u64,
    pub uploaded_at: String,
}

impl From<StorageFile> for AdminDocument {
    fn from(file: StorageFile) -> Self {
        AdminDocument {
            id: file.id,
            name: file.name,
            url: file.url,
            size: file.size,
            uploaded_at: file.created_at,
        }
    }
}

/// One resource's freshly decoded content / 单个资源新解码的内容
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceData {
    HeroContent(HeroContent),
    AboutContent(AboutContent),
    OnboardingContent(OnboardingContent),
    FooterContent(FooterContent),
    Statistics(Vec<Statistic>),
    TeamMembers(Vec<TeamMember>),
    Events(Vec<EventCard>),
    GalleryImages(Vec<GalleryImage>),
    SectionContent(Vec<SectionContent>),
    ButtonLabels(Vec<ButtonLabel>),
}

impl ResourceData {
    pub fn resource(&self) -> Resource {
        match self {
            ResourceData::HeroContent(_) => Resource::HeroContent,
            ResourceData::AboutContent(_) => Resource::AboutContent,
            ResourceData::OnboardingContent(_) => Resource::OnboardingContent,
            ResourceData::FooterContent(_) => Resource::FooterContent,
            ResourceData::Statistics(_) => Resource::Statistics,
            ResourceData::TeamMembers(_) => Resource::TeamMembers,
            ResourceData::Events(_) => Resource::Events,
            ResourceData::GalleryImages(_) => Resource::GalleryImages,
            ResourceData::SectionContent(_) => Resource::SectionContent,
            ResourceData::ButtonLabels(_) => Resource::ButtonLabels,
        }
    }
}

/// The aggregate of every content resource / 所有内容资源的聚合
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteData {
    pub hero_content: Option<HeroContent>,
    pub about_content: Option<AboutContent>,
    pub onboarding_content: Option<OnboardingContent>,
    pub footer_content: Option<FooterContent>,
    pub statistics: Vec<Statistic>,
    pub team_members: Vec<TeamMember>,
    pub staff_members: Vec<TeamMember>,
    pub student_members: Vec<TeamMember>,
    pub events: Vec<EventCard>,
    pub gallery_images: Vec<GalleryImage>,
    pub section_content: Vec<SectionContent>,
    pub button_labels: Vec<ButtonLabel>,
    /// Resources whose query failed during a fallback assembly
    /// 回退组装期间查询失败的资源
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degraded: Vec<Resource>,
}

impl SiteData {
    /// Replace the team and recompute both partitions / 替换团队并重新计算两个分组
    pub fn set_team_members(&mut self, members: Vec<TeamMember>) {
        let (staff, students) = partition_team(&members);
        self.team_members = members;
        self.staff_members = staff;
        self.student_members = students;
    }

    /// Merge one resource in place; every other field is left alone
    /// 原地合并单个资源，其他字段保持不变
    pub fn apply(&mut self, data: ResourceData) {
        let resource = data.resource();
        match data {
            ResourceData::HeroContent(v) => self.hero_content = Some(v),
            ResourceData::AboutContent(v) => self.about_content = Some(v),
            ResourceData::OnboardingContent(v) => self.onboarding_content = Some(v),
            ResourceData::FooterContent(v) => self.footer_content = Some(v),
            ResourceData::Statistics(v) => self.statistics = v,
            ResourceData::TeamMembers(v) => self.set_team_members(v),
            ResourceData::Events(v) => self.events = v,
            ResourceData::GalleryImages(v) => self.gallery_images = v,
            ResourceData::SectionContent(v) => self.section_content = v,
            ResourceData::ButtonLabels(v) => self.button_labels = v,
        }
        self.degraded.retain(|r| *r != resource);
    }

    pub fn section(&self, key: &str) -> Option<&SectionContent> {
        find_section(&self.section_content, key)
    }

    pub fn button_text(&self, key: &str) -> &str {
        button_text(&self.button_labels, key)
    }

    pub fn is_degraded(&self, resource: Resource) -> bool {
        self.degraded.contains(&resource)
    }

    /// JSON of one aggregate key, including the team partitions
    /// 单个聚合键的JSON，包括团队分组
    pub fn section_value(&self, name: &str) -> ContentResult<Value> {
        let resource: Resource = name.parse()?;
        let key = match name {
            "staffMembers" | "studentMembers" => name,
            _ => resource.section_name(),
        };
        let value = serde_json::to_value(self)
            .map_err(|e| ContentError::Aggregate(format!("failed to serialize aggregate: {}", e)))?;
        Ok(value.get(key).cloned().unwrap_or(Value::Null))
    }
}
