//! The ten site content resources and how each one is queried
//! 十种站点内容资源及其查询方式

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::ContentError;
use crate::backend::SelectQuery;
use crate::constants::tables;

/// A content resource backed by one table / 由一张表支撑的内容资源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Resource {
    HeroContent,
    AboutContent,
    OnboardingContent,
    FooterContent,
    Statistics,
    TeamMembers,
    Events,
    GalleryImages,
    SectionContent,
    ButtonLabels,
}

impl Resource {
    pub const ALL: [Resource; 10] = [
        Resource::HeroContent,
        Resource::AboutContent,
        Resource::OnboardingContent,
        Resource::FooterContent,
        Resource::Statistics,
        Resource::TeamMembers,
        Resource::Events,
        Resource::GalleryImages,
        Resource::SectionContent,
        Resource::ButtonLabels,
    ];

    /// Backing table, also the key in the composite payload
    /// 对应的表名，同时也是组合载荷中的键
    pub fn table(self) -> &'static str {
        match self {
            Resource::HeroContent => tables::HERO_CONTENT,
            Resource::AboutContent => tables::ABOUT_CONTENT,
            Resource::OnboardingContent => tables::ONBOARDING_CONTENT,
            Resource::FooterContent => tables::FOOTER_CONTENT,
            Resource::Statistics => tables::STATISTICS,
            Resource::TeamMembers => tables::TEAM_MEMBERS,
            Resource::Events => tables::EVENTS,
            Resource::GalleryImages => tables::GALLERY_IMAGES,
            Resource::SectionContent => tables::SECTION_CONTENT,
            Resource::ButtonLabels => tables::BUTTON_LABELS,
        }
    }

    /// Key of this resource in the aggregate / 该资源在聚合数据中的键
    pub fn section_name(self) -> &'static str {
        match self {
            Resource::HeroContent => "heroContent",
            Resource::AboutContent => "aboutContent",
            Resource::OnboardingContent => "onboardingContent",
            Resource::FooterContent => "footerContent",
            Resource::Statistics => "statistics",
            Resource::TeamMembers => "teamMembers",
            Resource::Events => "events",
            Resource::GalleryImages => "galleryImages",
            Resource::SectionContent => "sectionContent",
            Resource::ButtonLabels => "buttonLabels",
        }
    }

    /// Singleton resources hold exactly one row / 单例资源恰好有一行
    pub fn is_singleton(self) -> bool {
        matches!(
            self,
            Resource::HeroContent
                | Resource::AboutContent
                | Resource::OnboardingContent
                | Resource::FooterContent
        )
    }

    /// Column a collection is ordered by / 集合的排序列
    pub fn order_column(self) -> Option<&'static str> {
        match self {
            Resource::Statistics | Resource::TeamMembers | Resource::GalleryImages => Some("order"),
            Resource::Events => Some("day"),
            _ => None,
        }
    }

    /// The single read issued for this resource / 该资源发出的唯一读取查询
    pub fn query(self) -> SelectQuery {
        match self.order_column() {
            Some(column) => SelectQuery::all().order_asc(column),
            None => SelectQuery::all(),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.section_name())
    }
}

impl FromStr for Resource {
    type Err = ContentError;

    /// Accepts aggregate keys, table names and the team partition aliases
    /// 接受聚合键、表名以及团队分组别名
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "staffMembers" | "studentMembers" => return Ok(Resource::TeamMembers),
            _ => {}
        }
        Resource::ALL
            .into_iter()
            .find(|r| r.section_name() == name || r.table() == name)
            .ok_or_else(|| ContentError::InvalidInput(format!("unknown section: {}", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_section_names() {
        assert_eq!("events".parse::<Resource>().unwrap(), Resource::Events);
        assert_eq!("heroContent".parse::<Resource>().unwrap(), Resource::HeroContent);
        assert_eq!("hero_content".parse::<Resource>().unwrap(), Resource::HeroContent);
        assert_eq!("staffMembers".parse::<Resource>().unwrap(), Resource::TeamMembers);
        assert_eq!("studentMembers".parse::<Resource>().unwrap(), Resource::TeamMembers);

        let err = "sponsors".parse::<Resource>().unwrap_err();
        assert_eq!(err.to_string(), "Invalid input: unknown section: sponsors");
    }

    #[test]
    fn test_queries_follow_resource_shape() {
        assert_eq!(Resource::HeroContent.query(), SelectQuery::all());
        assert_eq!(Resource::ButtonLabels.query(), SelectQuery::all());
        assert_eq!(Resource::Events.query(), SelectQuery::all().order_asc("day"));
        assert_eq!(
            Resource::Statistics.query(),
            SelectQuery::all().order_asc("order")
        );
    }

    #[test]
    fn test_singletons() {
        let singletons: Vec<_> = Resource::ALL
            .into_iter()
            .filter(|r| r.is_singleton())
            .collect();
        assert_eq!(
            singletons,
            vec![
                Resource::HeroContent,
                Resource::AboutContent,
                Resource::OnboardingContent,
                Resource::FooterContent
            ]
        );
    }
}
