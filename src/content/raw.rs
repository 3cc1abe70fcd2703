//! Parse-and-validate of raw backend rows into view models
//! 将后端原始行解析并校验为视图模型
//!
//! Every decoder takes the rows a single query returned. A row that does not
//! match the expected shape fails the whole resource with a query error.
//! 每个解码器接收单次查询返回的行；任何不符合预期结构的行都会使整个资源以查询错误失败。

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::error::{ContentError, ContentResult};
use super::model::{
    wire, AboutContent, ButtonLabel, EventCard, FooterContent, GalleryImage, HeroContent,
    OnboardingContent, ResourceData, SectionContent, SiteData, Statistic, TeamMember,
};
use super::resource::Resource;

#[derive(Debug, Deserialize)]
struct HeroRow {
    #[serde(deserialize_with = "wire::id")]
    id: String,
    title: String,
    subtitle: String,
    description: String,
    primary_button_text: String,
    secondary_button_text: String,
}

impl From<HeroRow> for HeroContent {
    fn from(row: HeroRow) -> Self {
        HeroContent {
            id: row.id,
            title: row.title,
            subtitle: row.subtitle,
            description: row.description,
            primary_button_text: row.primary_button_text,
            secondary_button_text: row.secondary_button_text,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OnboardingRow {
    #[serde(deserialize_with = "wire::id")]
    id: String,
    title: String,
    subtitle: String,
    button_text: String,
}

impl From<OnboardingRow> for OnboardingContent {
    fn from(row: OnboardingRow) -> Self {
        OnboardingContent {
            id: row.id,
            title: row.title,
            subtitle: row.subtitle,
            button_text: row.button_text,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FooterRow {
    #[serde(deserialize_with = "wire::id")]
    id: String,
    copyright_text: String,
    #[serde(default)]
    note: Option<String>,
}

impl From<FooterRow> for FooterContent {
    fn from(row: FooterRow) -> Self {
        FooterContent {
            id: row.id,
            copyright_text: row.copyright_text,
            note: row.note,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GalleryUrlRow {
    image_url: String,
}

fn parse_row<T: DeserializeOwned>(resource: Resource, row: Value) -> ContentResult<T> {
    serde_json::from_value(row).map_err(|e| {
        ContentError::query(resource, format!("invalid {} row: {}", resource.table(), e))
    })
}

fn parse_rows<T: DeserializeOwned>(resource: Resource, rows: Vec<Value>) -> ContentResult<Vec<T>> {
    rows.into_iter().map(|row| parse_row(resource, row)).collect()
}

/// Enforce the exactly-one-row rule / 强制恰好一行的规则
pub fn single_row(resource: Resource, rows: Vec<Value>) -> ContentResult<Value> {
    let count = rows.len();
    let mut rows = rows.into_iter();
    match (rows.next(), count) {
        (Some(row), 1) => Ok(row),
        (None, _) => Err(ContentError::query(
            resource,
            format!("expected exactly one {} row, found none", resource.table()),
        )),
        (Some(_), n) => Err(ContentError::query(
            resource,
            format!("expected exactly one {} row, found {}", resource.table(), n),
        )),
    }
}

fn sort_by_order<T, F>(items: &mut [T], key: F)
where
    F: Fn(&T) -> Option<i64>,
{
    // Stable; rows without an order go last / 稳定排序，无顺序的行排在最后
    items.sort_by_key(|item| match key(item) {
        Some(order) => (0, order),
        None => (1, 0),
    });
}

pub fn hero_content(rows: Vec<Value>) -> ContentResult<HeroContent> {
    let row = single_row(Resource::HeroContent, rows)?;
    parse_row::<HeroRow>(Resource::HeroContent, row).map(HeroContent::from)
}

pub fn about_content(rows: Vec<Value>) -> ContentResult<AboutContent> {
    let row = single_row(Resource::AboutContent, rows)?;
    parse_row(Resource::AboutContent, row)
}

pub fn onboarding_content(rows: Vec<Value>) -> ContentResult<OnboardingContent> {
    let row = single_row(Resource::OnboardingContent, rows)?;
    parse_row::<OnboardingRow>(Resource::OnboardingContent, row).map(OnboardingContent::from)
}

pub fn footer_content(rows: Vec<Value>) -> ContentResult<FooterContent> {
    let row = single_row(Resource::FooterContent, rows)?;
    parse_row::<FooterRow>(Resource::FooterContent, row).map(FooterContent::from)
}

pub fn statistics(rows: Vec<Value>) -> ContentResult<Vec<Statistic>> {
    let mut items: Vec<Statistic> = parse_rows(Resource::Statistics, rows)?;
    sort_by_order(&mut items, |s| Some(s.order));
    Ok(items)
}

pub fn team_members(rows: Vec<Value>) -> ContentResult<Vec<TeamMember>> {
    let mut items: Vec<TeamMember> = parse_rows(Resource::TeamMembers, rows)?;
    sort_by_order(&mut items, |m| Some(m.order));
    Ok(items)
}

pub fn events(rows: Vec<Value>) -> ContentResult<Vec<EventCard>> {
    let mut items: Vec<EventCard> = parse_rows(Resource::Events, rows)?;
    sort_by_order(&mut items, |e| Some(i64::from(u8::from(e.day))));
    Ok(items)
}

pub fn gallery_images(rows: Vec<Value>) -> ContentResult<Vec<GalleryImage>> {
    let mut items: Vec<GalleryImage> = parse_rows(Resource::GalleryImages, rows)?;
    sort_by_order(&mut items, |g| g.order);
    Ok(items)
}

/// Slice `image_url` out of gallery rows / 从图库行中提取 `image_url`
pub fn gallery_urls(rows: Vec<Value>) -> ContentResult<Vec<String>> {
    let items: Vec<GalleryUrlRow> = parse_rows(Resource::GalleryImages, rows)?;
    Ok(items.into_iter().map(|r| r.image_url).collect())
}

pub fn section_content(rows: Vec<Value>) -> ContentResult<Vec<SectionContent>> {
    parse_rows(Resource::SectionContent, rows)
}

pub fn button_labels(rows: Vec<Value>) -> ContentResult<Vec<ButtonLabel>> {
    parse_rows(Resource::ButtonLabels, rows)
}

/// Decode the rows of any resource / 解码任意资源的行
pub fn decode(resource: Resource, rows: Vec<Value>) -> ContentResult<ResourceData> {
    Ok(match resource {
        Resource::HeroContent => ResourceData::HeroContent(hero_content(rows)?),
        Resource::AboutContent => ResourceData::AboutContent(about_content(rows)?),
        Resource::OnboardingContent => ResourceData::OnboardingContent(onboarding_content(rows)?),
        Resource::FooterContent => ResourceData::FooterContent(footer_content(rows)?),
        Resource::Statistics => ResourceData::Statistics(statistics(rows)?),
        Resource::TeamMembers => ResourceData::TeamMembers(team_members(rows)?),
        Resource::Events => ResourceData::Events(events(rows)?),
        Resource::GalleryImages => ResourceData::GalleryImages(gallery_images(rows)?),
        Resource::SectionContent => ResourceData::SectionContent(section_content(rows)?),
        Resource::ButtonLabels => ResourceData::ButtonLabels(button_labels(rows)?),
    })
}

/// Decode the composite payload keyed by table name
/// 解码以表名为键的组合载荷
///
/// A null or missing singleton stays unset; a null or missing collection is
/// empty. Anything else that does not validate fails the whole payload.
/// 单例为null或缺失时保持未设置；集合为null或缺失时为空；其他校验失败会使整个载荷失败。
pub fn decode_composite(payload: Value) -> ContentResult<SiteData> {
    let mut object: Map<String, Value> = match payload {
        Value::Object(object) => object,
        Value::Null => {
            return Err(ContentError::Aggregate(
                "site content procedure returned no data".to_string(),
            ))
        }
        other => {
            return Err(ContentError::Aggregate(format!(
                "site content procedure returned {}, expected an object",
                json_kind(&other)
            )))
        }
    };

    let mut data = SiteData::default();
    for resource in Resource::ALL {
        let rows = match object.remove(resource.table()).unwrap_or(Value::Null) {
            Value::Null => continue,
            Value::Array(rows) => rows,
            row @ Value::Object(_) if resource.is_singleton() => vec![row],
            other => {
                return Err(ContentError::query(
                    resource,
                    format!(
                        "expected {} for {}, got {}",
                        if resource.is_singleton() { "an object" } else { "an array" },
                        resource.table(),
                        json_kind(&other)
                    ),
                ))
            }
        };
        if resource.is_singleton() && rows.is_empty() {
            continue;
        }
        data.apply(decode(resource, rows)?);
    }
    Ok(data)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
