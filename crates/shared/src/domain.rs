use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// Store-assigned article identifier. The store may emit it as a string or a
/// number; both normalise to the textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ArticleId(pub String);

impl ArticleId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ArticleId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ArticleId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl<'de> Deserialize<'de> for ArticleId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => Self(text),
            RawId::Signed(n) => Self(n.to_string()),
            RawId::Unsigned(n) => Self(n.to_string()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleKind {
    Original,
    Optimized,
}

impl ArticleKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Original => "Original",
            Self::Optimized => "Optimized",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleMetadata {
    #[serde(
        default,
        deserialize_with = "lenient_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub word_count: Option<u32>,
    #[serde(
        default,
        deserialize_with = "lenient_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub reading_time: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Reference {
    pub fn label(&self) -> &str {
        match self.title.as_deref() {
            Some(title) if !title.trim().is_empty() => title,
            _ => &self.url,
        }
    }
}

/// Cross-reference to the paired article. The store either sends the bare id
/// or populates the whole document; both are kept as-is so callers can match
/// on the variant instead of probing the JSON shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArticleLink {
    Id(ArticleId),
    Embedded(Box<Article>),
}

impl ArticleLink {
    pub fn id(&self) -> &ArticleId {
        match self {
            Self::Id(id) => id,
            Self::Embedded(article) => &article.id,
        }
    }

    pub fn embedded(&self) -> Option<&Article> {
        match self {
            Self::Id(_) => None,
            Self::Embedded(article) => Some(article),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(rename = "_id", alias = "id")]
    pub id: ArticleId,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default)]
    pub content: String,
    pub is_original: bool,
    #[serde(
        default,
        deserialize_with = "lenient_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub published_date: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "lenient_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ArticleMetadata>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub references: Vec<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimized_version: Option<ArticleLink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_article: Option<ArticleLink>,
}

impl Article {
    pub fn kind(&self) -> ArticleKind {
        if self.is_original {
            ArticleKind::Original
        } else {
            ArticleKind::Optimized
        }
    }

    pub fn display_author(&self) -> &str {
        self.author_or(UNKNOWN_AUTHOR)
    }

    pub fn author_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        match self.author.as_deref() {
            Some(author) if !author.trim().is_empty() => author,
            _ => fallback,
        }
    }

    pub fn display_date(&self) -> Option<DateTime<Utc>> {
        self.published_date.or(self.created_at)
    }

    pub fn word_count(&self) -> Option<u32> {
        self.metadata.as_ref().and_then(|m| m.word_count)
    }

    pub fn reading_time(&self) -> Option<u32> {
        self.metadata.as_ref().and_then(|m| m.reading_time)
    }

    pub fn category(&self) -> Option<&str> {
        self.metadata.as_ref().and_then(|m| m.category.as_deref())
    }

    pub fn reference_count(&self) -> usize {
        self.references.len()
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &str> {
        self.content
            .split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    pub fn related_links(&self) -> RelatedLinks<'_> {
        RelatedLinks {
            optimized: self.optimized_version.as_ref().map(ArticleLink::id),
            original: self.original_article.as_ref().map(ArticleLink::id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelatedLinks<'a> {
    pub optimized: Option<&'a ArticleId>,
    pub original: Option<&'a ArticleId>,
}

fn lenient_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(raw) => parse_store_date(&raw),
        Value::Number(millis) => millis.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    })
}

/// Whole non-negative numbers only; anything else reads as absent.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let count = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        }),
        _ => None,
    };
    Ok(count.and_then(|n| u32::try_from(n).ok()))
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parses the date forms the store emits: RFC 3339 timestamps and bare
/// `YYYY-MM-DD` dates (taken as midnight UTC).
pub fn parse_store_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
