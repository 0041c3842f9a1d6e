use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::{Article, ArticleId, ArticleMetadata, Reference};

/// Query for `GET /articles`. Page and limit are 1-based and never zero on the
/// wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleQuery {
    pub page: u32,
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_original: Option<bool>,
}

impl ArticleQuery {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
            is_original: None,
        }
    }

    pub fn with_is_original(mut self, is_original: Option<bool>) -> Self {
        self.is_original = is_original;
        self
    }
}

/// `GET /articles` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleListResponse {
    pub data: Vec<Article>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

impl ArticleListResponse {
    pub fn total_pages(&self) -> u32 {
        self.pages.unwrap_or(1).max(1)
    }
}

/// Single-document envelope shared by `GET /articles/:id` and the write
/// routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleResponse {
    #[serde(default)]
    pub data: Option<Article>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// One entry of `GET /articles/pairs` as the store sends it. `original` is
/// optional here because the store is not trusted to always populate it.
///
/// Decoding never fails on the content of a single entry: a side that is not
/// a readable article is left empty and recorded in `defects`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PairRecord {
    pub original: Option<Article>,
    pub optimized: Option<Article>,
    #[serde(skip)]
    pub defects: Vec<SideDefect>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairSide {
    Original,
    Optimized,
}

/// A side of a pair record that was present but could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideDefect {
    pub side: PairSide,
    pub reason: String,
}

impl PairRecord {
    pub fn new(original: Option<Article>, optimized: Option<Article>) -> Self {
        Self {
            original,
            optimized,
            defects: Vec::new(),
        }
    }

    pub fn defect(&self, side: PairSide) -> Option<&SideDefect> {
        self.defects.iter().find(|defect| defect.side == side)
    }

    fn decode_side(&mut self, side: PairSide, raw: Option<Value>) -> Option<Article> {
        let raw = raw.filter(|value| !value.is_null())?;
        match serde_json::from_value(raw) {
            Ok(article) => Some(article),
            Err(err) => {
                self.defects.push(SideDefect {
                    side,
                    reason: err.to_string(),
                });
                None
            }
        }
    }
}

impl<'de> Deserialize<'de> for PairRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut record = Self::default();
        let Value::Object(mut fields) = Value::deserialize(deserializer)? else {
            record.defects.push(SideDefect {
                side: PairSide::Original,
                reason: "pair record is not an object".to_string(),
            });
            return Ok(record);
        };
        record.original = record.decode_side(PairSide::Original, fields.remove("original"));
        record.optimized = record.decode_side(PairSide::Optimized, fields.remove("optimized"));
        Ok(record)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairListResponse {
    pub data: Vec<PairRecord>,
}

/// Body of `POST /articles`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDraft {
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default = "default_true")]
    pub is_original: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ArticleMetadata>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_article: Option<ArticleId>,
}

fn default_true() -> bool {
    true
}

/// Body of `PUT /articles/:id`; absent fields are left untouched by the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticlePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ArticleMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<Vec<Reference>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimized_version: Option<ArticleId>,
}
