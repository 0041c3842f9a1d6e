//! Comparison pairs: an original article next to its optimized rewrite, with
//! the derived statistics shown between them.

use std::{borrow::Cow, fmt};

use shared::{
    domain::{Article, ArticleId},
    protocol::{PairRecord, PairSide},
};
use tracing::warn;

pub const TRUNCATION_MARKER: &str = "...";
pub const LISTING_EXCERPT_LEN: usize = 200;
pub const COMPARISON_EXCERPT_LEN: usize = 300;
pub const NO_CONTENT: &str = "No content available";
pub const OPTIMIZED_AUTHOR: &str = "AI Optimized";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairStatus {
    Optimized,
    Pending,
}

impl PairStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Optimized => "Optimized",
            Self::Pending => "Pending",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Increase,
    Decrease,
    Unchanged,
}

/// Signed word-count difference, optimized minus original.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordCountChange {
    pub delta: i64,
}

impl WordCountChange {
    pub fn trend(self) -> Trend {
        match self.delta {
            d if d > 0 => Trend::Increase,
            d if d < 0 => Trend::Decrease,
            _ => Trend::Unchanged,
        }
    }
}

impl fmt::Display for WordCountChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.delta > 0 {
            write!(f, "+{} words", self.delta)
        } else {
            write!(f, "{} words", self.delta)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonPair {
    pub original: Article,
    pub optimized: Option<Article>,
    /// Present only when both sides report a word count.
    pub word_count_delta: Option<i64>,
}

impl ComparisonPair {
    pub fn new(original: Article, optimized: Option<Article>) -> Self {
        let word_count_delta = optimized
            .as_ref()
            .and_then(|optimized| word_count_delta(&original, optimized));
        Self {
            original,
            optimized,
            word_count_delta,
        }
    }

    pub fn id(&self) -> &ArticleId {
        &self.original.id
    }

    pub fn status(&self) -> PairStatus {
        if self.optimized.is_some() {
            PairStatus::Optimized
        } else {
            PairStatus::Pending
        }
    }

    pub fn word_count_change(&self) -> Option<WordCountChange> {
        self.word_count_delta.map(|delta| WordCountChange { delta })
    }

    pub fn original_reference_count(&self) -> usize {
        self.original.reference_count()
    }

    pub fn optimized_reference_count(&self) -> Option<usize> {
        self.optimized.as_ref().map(Article::reference_count)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairIssue {
    /// Record dropped: there is nothing to compare against.
    MissingOriginal,
    /// Record dropped: the original could not be read.
    MalformedOriginal { reason: String },
    /// The optimized side could not be read; the pair is shown as pending.
    MalformedOptimized { reason: String },
    OriginalNotTaggedOriginal,
    OptimizedTaggedOriginal,
    /// A back-reference points somewhere other than the paired article.
    AsymmetricLink { expected: ArticleId, found: ArticleId },
}

impl PairIssue {
    pub fn drops_record(&self) -> bool {
        matches!(self, Self::MissingOriginal | Self::MalformedOriginal { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairDiagnostic {
    /// Position of the raw record in the store response.
    pub index: usize,
    pub issue: PairIssue,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PairDerivation {
    pub pairs: Vec<ComparisonPair>,
    pub diagnostics: Vec<PairDiagnostic>,
}

impl PairDerivation {
    pub fn skipped_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.issue.drops_record())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }
}

pub fn word_count_delta(original: &Article, optimized: &Article) -> Option<i64> {
    let before = original.word_count()?;
    let after = optimized.word_count()?;
    Some(i64::from(after) - i64::from(before))
}

/// Turns raw store records into display pairs. Never fails: records without
/// an original are dropped, other inconsistencies are only reported. Output
/// order follows input order.
pub fn derive_pairs(raw: impl IntoIterator<Item = PairRecord>) -> PairDerivation {
    let mut derivation = PairDerivation::default();

    for (index, record) in raw.into_iter().enumerate() {
        if let Some(defect) = record.defect(PairSide::Optimized) {
            warn!(index, reason = %defect.reason, "unreadable optimized article in comparison record");
            derivation.diagnostics.push(PairDiagnostic {
                index,
                issue: PairIssue::MalformedOptimized {
                    reason: defect.reason.clone(),
                },
            });
        }

        let Some(original) = record.original else {
            let issue = match record.defect(PairSide::Original) {
                Some(defect) => {
                    warn!(index, reason = %defect.reason, "skipping comparison record with an unreadable original");
                    PairIssue::MalformedOriginal {
                        reason: defect.reason.clone(),
                    }
                }
                None => {
                    warn!(index, "skipping comparison record without an original article");
                    PairIssue::MissingOriginal
                }
            };
            derivation.diagnostics.push(PairDiagnostic { index, issue });
            continue;
        };

        for issue in consistency_issues(&original, record.optimized.as_ref()) {
            warn!(index, original = %original.id, ?issue, "inconsistent comparison record");
            derivation.diagnostics.push(PairDiagnostic { index, issue });
        }

        derivation
            .pairs
            .push(ComparisonPair::new(original, record.optimized));
    }

    derivation
}

fn consistency_issues(original: &Article, optimized: Option<&Article>) -> Vec<PairIssue> {
    let mut issues = Vec::new();
    if !original.is_original {
        issues.push(PairIssue::OriginalNotTaggedOriginal);
    }

    let Some(optimized) = optimized else {
        return issues;
    };

    if optimized.is_original {
        issues.push(PairIssue::OptimizedTaggedOriginal);
    }
    if let Some(link) = &optimized.original_article {
        if link.id() != &original.id {
            issues.push(PairIssue::AsymmetricLink {
                expected: original.id.clone(),
                found: link.id().clone(),
            });
        }
    }
    if let Some(link) = &original.optimized_version {
        if link.id() != &optimized.id {
            issues.push(PairIssue::AsymmetricLink {
                expected: optimized.id.clone(),
                found: link.id().clone(),
            });
        }
    }
    issues
}

/// Cuts `text` to at most `max_len` characters followed by the truncation
/// marker. Text already within the limit is returned untouched.
pub fn truncate(text: &str, max_len: usize) -> Cow<'_, str> {
    match text.char_indices().nth(max_len) {
        Some((cut, _)) => Cow::Owned(format!("{}{TRUNCATION_MARKER}", &text[..cut])),
        None => Cow::Borrowed(text),
    }
}

/// Excerpt for a card: the truncated content, or a placeholder when there is
/// no content at all.
pub fn excerpt(content: &str, max_len: usize) -> Cow<'_, str> {
    if content.trim().is_empty() {
        Cow::Borrowed(NO_CONTENT)
    } else {
        truncate(content, max_len)
    }
}
