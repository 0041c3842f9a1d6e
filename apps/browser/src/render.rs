//! Plain-text renderings of the three views.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use client_core::{
    pairs::{
        excerpt, ComparisonPair, PairDerivation, WordCountChange, COMPARISON_EXCERPT_LEN,
        LISTING_EXCERPT_LEN, OPTIMIZED_AUTHOR,
    },
    view::{ViewState, ViewStatus},
    ViewError,
};
use shared::domain::Article;

use crate::controller::events::error_guidance;

const RULE: &str = "------------------------------------------------------------";

pub fn format_long_date(date: Option<DateTime<Utc>>) -> String {
    match date {
        Some(date) => date.format("%B %-d, %Y").to_string(),
        None => "N/A".to_string(),
    }
}

pub fn format_thousands(value: impl Into<u64>) -> String {
    let value: u64 = value.into();
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn render_error(error: &ViewError) -> String {
    format!("! {}\n  {}\n", error.message(), error_guidance(error))
}

/// Shared prelude for every view: `Some(text)` when the status alone decides
/// what is shown.
fn render_status<T>(state: &ViewState<T>) -> Option<String> {
    match state.status() {
        ViewStatus::Idle | ViewStatus::Loading => Some("Loading...\n".to_string()),
        ViewStatus::Error => Some(match state.error() {
            Some(error) => render_error(error),
            None => "! Something went wrong\n".to_string(),
        }),
        ViewStatus::Ready => None,
    }
}

pub fn render_article_card(article: &Article) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[{}] {}", article.kind().label(), article.title);

    let mut meta = vec![
        format!("by {}", article.display_author()),
        format_long_date(article.display_date()),
    ];
    if let Some(minutes) = article.reading_time() {
        meta.push(format!("{minutes} min read"));
    }
    let _ = writeln!(out, "  {}", meta.join(" | "));
    let _ = writeln!(out, "  {}", excerpt(&article.content, LISTING_EXCERPT_LEN));

    let mut stats = Vec::new();
    if let Some(words) = article.word_count() {
        stats.push(format!("{} words", format_thousands(words)));
    }
    if let Some(category) = article.category() {
        stats.push(category.to_string());
    }
    if article.reference_count() > 0 {
        stats.push(format!("References: {}", article.reference_count()));
    }
    if !stats.is_empty() {
        let _ = writeln!(out, "  {}", stats.join(" | "));
    }

    let _ = writeln!(out, "  id: {}", article.id);
    if let Some(source) = &article.source_url {
        let _ = writeln!(out, "  source: {source}");
    }
    out
}

pub fn render_listing(state: &ViewState<Vec<Article>>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Articles ({})", state.filter().label());
    let _ = writeln!(out, "{RULE}");

    if let Some(status) = render_status(state) {
        out.push_str(&status);
        return out;
    }

    if state.items().is_empty() {
        out.push_str("No Articles Found\nThere are no articles to display yet.\n");
        return out;
    }

    for article in state.items() {
        out.push_str(&render_article_card(article));
        out.push('\n');
    }

    if state.total_pages() > 1 {
        let _ = writeln!(
            out,
            "Page {} of {}{}{}",
            state.current_page(),
            state.total_pages(),
            if state.has_previous_page() { "  [p] previous" } else { "" },
            if state.has_next_page() { "  [n] next" } else { "" },
        );
    }
    out
}

pub fn render_article(article: &Article) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} Article", article.kind().label());
    let _ = writeln!(out, "{}", article.title);
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "Author: {}", article.display_author());
    let _ = writeln!(out, "Published: {}", format_long_date(article.display_date()));
    if let Some(minutes) = article.reading_time() {
        let _ = writeln!(out, "Reading Time: {minutes} min");
    }
    if let Some(words) = article.word_count() {
        let _ = writeln!(out, "Words: {}", format_thousands(words));
    }
    if let Some(category) = article.category() {
        let _ = writeln!(out, "Category: {category}");
    }
    out.push('\n');

    for paragraph in article.paragraphs() {
        let _ = writeln!(out, "{paragraph}\n");
    }

    if !article.references.is_empty() {
        let _ = writeln!(out, "References");
        for (n, reference) in article.references.iter().enumerate() {
            let _ = writeln!(out, "  {}. {} <{}>", n + 1, reference.label(), reference.url);
        }
        out.push('\n');
    }

    let related = article.related_links();
    if let Some(id) = related.optimized {
        let _ = writeln!(out, "Optimized version available: content-browser show {id}");
    }
    if let Some(id) = related.original {
        let _ = writeln!(out, "Original version: content-browser show {id}");
    }
    if let Some(source) = &article.source_url {
        let _ = writeln!(out, "View original source: {source}");
    }
    out
}

pub fn render_detail(state: &ViewState<Option<Article>>) -> String {
    if let Some(status) = render_status(state) {
        return status;
    }
    match state.items() {
        Some(article) => render_article(article),
        None => "! Article not found\n".to_string(),
    }
}

fn render_side(out: &mut String, label: &str, article: &Article, author_fallback: &str) {
    let _ = writeln!(out, "  [{label}] {}", article.title);
    let mut meta = vec![format!("by {}", article.author_or(author_fallback))];
    if let Some(words) = article.word_count() {
        meta.push(format!("{} words", format_thousands(words)));
    }
    if let Some(minutes) = article.reading_time() {
        meta.push(format!("{minutes} min"));
    }
    let _ = writeln!(out, "    {}", meta.join(" | "));
    let _ = writeln!(out, "    {}", excerpt(&article.content, COMPARISON_EXCERPT_LEN));
}

/// Signed word-count change with thousands separators, e.g. `+1,150 words`.
pub fn format_change(change: WordCountChange) -> String {
    let sign = match change.delta {
        d if d > 0 => "+",
        d if d < 0 => "-",
        _ => "",
    };
    format!("{sign}{} words", format_thousands(change.delta.unsigned_abs()))
}

pub fn render_pair(number: usize, pair: &ComparisonPair) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Comparison #{number} [{}]", pair.status().label());
    render_side(&mut out, "Original", &pair.original, shared::domain::UNKNOWN_AUTHOR);
    let _ = writeln!(out, "    read: content-browser show {}", pair.original.id);

    match &pair.optimized {
        Some(optimized) => {
            render_side(&mut out, "Optimized", optimized, OPTIMIZED_AUTHOR);
            if optimized.reference_count() > 0 {
                let _ = writeln!(out, "    {} References", optimized.reference_count());
            }
            let _ = writeln!(out, "    read: content-browser show {}", optimized.id);
        }
        None => {
            let _ = writeln!(out, "  [Optimized] Optimization Pending");
            let _ = writeln!(out, "    This article hasn't been optimized yet.");
        }
    }

    if let Some(change) = pair.word_count_change() {
        let _ = writeln!(out, "  Word Count Change: {}", format_change(change));
    }
    out
}

pub fn render_comparison(state: &ViewState<PairDerivation>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Article Comparisons");
    let _ = writeln!(out, "{RULE}");

    if let Some(status) = render_status(state) {
        out.push_str(&status);
        return out;
    }

    let derivation = state.items();
    if derivation.is_empty() {
        out.push_str("No Comparisons Available\nNo optimized articles have been generated yet.\n");
    }
    for (index, pair) in derivation.pairs.iter().enumerate() {
        out.push_str(&render_pair(index + 1, pair));
        out.push('\n');
    }
    if derivation.skipped_count() > 0 {
        let _ = writeln!(
            out,
            "({} incomplete record(s) from the store were skipped)",
            derivation.skipped_count()
        );
    }
    out
}
