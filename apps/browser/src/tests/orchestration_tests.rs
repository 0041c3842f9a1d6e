use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use client_core::{ArticlePage, RepositoryError};
use serde_json::json;
use shared::{
    domain::Article,
    protocol::{ArticleQuery, PairRecord},
};

use super::*;

fn article(id: &str, is_original: bool) -> Article {
    serde_json::from_value(json!({
        "_id": id,
        "title": format!("Title {id}"),
        "isOriginal": is_original,
        "content": "Body text."
    }))
    .expect("article fixture")
}

/// Fixed set of articles; optionally fails every call.
#[derive(Default)]
struct FixtureRepository {
    articles: Vec<Article>,
    failing: bool,
    list_calls: AtomicUsize,
}

impl FixtureRepository {
    fn with_articles(count: usize) -> Arc<Self> {
        Arc::new(Self {
            articles: (0..count)
                .map(|n| article(&format!("a{n}"), n % 2 == 0))
                .collect(),
            ..Self::default()
        })
    }

    fn offline() -> Arc<Self> {
        Arc::new(Self {
            failing: true,
            ..Self::default()
        })
    }

    fn check(&self) -> Result<(), RepositoryError> {
        if self.failing {
            Err(RepositoryError::Network("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ArticleRepository for FixtureRepository {
    async fn list_articles(&self, query: ArticleQuery) -> Result<ArticlePage, RepositoryError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let matching: Vec<Article> = self
            .articles
            .iter()
            .filter(|a| query.is_original.map_or(true, |flag| a.is_original == flag))
            .cloned()
            .collect();
        let limit = query.limit as usize;
        let total_pages = matching.len().div_ceil(limit).max(1) as u32;
        let items = matching
            .into_iter()
            .skip((query.page as usize - 1) * limit)
            .take(limit)
            .collect();
        Ok(ArticlePage { items, total_pages })
    }

    async fn get_article(&self, id: &ArticleId) -> Result<Article, RepositoryError> {
        self.check()?;
        self.articles
            .iter()
            .find(|a| &a.id == id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound { id: id.clone() })
    }

    async fn list_comparison_pairs(&self) -> Result<Vec<PairRecord>, RepositoryError> {
        self.check()?;
        Ok(vec![PairRecord::new(Some(article("o1", true)), None)])
    }

    async fn create_article(&self, draft: &ArticleDraft) -> Result<Article, RepositoryError> {
        self.check()?;
        let mut created = article("new-1", draft.is_original);
        created.title = draft.title.clone();
        Ok(created)
    }

    async fn update_article(
        &self,
        id: &ArticleId,
        patch: &ArticlePatch,
    ) -> Result<Article, RepositoryError> {
        let mut updated = self.get_article(id).await?;
        if let Some(title) = &patch.title {
            updated.title = title.clone();
        }
        Ok(updated)
    }

    async fn delete_article(&self, id: &ArticleId) -> Result<Option<Article>, RepositoryError> {
        self.check()?;
        Ok(None)
    }
}

fn text(out: Vec<u8>) -> String {
    String::from_utf8(out).expect("utf8 output")
}

#[tokio::test]
async fn list_renders_requested_page() {
    let repo = FixtureRepository::with_articles(20);
    let mut out = Vec::new();

    let end = run_list(repo.clone(), 9, Filter::All, 2, &mut out)
        .await
        .expect("list");

    assert_eq!(end, ViewEnd::Ready);
    let out = text(out);
    assert!(out.contains("Page 2 of 3  [p] previous  [n] next"));
    assert!(out.contains("Title a9"));
    assert!(!out.contains("Title a0\n"));
    assert_eq!(repo.list_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn list_falls_back_to_last_page_when_out_of_range() {
    let repo = FixtureRepository::with_articles(4);
    let mut out = Vec::new();

    let end = run_list(repo.clone(), 9, Filter::Original, 5, &mut out)
        .await
        .expect("list");

    assert_eq!(end, ViewEnd::Ready);
    let out = text(out);
    assert!(out.contains("page 5 is out of range; showing page 1 of 1"));
    assert!(out.contains("Title a0"));
    assert_eq!(repo.list_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn failed_views_end_in_failure() {
    let mut out = Vec::new();
    let end = run_list(FixtureRepository::offline(), 9, Filter::All, 1, &mut out)
        .await
        .expect("list");
    assert_eq!(end, ViewEnd::Failed);
    assert!(text(out).contains("Failed to fetch articles"));

    let mut out = Vec::new();
    let end = run_show(
        FixtureRepository::with_articles(1),
        ArticleId::new("missing"),
        &mut out,
    )
    .await
    .expect("show");
    assert_eq!(end, ViewEnd::Failed);
    assert!(text(out).contains("Article not found"));
}

#[tokio::test]
async fn compare_renders_pending_pair() {
    let mut out = Vec::new();
    let end = run_compare(FixtureRepository::with_articles(0), &mut out)
        .await
        .expect("compare");
    assert_eq!(end, ViewEnd::Ready);
    assert!(text(out).contains("Optimization Pending"));
}

#[tokio::test]
async fn browse_follows_commands_until_quit() {
    let repo = FixtureRepository::with_articles(20);
    let input: &[u8] = b"n\nn\nn\nf optimized\nbogus\nq\nn\n";
    let mut out = Vec::new();

    let end = run_browse(repo.clone(), 9, input, &mut out)
        .await
        .expect("browse");

    assert_eq!(end, ViewEnd::Ready);
    let out = text(out);
    assert!(out.contains("Page 3 of 3"));
    assert!(out.contains("no such page; there are 3 page(s)"));
    assert!(out.contains("Articles (Optimized Only)"));
    assert!(out.contains("unknown command 'bogus'"));
    // initial load, two page moves, one filter change; nothing after `q`.
    assert_eq!(repo.list_calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn browse_retry_recovers_only_from_error() {
    let input: &[u8] = b"r\n";
    let mut out = Vec::new();
    let end = run_browse(FixtureRepository::with_articles(3), 9, input, &mut out)
        .await
        .expect("browse");
    assert_eq!(end, ViewEnd::Ready);
    assert!(text(out).contains("nothing to retry"));

    let input: &[u8] = b"r\n";
    let mut out = Vec::new();
    let end = run_browse(FixtureRepository::offline(), 9, input, &mut out)
        .await
        .expect("browse");
    assert_eq!(end, ViewEnd::Failed);
}

#[tokio::test]
async fn writes_read_json_files_and_echo_results() {
    let repo = FixtureRepository::with_articles(2);
    let dir = std::env::temp_dir().join(format!(
        "content_browser_writes_{}",
        std::process::id()
    ));
    tokio::fs::create_dir_all(&dir).await.expect("temp dir");
    let draft = dir.join("draft.json");
    tokio::fs::write(&draft, r#"{"title":"Fresh","content":"Hello."}"#)
        .await
        .expect("draft");
    let patch = dir.join("patch.json");
    tokio::fs::write(&patch, r#"{"title":"Renamed"}"#)
        .await
        .expect("patch");

    let mut out = Vec::new();
    run_create(&repo, &draft, &mut out).await.expect("create");
    run_update(&repo, &ArticleId::new("a1"), &patch, &mut out)
        .await
        .expect("update");
    run_delete(&repo, &ArticleId::new("a1"), &mut out)
        .await
        .expect("delete");
    let out = text(out);
    assert!(out.contains("created new-1"));
    assert!(out.contains("Fresh"));
    assert!(out.contains("updated a1"));
    assert!(out.contains("Renamed"));
    assert!(out.contains("deleted a1"));

    let missing = run_update(&repo, &ArticleId::new("zzz"), &patch, &mut Vec::new()).await;
    assert!(missing.is_err());

    tokio::fs::remove_dir_all(&dir).await.expect("cleanup");
}
