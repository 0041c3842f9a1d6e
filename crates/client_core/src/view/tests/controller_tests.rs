use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use serde_json::json;
use shared::{
    domain::{Article, ArticleId},
    protocol::{ArticleDraft, ArticlePatch, ArticleQuery, PairRecord},
};
use tokio::sync::{oneshot, Mutex};

use super::*;
use crate::{
    error::{ErrorAffordance, ViewErrorKind},
    ArticlePage, ArticleRepository, RepositoryError,
};

fn article(id: &str, is_original: bool, word_count: Option<u32>) -> Article {
    let mut value = json!({ "_id": id, "isOriginal": is_original, "title": id });
    if let Some(word_count) = word_count {
        value["metadata"] = json!({ "wordCount": word_count });
    }
    serde_json::from_value(value).expect("article fixture")
}

/// Gate that holds a listing call for one `isOriginal` value until released.
struct Gate {
    started: Option<oneshot::Sender<()>>,
    release: oneshot::Receiver<()>,
}

#[derive(Default)]
struct MemoryRepository {
    articles: Vec<Article>,
    pairs: Vec<PairRecord>,
    failures: Mutex<Vec<RepositoryError>>,
    gates: Mutex<HashMap<Option<bool>, Gate>>,
    list_calls: Mutex<Vec<ArticleQuery>>,
    pair_calls: AtomicUsize,
}

impl MemoryRepository {
    fn with_articles(articles: Vec<Article>) -> Self {
        Self {
            articles,
            ..Self::default()
        }
    }

    async fn fail_next(&self, err: RepositoryError) {
        self.failures.lock().await.push(err);
    }

    /// Returns (started, release): `started` fires once the gated call is in
    /// flight, sending on `release` lets it finish.
    async fn gate(&self, is_original: Option<bool>) -> (oneshot::Receiver<()>, oneshot::Sender<()>) {
        let (started_tx, started_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        self.gates.lock().await.insert(
            is_original,
            Gate {
                started: Some(started_tx),
                release: release_rx,
            },
        );
        (started_rx, release_tx)
    }

    async fn take_failure(&self) -> Option<RepositoryError> {
        let mut failures = self.failures.lock().await;
        if failures.is_empty() {
            None
        } else {
            Some(failures.remove(0))
        }
    }
}

#[async_trait]
impl ArticleRepository for MemoryRepository {
    async fn list_articles(&self, query: ArticleQuery) -> Result<ArticlePage, RepositoryError> {
        self.list_calls.lock().await.push(query);
        let gate = self.gates.lock().await.remove(&query.is_original);
        if let Some(mut gate) = gate {
            if let Some(started) = gate.started.take() {
                let _ = started.send(());
            }
            let _ = gate.release.await;
        }
        if let Some(err) = self.take_failure().await {
            return Err(err);
        }

        let limit = query.limit as usize;
        let matching: Vec<&Article> = self
            .articles
            .iter()
            .filter(|a| query.is_original.map_or(true, |flag| a.is_original == flag))
            .collect();
        let total_pages = u32::try_from(matching.len().div_ceil(limit))
            .unwrap_or(u32::MAX)
            .max(1);
        let items = matching
            .into_iter()
            .skip((query.page as usize - 1) * limit)
            .take(limit)
            .cloned()
            .collect();
        Ok(ArticlePage { items, total_pages })
    }

    async fn get_article(&self, id: &ArticleId) -> Result<Article, RepositoryError> {
        if let Some(err) = self.take_failure().await {
            return Err(err);
        }
        self.articles
            .iter()
            .find(|a| &a.id == id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound { id: id.clone() })
    }

    async fn list_comparison_pairs(&self) -> Result<Vec<PairRecord>, RepositoryError> {
        self.pair_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.take_failure().await {
            return Err(err);
        }
        Ok(self.pairs.clone())
    }

    async fn create_article(&self, _draft: &ArticleDraft) -> Result<Article, RepositoryError> {
        Err(RepositoryError::InvalidRequest("read-only".into()))
    }

    async fn update_article(
        &self,
        _id: &ArticleId,
        _patch: &ArticlePatch,
    ) -> Result<Article, RepositoryError> {
        Err(RepositoryError::InvalidRequest("read-only".into()))
    }

    async fn delete_article(&self, _id: &ArticleId) -> Result<Option<Article>, RepositoryError> {
        Err(RepositoryError::InvalidRequest("read-only".into()))
    }
}

fn corpus(originals: usize, optimized: usize) -> Vec<Article> {
    (0..originals)
        .map(|n| article(&format!("o{n}"), true, Some(500)))
        .chain((0..optimized).map(|n| article(&format!("p{n}"), false, Some(650))))
        .collect()
}

fn ids(articles: &[Article]) -> Vec<&str> {
    articles.iter().map(|a| a.id.as_str()).collect()
}

#[tokio::test]
async fn listing_loads_first_page_of_all_articles() {
    let repo = Arc::new(MemoryRepository::with_articles(corpus(20, 5)));
    let controller = ListingController::new(ListingLoader::new(repo.clone()));

    assert_eq!(controller.snapshot().await.status(), ViewStatus::Idle);
    assert_eq!(controller.load().await, DispatchOutcome::Applied);

    let state = controller.snapshot().await;
    assert_eq!(state.status(), ViewStatus::Ready);
    assert_eq!(state.items().len(), LISTING_PAGE_SIZE as usize);
    assert_eq!(state.total_pages(), 3);
    assert_eq!(
        repo.list_calls.lock().await.as_slice(),
        [ArticleQuery::new(1, 9)]
    );
}

#[tokio::test]
async fn filter_change_requests_page_one_with_flag() {
    let repo = Arc::new(MemoryRepository::with_articles(corpus(20, 5)));
    let controller = ListingController::new(ListingLoader::new(repo.clone()));
    controller.load().await;
    controller.set_page(3).await;
    assert_eq!(controller.snapshot().await.current_page(), 3);

    controller.set_filter(Filter::Optimized).await;
    let state = controller.snapshot().await;
    assert_eq!(state.current_page(), 1);
    assert_eq!(state.total_pages(), 1);
    assert_eq!(ids(state.items()), ["p0", "p1", "p2", "p3", "p4"]);
    assert_eq!(
        repo.list_calls.lock().await.last().copied(),
        Some(ArticleQuery::new(1, 9).with_is_original(Some(false)))
    );
}

#[tokio::test]
async fn out_of_range_page_issues_no_request() {
    let repo = Arc::new(MemoryRepository::with_articles(corpus(10, 0)));
    let controller = ListingController::new(ListingLoader::new(repo.clone()));
    controller.load().await;
    let before = controller.snapshot().await;

    assert_eq!(controller.set_page(0).await, DispatchOutcome::Ignored);
    assert_eq!(controller.set_page(3).await, DispatchOutcome::Ignored);
    assert_eq!(controller.previous_page().await, DispatchOutcome::Ignored);

    assert_eq!(controller.snapshot().await, before);
    assert_eq!(repo.list_calls.lock().await.len(), 1);

    assert_eq!(controller.next_page().await, DispatchOutcome::Applied);
    assert_eq!(ids(controller.snapshot().await.items()), ["o9"]);
    assert_eq!(controller.next_page().await, DispatchOutcome::Ignored);
}

#[tokio::test]
async fn stale_slow_fetch_does_not_overwrite_newer_result() {
    let repo = Arc::new(MemoryRepository::with_articles(corpus(3, 2)));
    let controller = Arc::new(ListingController::new(ListingLoader::new(repo.clone())));
    let (started, release) = repo.gate(Some(true)).await;

    let slow = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.set_filter(Filter::Original).await })
    };
    started.await.expect("slow fetch in flight");

    let fast = controller.set_filter(Filter::Optimized).await;
    assert_eq!(fast, DispatchOutcome::Applied);

    release.send(()).expect("release slow fetch");
    let slow = tokio::time::timeout(Duration::from_secs(5), slow)
        .await
        .expect("slow fetch finishes")
        .expect("join");
    assert_eq!(slow, DispatchOutcome::Superseded);

    let state = controller.snapshot().await;
    assert_eq!(state.status(), ViewStatus::Ready);
    assert_eq!(state.filter(), Filter::Optimized);
    assert_eq!(ids(state.items()), ["p0", "p1"]);
}

#[tokio::test]
async fn stale_failure_does_not_flip_view_into_error() {
    let repo = Arc::new(MemoryRepository::with_articles(corpus(3, 2)));
    let controller = Arc::new(ListingController::new(ListingLoader::new(repo.clone())));
    let (started, release) = repo.gate(None).await;

    let slow = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.load().await })
    };
    started.await.expect("slow fetch in flight");

    controller.set_filter(Filter::Original).await;
    repo.fail_next(RepositoryError::Network("reset".into())).await;
    release.send(()).expect("release");
    assert_eq!(slow.await.expect("join"), DispatchOutcome::Superseded);

    let state = controller.snapshot().await;
    assert_eq!(state.status(), ViewStatus::Ready);
    assert!(state.error().is_none());
    assert_eq!(ids(state.items()), ["o0", "o1", "o2"]);
}

#[tokio::test]
async fn failure_then_retry_recovers_with_same_parameters() {
    let repo = Arc::new(MemoryRepository::with_articles(corpus(12, 0)));
    let controller = ListingController::new(ListingLoader::new(repo.clone()));
    controller.load().await;

    repo.fail_next(RepositoryError::Server {
        status: 500,
        message: "Error fetching articles".into(),
    })
    .await;
    controller.set_page(2).await;

    let failed = controller.snapshot().await;
    assert_eq!(failed.status(), ViewStatus::Error);
    let error = failed.error().expect("error recorded");
    assert_eq!(error.message(), "Error fetching articles");
    assert_eq!(error.affordance(), ErrorAffordance::Retry);

    assert_eq!(controller.retry().await, DispatchOutcome::Applied);
    let state = controller.snapshot().await;
    assert_eq!(state.status(), ViewStatus::Ready);
    assert_eq!(state.current_page(), 2);
    assert_eq!(ids(state.items()), ["o9", "o10", "o11"]);

    let calls = repo.list_calls.lock().await;
    assert_eq!(calls[calls.len() - 1], calls[calls.len() - 2]);
}

#[tokio::test]
async fn network_failure_uses_fallback_message() {
    let repo = Arc::new(MemoryRepository::default());
    repo.fail_next(RepositoryError::Network("connection refused".into()))
        .await;
    let controller = ListingController::new(ListingLoader::new(repo));
    controller.load().await;

    let state = controller.snapshot().await;
    let error = state.error().expect("error");
    assert_eq!(error.kind(), ViewErrorKind::Network);
    assert_eq!(error.message(), "Failed to fetch articles");
}

#[tokio::test]
async fn comparison_view_derives_pairs_and_reports_skips() {
    let repo = Arc::new(MemoryRepository {
        pairs: vec![
            PairRecord::new(
                Some(article("o1", true, Some(500))),
                Some(article("p1", false, Some(650))),
            ),
            PairRecord::new(None, Some(article("p9", false, None))),
            PairRecord::new(Some(article("o2", true, Some(800))), None),
        ],
        ..MemoryRepository::default()
    });
    let controller = ComparisonController::new(ComparisonLoader::new(repo.clone()));
    controller.load().await;

    let state = controller.snapshot().await;
    assert_eq!(state.status(), ViewStatus::Ready);
    let derivation = state.items();
    assert_eq!(derivation.len(), 2);
    assert_eq!(derivation.skipped_count(), 1);
    assert_eq!(derivation.pairs[0].word_count_delta, Some(150));
    assert!(derivation.pairs[1].optimized.is_none());
    assert_eq!(repo.pair_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn comparison_view_empty_is_ready_not_pending() {
    let repo = Arc::new(MemoryRepository::default());
    let controller = ComparisonController::new(ComparisonLoader::new(repo));
    controller.load().await;
    let state = controller.snapshot().await;
    assert_eq!(state.status(), ViewStatus::Ready);
    assert!(state.items().is_empty());
}

#[tokio::test]
async fn detail_view_reports_not_found_with_back_affordance() {
    let repo = Arc::new(MemoryRepository::with_articles(corpus(1, 0)));

    let found = DetailController::new(DetailLoader::new(repo.clone(), "o0".into()));
    found.load().await;
    assert_eq!(
        found
            .snapshot()
            .await
            .items()
            .as_ref()
            .map(|a| a.id.as_str()),
        Some("o0")
    );

    let missing = DetailController::new(DetailLoader::new(repo, "nope".into()));
    missing.load().await;
    let state = missing.snapshot().await;
    assert_eq!(state.status(), ViewStatus::Error);
    let error = state.error().expect("error");
    assert_eq!(error.kind(), ViewErrorKind::NotFound);
    assert_eq!(error.message(), "Article not found");
    assert_eq!(error.affordance(), ErrorAffordance::BackToListing);
}
