use async_trait::async_trait;
use shared::{
    domain::{Article, ArticleId},
    protocol::ArticleQuery,
};
use tracing::debug;

use super::state::{Loaded, ViewQuery};
use crate::{
    error::ViewError,
    pairs::{derive_pairs, PairDerivation},
    ArticleRepository,
};

pub const LISTING_PAGE_SIZE: u32 = 9;

/// The fetch a view issues when it enters `Loading`. Repository failures are
/// converted to `ViewError` here so nothing escapes the view boundary.
#[async_trait]
pub trait ViewLoader: Send + Sync {
    type Data: Clone + Default + Send + Sync + 'static;

    async fn load(&self, query: ViewQuery) -> Result<Loaded<Self::Data>, ViewError>;
}

/// Paged article listing, honouring the filter.
pub struct ListingLoader<R> {
    repo: R,
    page_size: u32,
}

impl<R: ArticleRepository> ListingLoader<R> {
    pub fn new(repo: R) -> Self {
        Self::with_page_size(repo, LISTING_PAGE_SIZE)
    }

    pub fn with_page_size(repo: R, page_size: u32) -> Self {
        Self {
            repo,
            page_size: page_size.max(1),
        }
    }
}

#[async_trait]
impl<R: ArticleRepository> ViewLoader for ListingLoader<R> {
    type Data = Vec<Article>;

    async fn load(&self, query: ViewQuery) -> Result<Loaded<Self::Data>, ViewError> {
        let request = ArticleQuery::new(query.page, self.page_size)
            .with_is_original(query.filter.is_original());
        let page = self
            .repo
            .list_articles(request)
            .await
            .map_err(|err| ViewError::from_repository(err, "Failed to fetch articles"))?;
        debug!(
            filter = %query.filter,
            page = query.page,
            items = page.items.len(),
            total_pages = page.total_pages,
            "loaded article listing"
        );
        Ok(Loaded {
            items: page.items,
            total_pages: page.total_pages,
        })
    }
}

/// All comparison pairs in store order. Filter and page do not apply.
pub struct ComparisonLoader<R> {
    repo: R,
}

impl<R: ArticleRepository> ComparisonLoader<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl<R: ArticleRepository> ViewLoader for ComparisonLoader<R> {
    type Data = PairDerivation;

    async fn load(&self, _query: ViewQuery) -> Result<Loaded<Self::Data>, ViewError> {
        let records = self
            .repo
            .list_comparison_pairs()
            .await
            .map_err(|err| ViewError::from_repository(err, "Failed to fetch article pairs"))?;
        let derivation = derive_pairs(records);
        debug!(
            pairs = derivation.len(),
            skipped = derivation.skipped_count(),
            "derived comparison pairs"
        );
        Ok(Loaded::single(derivation))
    }
}

/// A single article by id.
pub struct DetailLoader<R> {
    repo: R,
    id: ArticleId,
}

impl<R: ArticleRepository> DetailLoader<R> {
    pub fn new(repo: R, id: ArticleId) -> Self {
        Self { repo, id }
    }

    pub fn id(&self) -> &ArticleId {
        &self.id
    }
}

#[async_trait]
impl<R: ArticleRepository> ViewLoader for DetailLoader<R> {
    type Data = Option<Article>;

    async fn load(&self, _query: ViewQuery) -> Result<Loaded<Self::Data>, ViewError> {
        let article = self
            .repo
            .get_article(&self.id)
            .await
            .map_err(|err| ViewError::from_repository(err, "Failed to fetch article"))?;
        Ok(Loaded::single(Some(article)))
    }
}
