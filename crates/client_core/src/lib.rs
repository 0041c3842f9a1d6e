use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{header, Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Article, ArticleId},
    error::ApiError,
    protocol::{
        ArticleDraft, ArticleListResponse, ArticlePatch, ArticleQuery, ArticleResponse,
        PairListResponse, PairRecord,
    },
};
use tracing::{debug, warn};
use url::Url;

pub mod error;
pub mod pairs;
pub mod view;

pub use error::{ErrorAffordance, RepositoryError, ViewError, ViewErrorKind};

/// One page of the article listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticlePage {
    pub items: Vec<Article>,
    pub total_pages: u32,
}

/// Read/write access to the article store. Implementations hold no cached
/// state and may be shared freely between views.
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    async fn list_articles(&self, query: ArticleQuery) -> Result<ArticlePage, RepositoryError>;
    async fn get_article(&self, id: &ArticleId) -> Result<Article, RepositoryError>;
    async fn list_comparison_pairs(&self) -> Result<Vec<PairRecord>, RepositoryError>;
    async fn create_article(&self, draft: &ArticleDraft) -> Result<Article, RepositoryError>;
    async fn update_article(
        &self,
        id: &ArticleId,
        patch: &ArticlePatch,
    ) -> Result<Article, RepositoryError>;
    /// Returns the deleted article when the store echoes it.
    async fn delete_article(&self, id: &ArticleId) -> Result<Option<Article>, RepositoryError>;
}

#[async_trait]
impl<T> ArticleRepository for Arc<T>
where
    T: ArticleRepository + ?Sized,
{
    async fn list_articles(&self, query: ArticleQuery) -> Result<ArticlePage, RepositoryError> {
        (**self).list_articles(query).await
    }

    async fn get_article(&self, id: &ArticleId) -> Result<Article, RepositoryError> {
        (**self).get_article(id).await
    }

    async fn list_comparison_pairs(&self) -> Result<Vec<PairRecord>, RepositoryError> {
        (**self).list_comparison_pairs().await
    }

    async fn create_article(&self, draft: &ArticleDraft) -> Result<Article, RepositoryError> {
        (**self).create_article(draft).await
    }

    async fn update_article(
        &self,
        id: &ArticleId,
        patch: &ArticlePatch,
    ) -> Result<Article, RepositoryError> {
        (**self).update_article(id, patch).await
    }

    async fn delete_article(&self, id: &ArticleId) -> Result<Option<Article>, RepositoryError> {
        (**self).delete_article(id).await
    }
}

/// HTTP client for the article store's JSON API.
#[derive(Debug, Clone)]
pub struct ArticleClient {
    http: Client,
    base_url: Url,
}

impl ArticleClient {
    pub fn new(base_url: &str) -> Result<Self, RepositoryError> {
        Self::with_http_client(base_url, Client::new())
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, RepositoryError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| RepositoryError::InvalidRequest(err.to_string()))?;
        Self::with_http_client(base_url, http)
    }

    pub fn with_http_client(base_url: &str, http: Client) -> Result<Self, RepositoryError> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|err| RepositoryError::InvalidRequest(format!("{base_url}: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(RepositoryError::InvalidRequest(format!(
                "{base_url} cannot be used as a base URL"
            )));
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, RepositoryError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                RepositoryError::InvalidRequest(format!(
                    "{} cannot be used as a base URL",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, RepositoryError> {
        let url = self.endpoint(segments)?;
        Ok(self
            .http
            .request(method, url)
            .header(header::ACCEPT, "application/json"))
    }

    async fn send(request: RequestBuilder) -> Result<Response, RepositoryError> {
        let response = request.send().await.map_err(|err| {
            warn!(%err, "article store unreachable");
            RepositoryError::Network(err.to_string())
        })?;
        debug!(
            url = %response.url(),
            status = response.status().as_u16(),
            "article store responded"
        );
        Ok(response)
    }

    /// Reads a response body, mapping non-success statuses onto the error
    /// taxonomy. A 404 becomes `NotFound` only for id-addressed routes.
    async fn read_body<T: DeserializeOwned>(
        response: Response,
        addressed: Option<&ArticleId>,
    ) -> Result<T, RepositoryError> {
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| RepositoryError::Network(err.to_string()))?;

        if status == StatusCode::NOT_FOUND {
            if let Some(id) = addressed {
                return Err(RepositoryError::NotFound { id: id.clone() });
            }
        }

        if !status.is_success() {
            let message = serde_json::from_slice::<ApiError>(&body)
                .ok()
                .and_then(|api_error| api_error.best_message().map(str::to_string))
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or_else(|| "request failed".to_string());
            return Err(RepositoryError::Server {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&body).map_err(|err| RepositoryError::Decode(err.to_string()))
    }

    fn require_article(
        response: ArticleResponse,
        id: Option<&ArticleId>,
    ) -> Result<Article, RepositoryError> {
        match (response.data, id) {
            (Some(article), _) => Ok(article),
            (None, Some(id)) => Err(RepositoryError::NotFound { id: id.clone() }),
            (None, None) => Err(RepositoryError::Decode(
                "response did not include the affected article".to_string(),
            )),
        }
    }
}

#[async_trait]
impl ArticleRepository for ArticleClient {
    async fn list_articles(&self, query: ArticleQuery) -> Result<ArticlePage, RepositoryError> {
        let query = ArticleQuery::new(query.page, query.limit).with_is_original(query.is_original);
        let request = self.request(Method::GET, &["articles"])?.query(&query);
        let response = Self::send(request).await?;
        let body: ArticleListResponse = Self::read_body(response, None).await?;
        Ok(ArticlePage {
            total_pages: body.total_pages(),
            items: body.data,
        })
    }

    async fn get_article(&self, id: &ArticleId) -> Result<Article, RepositoryError> {
        let request = self.request(Method::GET, &["articles", id.as_str()])?;
        let response = Self::send(request).await?;
        let body: ArticleResponse = Self::read_body(response, Some(id)).await?;
        Self::require_article(body, Some(id))
    }

    async fn list_comparison_pairs(&self) -> Result<Vec<PairRecord>, RepositoryError> {
        let request = self.request(Method::GET, &["articles", "pairs"])?;
        let response = Self::send(request).await?;
        let body: PairListResponse = Self::read_body(response, None).await?;
        Ok(body.data)
    }

    async fn create_article(&self, draft: &ArticleDraft) -> Result<Article, RepositoryError> {
        let request = self.request(Method::POST, &["articles"])?.json(draft);
        let response = Self::send(request).await?;
        let body: ArticleResponse = Self::read_body(response, None).await?;
        Self::require_article(body, None)
    }

    async fn update_article(
        &self,
        id: &ArticleId,
        patch: &ArticlePatch,
    ) -> Result<Article, RepositoryError> {
        let request = self
            .request(Method::PUT, &["articles", id.as_str()])?
            .json(patch);
        let response = Self::send(request).await?;
        let body: ArticleResponse = Self::read_body(response, Some(id)).await?;
        Self::require_article(body, Some(id))
    }

    async fn delete_article(&self, id: &ArticleId) -> Result<Option<Article>, RepositoryError> {
        let request = self.request(Method::DELETE, &["articles", id.as_str()])?;
        let response = Self::send(request).await?;
        let body: ArticleResponse = Self::read_body(response, Some(id)).await?;
        Ok(body.data)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
