use shared::domain::ArticleId;
use thiserror::Error;

pub const NOT_FOUND_MESSAGE: &str = "Article not found";
pub const MALFORMED_RESPONSE_MESSAGE: &str = "Received a malformed response from the article store";

/// Uniform failure shape for every call against the article store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("failed to reach article store: {0}")]
    Network(String),
    #[error("article store reported failure ({status}): {message}")]
    Server { status: u16, message: String },
    #[error("malformed response from article store: {0}")]
    Decode(String),
    #[error("article {id} not found")]
    NotFound { id: ArticleId },
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl RepositoryError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Server { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewErrorKind {
    Network,
    Server,
    Decode,
    NotFound,
}

/// What the presentation layer should offer next to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAffordance {
    Retry,
    BackToListing,
    None,
}

/// Error as held by a view: a category plus the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewError {
    kind: ViewErrorKind,
    message: String,
}

impl ViewError {
    pub fn new(kind: ViewErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Converts a repository failure into its user-facing form. `fallback` is
    /// used when the failure itself carries nothing worth showing, e.g.
    /// "Failed to fetch articles".
    pub fn from_repository(err: RepositoryError, fallback: &str) -> Self {
        match err {
            RepositoryError::Network(_) | RepositoryError::InvalidRequest(_) => {
                Self::new(ViewErrorKind::Network, fallback)
            }
            RepositoryError::Server { message, .. } => {
                let message = message.trim();
                let message = if message.is_empty() { fallback } else { message };
                Self::new(ViewErrorKind::Server, message)
            }
            RepositoryError::Decode(_) => {
                Self::new(ViewErrorKind::Decode, MALFORMED_RESPONSE_MESSAGE)
            }
            RepositoryError::NotFound { .. } => Self::new(ViewErrorKind::NotFound, NOT_FOUND_MESSAGE),
        }
    }

    pub fn kind(&self) -> ViewErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn affordance(&self) -> ErrorAffordance {
        match self.kind {
            ViewErrorKind::Network | ViewErrorKind::Server => ErrorAffordance::Retry,
            ViewErrorKind::NotFound => ErrorAffordance::BackToListing,
            ViewErrorKind::Decode => ErrorAffordance::None,
        }
    }
}

impl std::fmt::Display for ViewError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}
