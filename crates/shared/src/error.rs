use serde::{Deserialize, Serialize};

/// Failure body the article store sends alongside a non-success status.
/// Every field is optional; stores are inconsistent about which one they fill.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: Some(false),
            message: Some(message.into()),
            error: None,
        }
    }

    /// The most specific human-readable message in the body, if any.
    pub fn best_message(&self) -> Option<&str> {
        [self.message.as_deref(), self.error.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|m| !m.is_empty())
    }
}
