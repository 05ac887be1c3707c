use serde::{Deserialize, Serialize};
use std::fmt;

pub const FAILED_TITLE: &str = "Error generating title";
pub const FAILED_DESCRIPTION: &str = "Error generating description";
pub const DEFAULT_TITLE: &str = "Untitled";
pub const DEFAULT_DESCRIPTION: &str = "No description available";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionStatus {
    Success,
    Failure,
}

impl fmt::Display for CaptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptionStatus::Success => write!(f, "success"),
            CaptionStatus::Failure => write!(f, "failure"),
        }
    }
}

/// Outcome of one captioning run. Failures are data, not errors: they are
/// persisted like any other result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionResult {
    pub title: String,
    pub description: String,
    pub status: CaptionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl CaptionResult {
    /// Successful result; absent fields fall back to the default title and
    /// description.
    pub fn success(title: Option<String>, description: Option<String>) -> Self {
        Self {
            title: title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            description: description.unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            status: CaptionStatus::Success,
            error_message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            title: FAILED_TITLE.to_string(),
            description: FAILED_DESCRIPTION.to_string(),
            status: CaptionStatus::Failure,
            error_message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == CaptionStatus::Success
    }

    /// Plain-text rendering used for the `.txt` sidecar.
    pub fn to_text(&self) -> String {
        format!("Title: {}\nDescription: {}", self.title, self.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_defaults() {
        let result = CaptionResult::success(None, None);
        assert_eq!(result.title, DEFAULT_TITLE);
        assert_eq!(result.description, DEFAULT_DESCRIPTION);
        assert!(result.is_success());
        assert!(result.error_message.is_none());
    }

    #[test]
    fn test_failure_carries_message() {
        let result = CaptionResult::failure("Empty response from captioning service");
        assert_eq!(result.status, CaptionStatus::Failure);
        assert_eq!(result.title, FAILED_TITLE);
        assert_eq!(result.description, FAILED_DESCRIPTION);
        assert_eq!(
            result.error_message.as_deref(),
            Some("Empty response from captioning service")
        );
    }

    #[test]
    fn test_serialized_shape() {
        let result = CaptionResult::success(Some("A".into()), Some("B".into()));
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"title": "A", "description": "B", "status": "success"})
        );

        let failure = serde_json::to_value(CaptionResult::failure("boom")).unwrap();
        assert_eq!(failure["status"], "failure");
        assert_eq!(failure["error_message"], "boom");
    }

    #[test]
    fn test_to_text() {
        let result = CaptionResult::success(Some("Dunes".into()), Some("Sand at dusk".into()));
        assert_eq!(result.to_text(), "Title: Dunes\nDescription: Sand at dusk");
    }
}
