use serde::{Deserialize, Serialize};

use super::CaptionStatus;

pub const PENDING_TITLE: &str = "Title not generated yet";
pub const PENDING_DESCRIPTION: &str = "Description not generated yet";
pub const MISSING_TITLE: &str = "Title not found";
pub const MISSING_DESCRIPTION: &str = "Description not found";
pub const UNREADABLE_TITLE: &str = "Error loading title";
pub const UNREADABLE_DESCRIPTION: &str = "Error loading description";

/// What the retrieval path reports for one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDetails {
    pub filename: String,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CaptionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ImageDetails {
    /// No metadata record exists yet.
    pub fn pending(filename: impl Into<String>) -> Self {
        Self::placeholder(filename, PENDING_TITLE, PENDING_DESCRIPTION)
    }

    /// The record exists but could not be decoded.
    pub fn unreadable(filename: impl Into<String>) -> Self {
        Self::placeholder(filename, UNREADABLE_TITLE, UNREADABLE_DESCRIPTION)
    }

    fn placeholder(filename: impl Into<String>, title: &str, description: &str) -> Self {
        Self {
            filename: filename.into(),
            title: title.to_string(),
            description: description.to_string(),
            status: None,
            error_message: None,
        }
    }

    /// Build details from a decoded record, tolerating missing or mistyped keys.
    pub fn from_record(filename: impl Into<String>, record: &serde_json::Value) -> Self {
        let text = |key: &str| record.get(key).and_then(|v| v.as_str()).map(String::from);

        Self {
            filename: filename.into(),
            title: text("title").unwrap_or_else(|| MISSING_TITLE.to_string()),
            description: text("description").unwrap_or_else(|| MISSING_DESCRIPTION.to_string()),
            status: record
                .get("status")
                .and_then(|v| serde_json::from_value(v.clone()).ok()),
            error_message: text("error_message"),
        }
    }
}
