//! Multimodal captioning service contract
//!
//! Captioning is a two-step exchange: the image is staged with the service
//! first, then a generation request references the staged file.

mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptioningError {
    #[error("Request to captioning service failed: {0}")]
    Transport(String),

    #[error("Captioning service returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected response from captioning service: {0}")]
    InvalidResponse(String),

    #[error("Request blocked by captioning service: {0}")]
    Blocked(String),
}

/// Handle to an image staged with the captioning service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedFile {
    pub name: String,
    pub uri: String,
    pub mime_type: String,
    #[serde(default)]
    pub state: Option<String>,
}

/// Sampling parameters sent with every generation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
    pub response_mime_type: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            top_p: 0.95,
            top_k: 64,
            max_output_tokens: 8192,
            response_mime_type: "text/plain".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HarmCategory {
    #[serde(rename = "HARM_CATEGORY_HATE_SPEECH")]
    HateSpeech,
    #[serde(rename = "HARM_CATEGORY_HARASSMENT")]
    Harassment,
    #[serde(rename = "HARM_CATEGORY_DANGEROUS_CONTENT")]
    DangerousContent,
    #[serde(rename = "HARM_CATEGORY_SEXUALLY_EXPLICIT")]
    SexuallyExplicit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmBlockThreshold {
    BlockNone,
    BlockOnlyHigh,
    BlockMediumAndAbove,
    BlockLowAndAbove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SafetySetting {
    pub category: HarmCategory,
    pub threshold: HarmBlockThreshold,
}

impl SafetySetting {
    /// All four categories with blocking turned off.
    pub fn block_none() -> Vec<SafetySetting> {
        [
            HarmCategory::HateSpeech,
            HarmCategory::Harassment,
            HarmCategory::DangerousContent,
            HarmCategory::SexuallyExplicit,
        ]
        .into_iter()
        .map(|category| SafetySetting {
            category,
            threshold: HarmBlockThreshold::BlockNone,
        })
        .collect()
    }
}

/// External multimodal service able to describe an image.
#[async_trait]
pub trait CaptioningService: Send + Sync {
    /// Upload image bytes so later requests can reference them.
    async fn stage(&self, data: Bytes, mime_type: &str) -> Result<StagedFile, CaptioningError>;

    /// Run one generation over a staged image and return the reply text.
    async fn generate(
        &self,
        file: &StagedFile,
        prompt: &str,
        config: &GenerationConfig,
        safety_settings: &[SafetySetting],
    ) -> Result<String, CaptioningError>;
}
