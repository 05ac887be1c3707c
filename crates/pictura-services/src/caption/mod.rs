//! Caption generation
//!
//! Turns image bytes into a [`CaptionResult`]. Every failure along the way
//! (staging, generation, empty reply, extraction) becomes a failed result;
//! [`CaptionGenerator::generate`] itself never errors.

mod extraction;

pub use extraction::{find_json_object, parse_caption};

use crate::captioning::{CaptioningService, GenerationConfig, SafetySetting};
use bytes::Bytes;
use pictura_core::CaptionResult;
use std::sync::Arc;
use thiserror::Error;

pub const CAPTION_PROMPT: &str = "You are an expert image caption writer. Analyze the image and \
generate a concise title and a detailed description. Provide only the title and description in \
strict JSON format, without any introductory phrases or additional text. Return the output in \
strict JSON format like this: {\"title\": \"the generated title\", \"description\": \"the generated description\"}";

const IMAGE_MIME_TYPE: &str = "image/jpeg";

#[derive(Debug, Error)]
pub enum CaptionError {
    #[error("Failed to upload image to captioning service: {0}")]
    StageFailure(String),

    #[error("Caption generation failed: {0}")]
    GenerationFailure(String),

    #[error("Empty response from captioning service")]
    EmptyResponse,

    #[error("No JSON found in response")]
    NoJsonFound,

    #[error("JSON decoding error: {0}")]
    ParseFailure(String),
}

pub struct CaptionGenerator {
    service: Arc<dyn CaptioningService>,
    prompt: String,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

impl CaptionGenerator {
    /// Generator with the standard prompt, default sampling and safety
    /// filtering disabled for every category.
    pub fn new(service: Arc<dyn CaptioningService>) -> Self {
        Self {
            service,
            prompt: CAPTION_PROMPT.to_string(),
            generation_config: GenerationConfig::default(),
            safety_settings: SafetySetting::block_none(),
        }
    }

    /// Caption one image. `image_key` is only used for logging.
    #[tracing::instrument(skip_all, fields(image_key = %image_key, size_bytes = image.len()))]
    pub async fn generate(&self, image_key: &str, image: Bytes) -> CaptionResult {
        match self.try_generate(image_key, image).await {
            Ok(result) => {
                tracing::info!(title = %result.title, "Caption generated");
                result
            }
            Err(err) => {
                tracing::warn!(error = %err, "Caption generation failed");
                CaptionResult::failure(err.to_string())
            }
        }
    }

    async fn try_generate(&self, image_key: &str, image: Bytes) -> Result<CaptionResult, CaptionError> {
        let staged = self
            .service
            .stage(image, IMAGE_MIME_TYPE)
            .await
            .map_err(|e| CaptionError::StageFailure(e.to_string()))?;

        let reply = self
            .service
            .generate(
                &staged,
                &self.prompt,
                &self.generation_config,
                &self.safety_settings,
            )
            .await
            .map_err(|e| CaptionError::GenerationFailure(e.to_string()))?;

        tracing::debug!(image_key = %image_key, response = %reply, "Raw captioning response");

        parse_caption(&reply)
    }
}
