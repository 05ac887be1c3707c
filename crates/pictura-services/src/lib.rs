//! Pictura Services Layer
//!
//! Clients for the external collaborators of the ingestion pipeline and the
//! caption generator built on top of them:
//!
//! - [`secrets`]: named secret resolution (GCP Secret Manager, environment)
//! - [`captioning`]: the multimodal captioning service contract and its Gemini client
//! - [`caption`]: image bytes to a [`CaptionResult`](pictura_core::CaptionResult)

pub mod caption;
pub mod captioning;
pub mod secrets;

pub use caption::{CaptionError, CaptionGenerator, CAPTION_PROMPT};
pub use captioning::{
    CaptioningError, CaptioningService, GeminiClient, GenerationConfig, HarmBlockThreshold,
    HarmCategory, SafetySetting, StagedFile,
};
pub use secrets::{
    EnvSecretAccessor, GcpSecretManager, SecretAccessor, SecretError, StaticSecrets, TokenSource,
};
