//! Gemini client over the Generative Language REST API

use super::{
    CaptioningError, CaptioningService, GenerationConfig, SafetySetting, StagedFile,
};
use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;

const UPLOAD_DISPLAY_NAME: &str = "pictura-upload";

/// Gemini captioning client.
///
/// Staging uses the Files API resumable protocol (`start`, then
/// `upload, finalize`); generation calls `models/{model}:generateContent`.
pub struct GeminiClient {
    http_client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl Debug for GeminiClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("GeminiClient")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content>,
    generation_config: &'a GenerationConfig,
    safety_settings: &'a [SafetySetting],
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    File {
        #[serde(rename = "fileData")]
        file_data: FileData,
    },
    Text {
        text: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileData {
    mime_type: String,
    file_uri: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: StagedFile,
}

impl GeminiClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client for Gemini")?;

        let model = model.into();
        let model = model.trim_start_matches("models/").to_string();

        Ok(Self {
            http_client,
            api_key: api_key.into(),
            model,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn error_from_response(response: reqwest::Response) -> CaptioningError {
        let status = response.status();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        CaptioningError::Api {
            status: status.as_u16(),
            message,
        }
    }

    async fn start_upload(&self, size: usize, mime_type: &str) -> Result<String, CaptioningError> {
        let mut headers = HeaderMap::new();
        headers.insert("X-Goog-Upload-Protocol", HeaderValue::from_static("resumable"));
        headers.insert("X-Goog-Upload-Command", HeaderValue::from_static("start"));
        headers.insert(
            "X-Goog-Upload-Header-Content-Length",
            HeaderValue::from(size as u64),
        );
        headers.insert(
            "X-Goog-Upload-Header-Content-Type",
            HeaderValue::from_str(mime_type)
                .map_err(|e| CaptioningError::Transport(e.to_string()))?,
        );

        let response = self
            .http_client
            .post(format!("{}/upload/v1beta/files", self.base_url))
            .query(&[("key", self.api_key.as_str())])
            .headers(headers)
            .json(&json!({"file": {"display_name": UPLOAD_DISPLAY_NAME}}))
            .send()
            .await
            .map_err(|e| CaptioningError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        response
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .ok_or_else(|| {
                CaptioningError::InvalidResponse("missing X-Goog-Upload-URL header".to_string())
            })
    }
}

#[async_trait]
impl CaptioningService for GeminiClient {
    async fn stage(&self, data: Bytes, mime_type: &str) -> Result<StagedFile, CaptioningError> {
        let start = std::time::Instant::now();
        let size = data.len();
        let upload_url = self.start_upload(size, mime_type).await?;

        let mut headers = HeaderMap::new();
        headers.insert(
            "X-Goog-Upload-Command",
            HeaderValue::from_static("upload, finalize"),
        );
        headers.insert("X-Goog-Upload-Offset", HeaderValue::from_static("0"));
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_str(mime_type)
                .map_err(|e| CaptioningError::Transport(e.to_string()))?,
        );

        let response = self
            .http_client
            .post(&upload_url)
            .headers(headers)
            .body(data)
            .send()
            .await
            .map_err(|e| CaptioningError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| CaptioningError::InvalidResponse(e.to_string()))?;

        tracing::info!(
            file = %uploaded.file.name,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Image staged with Gemini"
        );

        Ok(uploaded.file)
    }

    async fn generate(
        &self,
        file: &StagedFile,
        prompt: &str,
        config: &GenerationConfig,
        safety_settings: &[SafetySetting],
    ) -> Result<String, CaptioningError> {
        let start = std::time::Instant::now();

        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    Part::File {
                        file_data: FileData {
                            mime_type: file.mime_type.clone(),
                            file_uri: file.uri.clone(),
                        },
                    },
                    Part::Text {
                        text: prompt.to_string(),
                    },
                ],
            }],
            generation_config: config,
            safety_settings,
        };

        let response = self
            .http_client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, self.model
            ))
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| CaptioningError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| CaptioningError::InvalidResponse(e.to_string()))?;

        let Some(candidate) = parsed.candidates.into_iter().next() else {
            if let Some(reason) = parsed.prompt_feedback.and_then(|f| f.block_reason) {
                return Err(CaptioningError::Blocked(reason));
            }
            return Ok(String::new());
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        tracing::info!(
            model = %self.model,
            finish_reason = candidate.finish_reason.as_deref().unwrap_or("unknown"),
            response_chars = text.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Gemini generation completed"
        );

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn client(base_url: &str) -> GeminiClient {
        GeminiClient::new(
            "test-key",
            "gemini-1.5-flash",
            base_url,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn staged() -> StagedFile {
        StagedFile {
            name: "files/abc123".to_string(),
            uri: "https://generativelanguage.googleapis.com/v1beta/files/abc123".to_string(),
            mime_type: "image/jpeg".to_string(),
            state: Some("ACTIVE".to_string()),
        }
    }

    #[test]
    fn test_model_prefix_is_normalized() {
        let client = GeminiClient::new(
            "k",
            "models/gemini-1.5-flash",
            "http://localhost",
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(client.model(), "gemini-1.5-flash");
    }

    #[test]
    fn test_debug_hides_api_key() {
        let rendered = format!("{:?}", client("http://localhost"));
        assert!(!rendered.contains("test-key"));
    }

    #[tokio::test]
    async fn test_stage_resumable_upload() {
        let mut server = Server::new_async().await;
        let session_url = format!("{}/upload-session/xyz", server.url());

        let start_mock = server
            .mock("POST", "/upload/v1beta/files")
            .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
            .match_header("x-goog-upload-protocol", "resumable")
            .match_header("x-goog-upload-command", "start")
            .match_header("x-goog-upload-header-content-length", "4")
            .match_header("x-goog-upload-header-content-type", "image/jpeg")
            .with_status(200)
            .with_header("x-goog-upload-url", &session_url)
            .create_async()
            .await;

        let finalize_mock = server
            .mock("POST", "/upload-session/xyz")
            .match_header("x-goog-upload-command", "upload, finalize")
            .match_header("x-goog-upload-offset", "0")
            .with_status(200)
            .with_body(
                json!({"file": {
                    "name": "files/abc123",
                    "uri": "https://generativelanguage.googleapis.com/v1beta/files/abc123",
                    "mimeType": "image/jpeg",
                    "state": "ACTIVE"
                }})
                .to_string(),
            )
            .create_async()
            .await;

        let file = client(&server.url())
            .stage(Bytes::from_static(&[0xFF, 0xD8, 0xFF, 0xE0]), "image/jpeg")
            .await
            .unwrap();

        assert_eq!(file.name, "files/abc123");
        assert_eq!(file.mime_type, "image/jpeg");
        start_mock.assert_async().await;
        finalize_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_stage_start_failure_is_api_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/upload/v1beta/files")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body("API key not valid")
            .create_async()
            .await;

        let result = client(&server.url())
            .stage(Bytes::from_static(b"jpeg"), "image/jpeg")
            .await;

        match result {
            Err(CaptioningError::Api { status, message }) => {
                assert_eq!(status, 403);
                assert!(message.contains("API key not valid"));
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stage_missing_upload_url() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/upload/v1beta/files")
            .match_query(Matcher::Any)
            .with_status(200)
            .create_async()
            .await;

        let result = client(&server.url())
            .stage(Bytes::from_static(b"jpeg"), "image/jpeg")
            .await;
        assert!(matches!(result, Err(CaptioningError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_generate_sends_file_prompt_and_settings() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1beta/models/gemini-1.5-flash:generateContent")
            .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
            .match_body(Matcher::PartialJson(json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        {"fileData": {"mimeType": "image/jpeg", "fileUri": staged().uri}},
                        {"text": "describe"}
                    ]
                }],
                "generationConfig": {"topK": 64, "maxOutputTokens": 8192},
                "safetySettings": [
                    {"category": "HARM_CATEGORY_HATE_SPEECH", "threshold": "BLOCK_NONE"},
                    {"category": "HARM_CATEGORY_HARASSMENT", "threshold": "BLOCK_NONE"},
                    {"category": "HARM_CATEGORY_DANGEROUS_CONTENT", "threshold": "BLOCK_NONE"},
                    {"category": "HARM_CATEGORY_SEXUALLY_EXPLICIT", "threshold": "BLOCK_NONE"}
                ]
            })))
            .with_status(200)
            .with_body(
                json!({"candidates": [{
                    "content": {"role": "model", "parts": [
                        {"text": "{\"title\": \"A\", "},
                        {"text": "\"description\": \"B\"}"}
                    ]},
                    "finishReason": "STOP"
                }]})
                .to_string(),
            )
            .create_async()
            .await;

        let text = client(&server.url())
            .generate(
                &staged(),
                "describe",
                &GenerationConfig::default(),
                &SafetySetting::block_none(),
            )
            .await
            .unwrap();

        assert_eq!(text, "{\"title\": \"A\", \"description\": \"B\"}");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_without_candidates_is_empty() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/v1beta/models/gemini-1.5-flash:generateContent")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"candidates": []}"#)
            .create_async()
            .await;

        let text = client(&server.url())
            .generate(&staged(), "p", &GenerationConfig::default(), &[])
            .await
            .unwrap();
        assert!(text.is_empty());
    }

    #[tokio::test]
    async fn test_generate_blocked_prompt() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/v1beta/models/gemini-1.5-flash:generateContent")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"promptFeedback": {"blockReason": "OTHER"}}"#)
            .create_async()
            .await;

        let result = client(&server.url())
            .generate(&staged(), "p", &GenerationConfig::default(), &[])
            .await;
        assert!(matches!(result, Err(CaptioningError::Blocked(reason)) if reason == "OTHER"));
    }

    #[tokio::test]
    async fn test_generate_server_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/v1beta/models/gemini-1.5-flash:generateContent")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("internal")
            .create_async()
            .await;

        let result = client(&server.url())
            .generate(&staged(), "p", &GenerationConfig::default(), &[])
            .await;
        assert!(matches!(result, Err(CaptioningError::Api { status: 500, .. })));
    }
}
