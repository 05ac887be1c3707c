use async_trait::async_trait;
use bytes::Bytes;
use pictura_services::{
    CaptioningError, CaptioningService, GenerationConfig, SafetySetting, StagedFile,
};
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-process captioning service answering every request with a fixed reply.
pub struct ScriptedCaptioner {
    reply: String,
    calls: AtomicUsize,
}

impl ScriptedCaptioner {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of images staged so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptioningService for ScriptedCaptioner {
    async fn stage(&self, _data: Bytes, mime_type: &str) -> Result<StagedFile, CaptioningError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(StagedFile {
            name: "files/scripted".to_string(),
            uri: "mem://files/scripted".to_string(),
            mime_type: mime_type.to_string(),
            state: Some("ACTIVE".to_string()),
        })
    }

    async fn generate(
        &self,
        _file: &StagedFile,
        _prompt: &str,
        _config: &GenerationConfig,
        _safety_settings: &[SafetySetting],
    ) -> Result<String, CaptioningError> {
        Ok(self.reply.clone())
    }
}
