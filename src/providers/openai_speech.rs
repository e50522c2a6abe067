use async_trait::async_trait;

use crate::adapter::{ArtifactResult, ProviderAdapter};
use crate::error::{ProviderError, ProviderErrorKind};
use crate::types::{Artifact, Capability, GenerationRequest, RequestPayload};
use crate::utils::http::{read_bytes_bounded, send_checked};

const DEFAULT_MAX_AUDIO_RESPONSE_BYTES: usize = 32 * 1024 * 1024;

/// Speech synthesis via the OpenAI audio/speech endpoint.
#[derive(Clone)]
pub struct OpenAiSpeech {
    http: reqwest::Client,
    name: String,
    base_url: String,
    api_key: String,
    model: String,
    voice: String,
    max_binary_response_bytes: usize,
}

impl OpenAiSpeech {
    pub fn new(api_key: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("reqwest client build should not fail");

        Self {
            http,
            name: "openai_tts".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: api_key.into(),
            model: "tts-1".to_string(),
            voice: "alloy".to_string(),
            max_binary_response_bytes: DEFAULT_MAX_AUDIO_RESPONSE_BYTES,
        }
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn with_provider_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    pub fn with_max_binary_response_bytes(mut self, max_bytes: usize) -> Self {
        self.max_binary_response_bytes = max_bytes;
        self
    }

    fn speech_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/audio/speech") {
            base.to_string()
        } else {
            format!("{base}/audio/speech")
        }
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiSpeech {
    fn provider(&self) -> &str {
        &self.name
    }

    fn capability(&self) -> Capability {
        Capability::TextToSpeech
    }

    async fn execute(
        &self,
        request: &GenerationRequest,
    ) -> std::result::Result<ArtifactResult, ProviderError> {
        let RequestPayload::Speech { text, voice } = &request.payload else {
            return Err(ProviderError::new(
                ProviderErrorKind::InvalidInput,
                "openai adapter serves text_to_speech payloads only",
            ));
        };

        let voice = voice
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(self.voice.as_str());
        let body = serde_json::json!({
            "model": self.model,
            "input": text,
            "voice": voice,
        });

        let response = send_checked(
            self.http
                .post(self.speech_url())
                .bearer_auth(&self.api_key)
                .json(&body),
        )
        .await?;

        let media_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("audio/mpeg")
            .to_string();
        let bytes = read_bytes_bounded(response, self.max_binary_response_bytes).await?;

        Ok(ArtifactResult {
            artifact: Artifact::Bytes {
                media_type,
                data: bytes,
            },
            billed_units: text.chars().count() as u64,
        })
    }
}
