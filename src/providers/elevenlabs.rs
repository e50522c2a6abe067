use async_trait::async_trait;

use crate::adapter::{ArtifactResult, ProviderAdapter};
use crate::error::{ProviderError, ProviderErrorKind};
use crate::types::{Artifact, Capability, GenerationRequest, RequestPayload};
use crate::utils::http::{read_bytes_bounded, send_checked};

const DEFAULT_MAX_AUDIO_RESPONSE_BYTES: usize = 32 * 1024 * 1024;
const DEFAULT_VOICE_ID: &str = "EXAVITQu4vr4xnSDxMaL";

/// Speech synthesis via the ElevenLabs text-to-speech API. The response
/// body is the raw encoded audio.
#[derive(Clone)]
pub struct ElevenLabsSpeech {
    http: reqwest::Client,
    name: String,
    base_url: String,
    api_key: String,
    voice_id: String,
    model_id: String,
    max_binary_response_bytes: usize,
}

impl ElevenLabsSpeech {
    pub fn new(api_key: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("reqwest client build should not fail");

        Self {
            http,
            name: "elevenlabs".to_string(),
            base_url: "https://api.elevenlabs.io".to_string(),
            api_key: api_key.into(),
            voice_id: DEFAULT_VOICE_ID.to_string(),
            model_id: "eleven_monolingual_v1".to_string(),
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

    pub fn with_voice_id(mut self, voice_id: impl Into<String>) -> Self {
        self.voice_id = voice_id.into();
        self
    }

    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    pub fn with_max_binary_response_bytes(mut self, max_bytes: usize) -> Self {
        self.max_binary_response_bytes = max_bytes;
        self
    }

    fn speech_url(&self, voice_id: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        format!("{base}/v1/text-to-speech/{voice_id}")
    }
}

#[async_trait]
impl ProviderAdapter for ElevenLabsSpeech {
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
                "elevenlabs adapter serves text_to_speech payloads only",
            ));
        };

        let voice_id = voice
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(self.voice_id.as_str());
        let body = serde_json::json!({
            "text": text,
            "model_id": self.model_id,
            "voice_settings": { "stability": 0.5, "similarity_boost": 0.75 },
        });

        let response = send_checked(
            self.http
                .post(self.speech_url(voice_id))
                .header("xi-api-key", &self.api_key)
                .header(reqwest::header::ACCEPT, "audio/mpeg")
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

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    #[tokio::test]
    async fn speak_posts_json_and_returns_audio_bytes() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(format!("/v1/text-to-speech/{DEFAULT_VOICE_ID}"))
                    .header("xi-api-key", "test-key")
                    .body_includes("\"model_id\":\"eleven_monolingual_v1\"");
                then.status(200)
                    .header("content-type", "audio/mpeg")
                    .body(&[1u8, 2, 3, 4][..]);
            })
            .await;

        let adapter = ElevenLabsSpeech::new("test-key").with_base_url(server.base_url());
        let result = adapter
            .execute(&GenerationRequest::speech("hello world"))
            .await
            .expect("speak");

        mock.assert_async().await;
        assert_eq!(result.billed_units, 11);
        match result.artifact {
            Artifact::Bytes { media_type, data } => {
                assert_eq!(media_type, "audio/mpeg");
                assert_eq!(data.as_ref(), &[1, 2, 3, 4]);
            }
            other => panic!("unexpected artifact: {other:?}"),
        }
    }

    #[tokio::test]
    async fn request_voice_overrides_the_default() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/text-to-speech/custom-voice");
                then.status(200)
                    .header("content-type", "audio/mpeg")
                    .body(&[0u8][..]);
            })
            .await;

        let adapter = ElevenLabsSpeech::new("test-key").with_base_url(server.base_url());
        let mut request = GenerationRequest::speech("hi");
        if let RequestPayload::Speech { voice, .. } = &mut request.payload {
            *voice = Some("custom-voice".to_string());
        }
        adapter.execute(&request).await.expect("speak");

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn quota_errors_normalize_to_rate_limited() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(format!("/v1/text-to-speech/{DEFAULT_VOICE_ID}"));
                then.status(429).body("character quota exceeded");
            })
            .await;

        let adapter = ElevenLabsSpeech::new("test-key").with_base_url(server.base_url());
        let err = adapter
            .execute(&GenerationRequest::speech("hello"))
            .await
            .expect_err("rate limited");
        assert_eq!(err.kind, ProviderErrorKind::RateLimited);
    }
}
