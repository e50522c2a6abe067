use async_trait::async_trait;
use base64::Engine as _;
use serde::Deserialize;

use crate::adapter::{ArtifactResult, ProviderAdapter};
use crate::error::{ProviderError, ProviderErrorKind};
use crate::types::{Artifact, Capability, GenerationRequest, RequestPayload};
use crate::utils::http::send_checked;

const DEFAULT_ENHANCEMENT_PROMPT: &str = "Enhance this photo for professional video creation. \
     Improve lighting, clarity, and overall composition while maintaining natural appearance.";

/// Image enhancement backed by the Gemini generateContent endpoint.
#[derive(Clone)]
pub struct GeminiImage {
    http: reqwest::Client,
    name: String,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiImage {
    pub fn new(api_key: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("reqwest client build should not fail");

        Self {
            http,
            name: "gemini".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key: api_key.into(),
            model: "gemini-2.5-flash-image".to_string(),
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

    fn generate_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        format!("{base}/models/{}:generateContent", self.model)
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default, rename = "inlineData", alias = "inline_data")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct InlineData {
    #[serde(default, rename = "mimeType", alias = "mime_type")]
    mime_type: String,
    #[serde(default)]
    data: String,
}

#[async_trait]
impl ProviderAdapter for GeminiImage {
    fn provider(&self) -> &str {
        &self.name
    }

    fn capability(&self) -> Capability {
        Capability::ImageEnhancement
    }

    async fn execute(
        &self,
        request: &GenerationRequest,
    ) -> std::result::Result<ArtifactResult, ProviderError> {
        let RequestPayload::Image {
            data,
            media_type,
            prompt,
            ..
        } = &request.payload
        else {
            return Err(ProviderError::new(
                ProviderErrorKind::InvalidInput,
                "gemini adapter serves image_enhancement payloads only",
            ));
        };

        let image_b64 = base64::engine::general_purpose::STANDARD.encode(data);
        let prompt = prompt.as_deref().unwrap_or(DEFAULT_ENHANCEMENT_PROMPT);

        let body = serde_json::json!({
            "contents": [{
                "parts": [
                    { "text": prompt },
                    { "inline_data": { "mime_type": media_type, "data": image_b64 } }
                ]
            }],
            "generationConfig": { "temperature": 0.4 }
        });

        let response = send_checked(
            self.http
                .post(self.generate_url())
                .header("x-goog-api-key", &self.api_key)
                .json(&body),
        )
        .await?;
        let parsed = response.json::<GenerateContentResponse>().await?;

        let enhanced = parsed
            .candidates
            .into_iter()
            .filter_map(|candidate| candidate.content)
            .flat_map(|content| content.parts)
            .filter_map(|part| part.inline_data)
            .find(|inline| !inline.data.is_empty())
            .ok_or_else(|| {
                ProviderError::new(
                    ProviderErrorKind::Unknown,
                    "response contains no inline image data",
                )
            })?;

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(enhanced.data.as_bytes())
            .map_err(|err| {
                ProviderError::new(
                    ProviderErrorKind::Unknown,
                    format!("invalid base64 image data: {err}"),
                )
            })?;
        let media_type = if enhanced.mime_type.is_empty() {
            media_type.clone()
        } else {
            enhanced.mime_type
        };

        Ok(ArtifactResult {
            artifact: Artifact::Bytes {
                media_type,
                data: bytes.into(),
            },
            billed_units: request.payload_units(),
        })
    }
}
