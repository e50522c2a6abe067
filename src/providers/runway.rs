use async_trait::async_trait;
use base64::Engine as _;
use serde::Deserialize;

use crate::adapter::{ArtifactResult, ProviderAdapter};
use crate::error::{ProviderError, ProviderErrorKind};
use crate::types::{Artifact, Capability, GenerationRequest, RequestPayload};
use crate::utils::http::send_checked;

/// Talking-video generation against the Runway image-to-video API.
#[derive(Clone)]
pub struct RunwayVideo {
    http: reqwest::Client,
    name: String,
    base_url: String,
    api_key: String,
    model: String,
}

impl RunwayVideo {
    pub fn new(api_key: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("reqwest client build should not fail");

        Self {
            http,
            name: "runway".to_string(),
            base_url: "https://api.runwayml.com/v1".to_string(),
            api_key: api_key.into(),
            model: "gen3a_turbo".to_string(),
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

    fn image_to_video_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        format!("{base}/image_to_video")
    }
}

#[derive(Debug, Deserialize)]
struct RunwayGenerateResponse {
    #[serde(default)]
    output: Vec<String>,
    #[serde(default)]
    billed_seconds: Option<u64>,
}

#[async_trait]
impl ProviderAdapter for RunwayVideo {
    fn provider(&self) -> &str {
        &self.name
    }

    fn capability(&self) -> Capability {
        Capability::VideoGeneration
    }

    async fn execute(
        &self,
        request: &GenerationRequest,
    ) -> std::result::Result<ArtifactResult, ProviderError> {
        let RequestPayload::TalkingVideo {
            image,
            image_media_type,
            script,
            duration_seconds,
        } = &request.payload
        else {
            return Err(ProviderError::new(
                ProviderErrorKind::InvalidInput,
                "runway adapter serves video_generation payloads only",
            ));
        };

        let image_b64 = base64::engine::general_purpose::STANDARD.encode(image);
        let body = serde_json::json!({
            "model": self.model,
            "promptImage": format!("data:{image_media_type};base64,{image_b64}"),
            "promptText": script,
            "duration": duration_seconds,
        });

        let response = send_checked(
            self.http
                .post(self.image_to_video_url())
                .bearer_auth(&self.api_key)
                .json(&body),
        )
        .await?;
        let parsed = response.json::<RunwayGenerateResponse>().await?;

        let url = parsed
            .output
            .into_iter()
            .find(|url| !url.trim().is_empty())
            .ok_or_else(|| {
                ProviderError::new(ProviderErrorKind::Unknown, "response has no output url")
            })?;

        Ok(ArtifactResult {
            artifact: Artifact::Url { url },
            billed_units: parsed
                .billed_seconds
                .unwrap_or_else(|| u64::from(*duration_seconds)),
        })
    }
}
