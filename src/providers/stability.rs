use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

use crate::adapter::{ArtifactResult, ProviderAdapter};
use crate::error::{ProviderError, ProviderErrorKind};
use crate::types::{Artifact, Capability, GenerationRequest, RequestPayload};
use crate::utils::http::{read_bytes_bounded, send_checked};

const DEFAULT_MAX_IMAGE_RESPONSE_BYTES: usize = 32 * 1024 * 1024;

/// Image enhancement via Stability's conservative upscale endpoint,
/// which returns the finished image as a binary body.
#[derive(Clone)]
pub struct StabilityImage {
    http: reqwest::Client,
    name: String,
    base_url: String,
    api_key: String,
    max_binary_response_bytes: usize,
}

impl StabilityImage {
    pub fn new(api_key: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("reqwest client build should not fail");

        Self {
            http,
            name: "stability".to_string(),
            base_url: "https://api.stability.ai".to_string(),
            api_key: api_key.into(),
            max_binary_response_bytes: DEFAULT_MAX_IMAGE_RESPONSE_BYTES,
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

    pub fn with_max_binary_response_bytes(mut self, max_bytes: usize) -> Self {
        self.max_binary_response_bytes = max_bytes;
        self
    }

    fn upscale_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        format!("{base}/v2beta/stable-image/upscale/conservative")
    }
}

#[async_trait]
impl ProviderAdapter for StabilityImage {
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
                "stability adapter serves image_enhancement payloads only",
            ));
        };

        let image_part = Part::bytes(data.to_vec())
            .file_name("image")
            .mime_str(media_type)
            .map_err(|err| {
                ProviderError::new(
                    ProviderErrorKind::InvalidInput,
                    format!("invalid image media type: {err}"),
                )
            })?;

        let mut form = Form::new().part("image", image_part);
        if let Some(prompt) = prompt.as_deref().filter(|p| !p.trim().is_empty()) {
            form = form.text("prompt", prompt.to_string());
        }
        form = form.text("output_format", "png");

        let response = send_checked(
            self.http
                .post(self.upscale_url())
                .bearer_auth(&self.api_key)
                .header(reqwest::header::ACCEPT, "image/*")
                .multipart(form),
        )
        .await?;

        let media_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("image/png")
            .to_string();
        let bytes = read_bytes_bounded(response, self.max_binary_response_bytes).await?;

        Ok(ArtifactResult {
            artifact: Artifact::Bytes {
                media_type,
                data: bytes,
            },
            billed_units: request.payload_units(),
        })
    }
}
