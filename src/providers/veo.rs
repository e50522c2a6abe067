use async_trait::async_trait;
use base64::Engine as _;
use serde::Deserialize;

use crate::adapter::{ArtifactResult, ProviderAdapter};
use crate::error::{ProviderError, ProviderErrorKind};
use crate::types::{Artifact, Capability, GenerationRequest, RequestPayload};
use crate::utils::http::send_checked;

/// Talking-video generation against the Veo API. The call is
/// synchronous: the response carries the finished video URL.
#[derive(Clone)]
pub struct VeoVideo {
    http: reqwest::Client,
    name: String,
    base_url: String,
    api_key: String,
}

impl VeoVideo {
    pub fn new(api_key: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("reqwest client build should not fail");

        Self {
            http,
            name: "veo".to_string(),
            base_url: "https://api.veo3.ai/v1".to_string(),
            api_key: api_key.into(),
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

    fn generate_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        format!("{base}/generate")
    }
}

#[derive(Debug, Deserialize)]
struct VeoGenerateResponse {
    #[serde(default)]
    video_url: String,
    #[serde(default)]
    billed_seconds: Option<u64>,
}

#[async_trait]
impl ProviderAdapter for VeoVideo {
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
                "veo adapter serves video_generation payloads only",
            ));
        };

        let body = serde_json::json!({
            "image": base64::engine::general_purpose::STANDARD.encode(image),
            "image_mime_type": image_media_type,
            "script": script,
            "duration_seconds": duration_seconds,
            "resolution": "1920x1080",
        });

        let response = send_checked(
            self.http
                .post(self.generate_url())
                .bearer_auth(&self.api_key)
                .json(&body),
        )
        .await?;
        let parsed = response.json::<VeoGenerateResponse>().await?;

        if parsed.video_url.trim().is_empty() {
            return Err(ProviderError::new(
                ProviderErrorKind::Unknown,
                "response is missing video_url",
            ));
        }

        Ok(ArtifactResult {
            artifact: Artifact::Url {
                url: parsed.video_url,
            },
            billed_units: parsed
                .billed_seconds
                .unwrap_or_else(|| u64::from(*duration_seconds)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use httpmock::{Method::POST, MockServer};

    #[tokio::test]
    async fn generate_returns_video_url_and_billed_seconds() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/generate")
                    .header("authorization", "Bearer test-key")
                    .body_includes("\"duration_seconds\":10");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(
                        serde_json::json!({
                            "video_url": "https://cdn.veo3.ai/out.mp4",
                            "billed_seconds": 9
                        })
                        .to_string(),
                    );
            })
            .await;

        let adapter = VeoVideo::new("test-key").with_base_url(server.url("/v1"));
        let request =
            GenerationRequest::talking_video(Bytes::from_static(b"img"), "image/png", "hi", 10);
        let result = adapter.execute(&request).await.expect("generate");

        mock.assert_async().await;
        assert_eq!(result.billed_units, 9);
        match result.artifact {
            Artifact::Url { url } => assert_eq!(url, "https://cdn.veo3.ai/out.mp4"),
            other => panic!("unexpected artifact: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_video_url_is_a_normalized_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/generate");
                then.status(200)
                    .header("content-type", "application/json")
                    .body("{}");
            })
            .await;

        let adapter = VeoVideo::new("test-key").with_base_url(server.url("/v1"));
        let request =
            GenerationRequest::talking_video(Bytes::from_static(b"img"), "image/png", "hi", 10);
        let err = adapter.execute(&request).await.expect_err("missing url");
        assert_eq!(err.kind, ProviderErrorKind::Unknown);
    }

    #[tokio::test]
    async fn server_errors_normalize_to_service_unavailable() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/generate");
                then.status(503).body("maintenance");
            })
            .await;

        let adapter = VeoVideo::new("test-key").with_base_url(server.url("/v1"));
        let request =
            GenerationRequest::talking_video(Bytes::from_static(b"img"), "image/png", "hi", 10);
        let err = adapter.execute(&request).await.expect_err("unavailable");
        assert_eq!(err.kind, ProviderErrorKind::ServiceUnavailable);
    }
}
