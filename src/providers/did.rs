use async_trait::async_trait;
use base64::Engine as _;
use serde::Deserialize;

use crate::adapter::{ArtifactResult, ProviderAdapter};
use crate::error::{ProviderError, ProviderErrorKind};
use crate::types::{Artifact, Capability, GenerationRequest, RequestPayload};
use crate::utils::http::send_checked;

/// Talking-head video via the D-ID talks API. D-ID takes the source
/// image as a data URI and authenticates with a Basic credential.
#[derive(Clone)]
pub struct DidVideo {
    http: reqwest::Client,
    name: String,
    base_url: String,
    api_key: String,
}

impl DidVideo {
    pub fn new(api_key: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("reqwest client build should not fail");

        Self {
            http,
            name: "d-id".to_string(),
            base_url: "https://api.d-id.com".to_string(),
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

    fn talks_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        format!("{base}/talks")
    }
}

#[derive(Debug, Deserialize)]
struct DidTalkResponse {
    #[serde(default)]
    result_url: String,
    #[serde(default)]
    duration: Option<u64>,
}

#[async_trait]
impl ProviderAdapter for DidVideo {
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
                "d-id adapter serves video_generation payloads only",
            ));
        };

        let image_b64 = base64::engine::general_purpose::STANDARD.encode(image);
        let body = serde_json::json!({
            "source_url": format!("data:{image_media_type};base64,{image_b64}"),
            "script": { "type": "text", "input": script },
        });

        let response = send_checked(
            self.http
                .post(self.talks_url())
                .header(
                    reqwest::header::AUTHORIZATION,
                    format!("Basic {}", self.api_key),
                )
                .json(&body),
        )
        .await?;
        let parsed = response.json::<DidTalkResponse>().await?;

        if parsed.result_url.trim().is_empty() {
            return Err(ProviderError::new(
                ProviderErrorKind::Unknown,
                "response is missing result_url",
            ));
        }

        Ok(ArtifactResult {
            artifact: Artifact::Url {
                url: parsed.result_url,
            },
            billed_units: parsed
                .duration
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
    async fn talk_posts_source_data_uri_and_parses_result_url() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/talks")
                    .header("authorization", "Basic test-key")
                    .body_includes("\"type\":\"text\"")
                    .body_includes("data:image/png;base64,");
                then.status(201)
                    .header("content-type", "application/json")
                    .body(
                        serde_json::json!({
                            "result_url": "https://d-id-results.example/talk.mp4",
                            "duration": 12
                        })
                        .to_string(),
                    );
            })
            .await;

        let adapter = DidVideo::new("test-key").with_base_url(server.base_url());
        let request =
            GenerationRequest::talking_video(Bytes::from_static(b"img"), "image/png", "hi", 10);
        let result = adapter.execute(&request).await.expect("talk");

        mock.assert_async().await;
        assert_eq!(result.billed_units, 12);
        match result.artifact {
            Artifact::Url { url } => {
                assert_eq!(url, "https://d-id-results.example/talk.mp4");
            }
            other => panic!("unexpected artifact: {other:?}"),
        }
    }

    #[tokio::test]
    async fn invalid_source_normalizes_to_invalid_input() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/talks");
                then.status(400).body("source image rejected");
            })
            .await;

        let adapter = DidVideo::new("test-key").with_base_url(server.base_url());
        let request =
            GenerationRequest::talking_video(Bytes::from_static(b"img"), "image/png", "hi", 10);
        let err = adapter.execute(&request).await.expect_err("invalid input");
        assert_eq!(err.kind, ProviderErrorKind::InvalidInput);
    }
}
