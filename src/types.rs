use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::ProviderErrorKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ImageEnhancement,
    VideoGeneration,
    TextToSpeech,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::ImageEnhancement => "image_enhancement",
            Self::VideoGeneration => "video_generation",
            Self::TextToSpeech => "text_to_speech",
        };
        f.write_str(name)
    }
}

/// Caller preference and provider tier share one scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    Economy,
    #[default]
    Balanced,
    Premium,
}

#[derive(Debug, Clone)]
pub enum RequestPayload {
    Image {
        data: Bytes,
        media_type: String,
        width: u32,
        height: u32,
        prompt: Option<String>,
    },
    TalkingVideo {
        image: Bytes,
        image_media_type: String,
        script: String,
        duration_seconds: u32,
    },
    Speech {
        text: String,
        voice: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub capability: Capability,
    pub payload: RequestPayload,
    pub quality: QualityTier,
    pub budget_ceiling_usd_micros: Option<u64>,
}

impl GenerationRequest {
    pub fn image(
        data: Bytes,
        media_type: impl Into<String>,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            capability: Capability::ImageEnhancement,
            payload: RequestPayload::Image {
                data,
                media_type: media_type.into(),
                width,
                height,
                prompt: None,
            },
            quality: QualityTier::default(),
            budget_ceiling_usd_micros: None,
        }
    }

    pub fn talking_video(
        image: Bytes,
        image_media_type: impl Into<String>,
        script: impl Into<String>,
        duration_seconds: u32,
    ) -> Self {
        Self {
            capability: Capability::VideoGeneration,
            payload: RequestPayload::TalkingVideo {
                image,
                image_media_type: image_media_type.into(),
                script: script.into(),
                duration_seconds,
            },
            quality: QualityTier::default(),
            budget_ceiling_usd_micros: None,
        }
    }

    pub fn speech(text: impl Into<String>) -> Self {
        Self {
            capability: Capability::TextToSpeech,
            payload: RequestPayload::Speech {
                text: text.into(),
                voice: None,
            },
            quality: QualityTier::default(),
            budget_ceiling_usd_micros: None,
        }
    }

    pub fn with_quality(mut self, quality: QualityTier) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_budget_ceiling_usd_micros(mut self, ceiling: u64) -> Self {
        self.budget_ceiling_usd_micros = Some(ceiling);
        self
    }

    /// Billing metric per capability: seconds of video, characters of
    /// speech, megapixel buckets for images (rounded up, at least one).
    pub fn payload_units(&self) -> u64 {
        match &self.payload {
            RequestPayload::Image { width, height, .. } => {
                let pixels = u64::from(*width).saturating_mul(u64::from(*height));
                pixels.div_ceil(1_000_000).max(1)
            }
            RequestPayload::TalkingVideo {
                duration_seconds, ..
            } => u64::from(*duration_seconds),
            RequestPayload::Speech { text, .. } => text.chars().count() as u64,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Artifact {
    Url { url: String },
    Bytes { media_type: String, data: Bytes },
}

/// One failed provider attempt, already normalized by the adapter.
#[derive(Debug, Clone)]
pub struct AttemptFailure {
    pub provider: String,
    pub kind: ProviderErrorKind,
    pub message: String,
}

/// Terminal failure detail: every ranked candidate was attempted and
/// failed. Carries the full attempt list for observability.
#[derive(Debug, Clone, Default)]
pub struct ExhaustionReport {
    pub attempts: Vec<AttemptFailure>,
}

impl std::fmt::Display for ExhaustionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "all providers failed")?;
        for (idx, attempt) in self.attempts.iter().enumerate() {
            let sep = if idx == 0 { ": " } else { "; " };
            write!(
                f,
                "{sep}{} ({}: {})",
                attempt.provider, attempt.kind, attempt.message
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub success: bool,
    pub provider: Option<String>,
    pub artifact: Option<Artifact>,
    /// Cost of the attempt that served the request, in USD micros,
    /// computed against the serving provider's pricing.
    pub cost_usd_micros: u64,
    pub billed_units: u64,
    pub error: Option<ExhaustionReport>,
}

impl GenerationResult {
    pub(crate) fn served(
        provider: impl Into<String>,
        artifact: Artifact,
        cost_usd_micros: u64,
        billed_units: u64,
    ) -> Self {
        Self {
            success: true,
            provider: Some(provider.into()),
            artifact: Some(artifact),
            cost_usd_micros,
            billed_units,
            error: None,
        }
    }

    pub(crate) fn exhausted(attempts: Vec<AttemptFailure>) -> Self {
        Self {
            success: false,
            provider: None,
            artifact: None,
            cost_usd_micros: 0,
            billed_units: 0,
            error: Some(ExhaustionReport { attempts }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_units_bucket_by_megapixel() {
        let small = GenerationRequest::image(Bytes::from_static(b"img"), "image/png", 640, 480);
        assert_eq!(small.payload_units(), 1);

        let large = GenerationRequest::image(Bytes::from_static(b"img"), "image/png", 1920, 1080);
        assert_eq!(large.payload_units(), 3);
    }

    #[test]
    fn speech_units_count_characters() {
        let request = GenerationRequest::speech("hello world");
        assert_eq!(request.payload_units(), 11);
    }

    #[test]
    fn exhaustion_report_names_every_attempt() {
        let report = ExhaustionReport {
            attempts: vec![
                AttemptFailure {
                    provider: "veo".to_string(),
                    kind: ProviderErrorKind::ServiceUnavailable,
                    message: "api error (503 Service Unavailable): down".to_string(),
                },
                AttemptFailure {
                    provider: "runway".to_string(),
                    kind: ProviderErrorKind::RateLimited,
                    message: "api error (429 Too Many Requests): slow".to_string(),
                },
            ],
        };
        let rendered = report.to_string();
        assert!(rendered.contains("veo"));
        assert!(rendered.contains("runway"));
        assert!(rendered.starts_with("all providers failed"));
    }
}
