mod adapter;
pub mod config;
mod error;
pub mod estimator;
pub mod metrics;
pub mod providers;
pub mod registry;
pub mod router;
pub mod types;
mod utils;

pub use adapter::{ArtifactResult, ProviderAdapter};
pub use config::{
    AdapterKind, Env, ProviderSettings, RouterSettings, build_router, default_catalog,
    parse_dotenv,
};
pub use error::{MedleyError, ProviderError, ProviderErrorKind, Result};
pub use estimator::{RankedCandidate, ScoreWeights};
pub use metrics::RouterMetricsSnapshot;
pub use registry::{Clock, ProviderDescriptor, ProviderRegistry, ProviderSnapshot, SystemClock};
pub use router::{DEFAULT_COOLDOWN, ServiceRouter};
pub use types::{
    Artifact, AttemptFailure, Capability, ExhaustionReport, GenerationRequest, GenerationResult,
    QualityTier, RequestPayload,
};

#[cfg(feature = "provider-d-id")]
pub use providers::DidVideo;
#[cfg(feature = "provider-elevenlabs")]
pub use providers::ElevenLabsSpeech;
#[cfg(feature = "provider-gemini")]
pub use providers::GeminiImage;
#[cfg(feature = "provider-openai-speech")]
pub use providers::OpenAiSpeech;
#[cfg(feature = "provider-runway")]
pub use providers::RunwayVideo;
#[cfg(feature = "provider-stability")]
pub use providers::StabilityImage;
#[cfg(feature = "provider-veo")]
pub use providers::VeoVideo;
