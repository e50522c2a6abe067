use async_trait::async_trait;

use crate::error::ProviderError;
use crate::types::{Artifact, Capability, GenerationRequest};

#[derive(Debug, Clone)]
pub struct ArtifactResult {
    pub artifact: Artifact,
    /// Units the provider actually billed (seconds, characters,
    /// megapixel buckets). Falls back to the request metric when the
    /// provider does not report one.
    pub billed_units: u64,
}

/// One implementation per external service. Adapters normalize wire
/// failures into [`ProviderError`] and never retry internally; failover
/// belongs to the router. Dropping the returned future aborts the
/// in-flight HTTP call, and the adapter's client timeout bounds every
/// attempt, so callers cancel with their runtime's own primitives.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn provider(&self) -> &str;
    fn capability(&self) -> Capability;

    async fn execute(
        &self,
        request: &GenerationRequest,
    ) -> std::result::Result<ArtifactResult, ProviderError>;
}
