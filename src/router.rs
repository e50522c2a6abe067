use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::adapter::ProviderAdapter;
use crate::error::{MedleyError, Result};
use crate::estimator;
use crate::metrics::{RouterMetrics, RouterMetricsSnapshot};
use crate::registry::ProviderRegistry;
use crate::types::{AttemptFailure, GenerationRequest, GenerationResult};

pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(60);

/// Request-scoped failover over ranked provider candidates. The only
/// cross-request state is the registry's availability flags; the router
/// itself is freely shared behind `&self`.
pub struct ServiceRouter {
    registry: Arc<ProviderRegistry>,
    adapters: HashMap<String, Arc<dyn ProviderAdapter>>,
    cooldown: Duration,
    metrics: RouterMetrics,
}

impl std::fmt::Debug for ServiceRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRouter")
            .field("adapters", &self.adapters.keys().collect::<Vec<_>>())
            .field("cooldown", &self.cooldown)
            .finish_non_exhaustive()
    }
}

impl ServiceRouter {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self {
            registry,
            adapters: HashMap::new(),
            cooldown: DEFAULT_COOLDOWN,
            metrics: RouterMetrics::default(),
        }
    }

    /// Cooldown applied to a provider after a failed attempt.
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn register_adapter(&mut self, adapter: impl ProviderAdapter + 'static) {
        self.register_adapter_arc(Arc::new(adapter));
    }

    pub fn register_adapter_arc(&mut self, adapter: Arc<dyn ProviderAdapter>) {
        self.adapters
            .insert(adapter.provider().to_string(), adapter);
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    pub fn metrics(&self) -> RouterMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Selects ranked candidates and attempts them strictly in order,
    /// one attempt per provider. A failed provider is cooled down and
    /// the next candidate is tried immediately; exhaustion comes back
    /// as a failed [`GenerationResult`] naming every attempt, while
    /// budget and configuration problems are typed errors.
    pub async fn generate(&self, request: GenerationRequest) -> Result<GenerationResult> {
        self.metrics.record_request();

        let candidates = self.registry.list_providers(request.capability);
        if candidates.is_empty() {
            return Err(MedleyError::NoProviders(request.capability));
        }

        let ranked = estimator::rank_candidates(&candidates, &request);
        if ranked.is_empty() {
            self.metrics.record_budget_rejected();
            let cheapest = candidates
                .iter()
                .map(|descriptor| estimator::estimated_cost_usd_micros(descriptor, &request))
                .min()
                .unwrap_or(0);
            return Err(MedleyError::BudgetExceeded {
                ceiling_usd_micros: request.budget_ceiling_usd_micros.unwrap_or(0),
                cheapest_usd_micros: cheapest,
            });
        }

        debug!(
            capability = %request.capability,
            candidates = ranked.len(),
            "ranked candidates"
        );

        let mut attempts = Vec::<AttemptFailure>::new();
        for candidate in &ranked {
            let name = candidate.descriptor.name.as_str();
            let adapter = self
                .adapters
                .get(name)
                .cloned()
                .ok_or_else(|| MedleyError::AdapterNotFound(name.to_string()))?;

            if !attempts.is_empty() {
                self.metrics.record_failover();
            }
            debug!(
                provider = name,
                estimated_cost_usd_micros = candidate.estimated_cost_usd_micros,
                "attempting provider"
            );

            match adapter.execute(&request).await {
                Ok(result) => {
                    self.metrics.record_served();
                    info!(
                        provider = name,
                        cost_usd_micros = candidate.estimated_cost_usd_micros,
                        billed_units = result.billed_units,
                        "request served"
                    );
                    return Ok(GenerationResult::served(
                        name,
                        result.artifact,
                        candidate.estimated_cost_usd_micros,
                        result.billed_units,
                    ));
                }
                Err(err) => {
                    self.metrics.record_provider_failure();
                    warn!(
                        provider = name,
                        kind = %err.kind,
                        error = %err.message,
                        cooldown_seconds = self.cooldown.as_secs(),
                        "provider failed; cooling down"
                    );
                    self.registry.mark_unavailable(name, self.cooldown);
                    attempts.push(AttemptFailure {
                        provider: name.to_string(),
                        kind: err.kind,
                        message: err.message,
                    });
                }
            }
        }

        self.metrics.record_exhausted();
        warn!(attempted = attempts.len(), "all ranked providers failed");
        Ok(GenerationResult::exhausted(attempts))
    }
}
