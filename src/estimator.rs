//! Pure, side-effect-free ranking of candidate providers.
//!
//! Lower score wins. Cost and latency are normalized against the most
//! expensive / slowest candidate in the batch so the weights stay
//! comparable across capabilities with very different price scales.

use std::cmp::Ordering;

use crate::registry::ProviderDescriptor;
use crate::types::{GenerationRequest, QualityTier};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub cost: f64,
    pub quality: f64,
    pub speed: f64,
}

impl ScoreWeights {
    pub fn for_preference(preference: QualityTier) -> Self {
        match preference {
            QualityTier::Economy => Self {
                cost: 0.6,
                quality: 0.1,
                speed: 0.3,
            },
            QualityTier::Balanced => Self {
                cost: 1.0 / 3.0,
                quality: 1.0 / 3.0,
                speed: 1.0 / 3.0,
            },
            QualityTier::Premium => Self {
                cost: 0.1,
                quality: 0.6,
                speed: 0.3,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct RankedCandidate {
    pub descriptor: ProviderDescriptor,
    pub estimated_cost_usd_micros: u64,
    pub score: f64,
}

pub fn estimated_cost_usd_micros(
    descriptor: &ProviderDescriptor,
    request: &GenerationRequest,
) -> u64 {
    descriptor
        .unit_cost_usd_micros
        .saturating_mul(request.payload_units())
}

// Penalty, not a bonus: a premium-tier provider contributes nothing to
// the score, an economy-tier one contributes the full quality weight.
fn tier_penalty(tier: QualityTier) -> f64 {
    match tier {
        QualityTier::Economy => 1.0,
        QualityTier::Balanced => 0.5,
        QualityTier::Premium => 0.0,
    }
}

/// Scores the candidates, drops the ones whose estimated cost exceeds
/// the request's budget ceiling, and sorts ascending by score with ties
/// broken by declared latency, then registration order. An empty return
/// means no candidate fits the budget; the router maps that to a typed
/// budget error rather than this function raising.
pub fn rank_candidates(
    candidates: &[ProviderDescriptor],
    request: &GenerationRequest,
) -> Vec<RankedCandidate> {
    let costs: Vec<u64> = candidates
        .iter()
        .map(|descriptor| estimated_cost_usd_micros(descriptor, request))
        .collect();
    let max_cost = costs.iter().copied().max().unwrap_or(0) as f64;
    let max_latency = candidates
        .iter()
        .map(|descriptor| descriptor.avg_latency_ms)
        .max()
        .unwrap_or(0) as f64;
    let weights = ScoreWeights::for_preference(request.quality);

    let mut ranked: Vec<(usize, RankedCandidate)> = candidates
        .iter()
        .enumerate()
        .map(|(index, descriptor)| {
            let cost = costs[index];
            let norm_cost = if max_cost > 0.0 {
                cost as f64 / max_cost
            } else {
                0.0
            };
            let norm_latency = if max_latency > 0.0 {
                descriptor.avg_latency_ms as f64 / max_latency
            } else {
                0.0
            };
            let score = weights.cost * norm_cost
                + weights.quality * tier_penalty(descriptor.quality)
                + weights.speed * norm_latency;
            (
                index,
                RankedCandidate {
                    descriptor: descriptor.clone(),
                    estimated_cost_usd_micros: cost,
                    score,
                },
            )
        })
        .filter(|(_, candidate)| {
            request
                .budget_ceiling_usd_micros
                .is_none_or(|ceiling| candidate.estimated_cost_usd_micros <= ceiling)
        })
        .collect();

    ranked.sort_by(|(index_a, a), (index_b, b)| {
        a.score
            .partial_cmp(&b.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.descriptor.avg_latency_ms.cmp(&b.descriptor.avg_latency_ms))
            .then_with(|| index_a.cmp(index_b))
    });

    ranked.into_iter().map(|(_, candidate)| candidate).collect()
}
