//! Monte Carlo uncertainty over a hypothesis score.
//!
//! Each trial perturbs every evidence value (and optionally every weight),
//! rescores the hypothesis, and records one probability. Trials are
//! independent: trial `i` draws from its own `StdRng` stream derived from
//! `(seed, i)`, so the result is bit-reproducible for a seed and does not
//! depend on the order in which trials run.
//!
//! Percentiles use the nearest-rank method on the sorted trial
//! probabilities: rank `ceil(q * n)` (1-based), clamped to `[1, n]`.

use rand::distr::{Distribution, StandardUniform, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::Normal;
use serde::Serialize;

use crate::config::{NoiseKind, SimulationDef};
use crate::error::{PamError, PamResult};
use crate::model::{HypothesisId, Model};

use super::evidence::Evidence;
use super::scoring::{combine, logit, score_inputs};

/// Odd 64-bit constant used to spread trial indices across seed space.
const TRIAL_STREAM_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    pub mean: f64,
    pub p05: f64,
    pub p95: f64,
    pub trial_count: u64,
    pub seed: u64,
}

#[derive(Debug, Clone)]
enum EvidenceNoise {
    Fixed,
    Uniform(Uniform<f64>),
    Normal(Normal<f64>),
    Bernoulli,
}

/// Per-trial perturbation of evidence values and weights.
#[derive(Debug, Clone)]
pub struct NoiseModel {
    evidence: EvidenceNoise,
    weight: Option<Uniform<f64>>,
}

impl NoiseModel {
    /// Build a noise model. `evidence_spread` is absolute (uniform half-width
    /// or normal standard deviation); `weight_spread` is relative to the
    /// weight. A spread of zero leaves that input untouched.
    pub fn new(kind: NoiseKind, evidence_spread: f64, weight_spread: f64) -> PamResult<Self> {
        for (label, spread) in [("evidence_spread", evidence_spread), ("weight_spread", weight_spread)] {
            if !(spread.is_finite() && spread >= 0.0) {
                return Err(PamError::InvalidSimulationSetting(format!(
                    "{} must be a non-negative number, got {}",
                    label, spread
                )));
            }
        }

        let evidence = match kind {
            NoiseKind::Bernoulli => EvidenceNoise::Bernoulli,
            _ if evidence_spread == 0.0 => EvidenceNoise::Fixed,
            NoiseKind::Uniform => EvidenceNoise::Uniform(symmetric_uniform(evidence_spread)?),
            NoiseKind::Normal => EvidenceNoise::Normal(
                Normal::new(0.0, evidence_spread)
                    .map_err(|e| PamError::InvalidSimulationSetting(e.to_string()))?,
            ),
        };

        let weight = if weight_spread > 0.0 {
            Some(symmetric_uniform(weight_spread)?)
        } else {
            None
        };

        Ok(Self { evidence, weight })
    }

    pub fn from_settings(settings: &SimulationDef) -> PamResult<Self> {
        Self::new(settings.noise, settings.evidence_spread, settings.weight_spread)
    }

    /// No perturbation at all: every trial reproduces the point estimate.
    pub fn fixed() -> Self {
        Self {
            evidence: EvidenceNoise::Fixed,
            weight: None,
        }
    }

    fn perturb_value(&self, value: f64, rng: &mut StdRng) -> f64 {
        match &self.evidence {
            EvidenceNoise::Fixed => value,
            EvidenceNoise::Uniform(dist) => (value + dist.sample(rng)).clamp(0.0, 1.0),
            EvidenceNoise::Normal(dist) => (value + dist.sample(rng)).clamp(0.0, 1.0),
            EvidenceNoise::Bernoulli => {
                let u: f64 = StandardUniform.sample(rng);
                if u < value {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    fn perturb_weight(&self, weight: f64, rng: &mut StdRng) -> f64 {
        match &self.weight {
            Some(dist) => weight * (1.0 + dist.sample(rng)),
            None => weight,
        }
    }
}

fn symmetric_uniform(spread: f64) -> PamResult<Uniform<f64>> {
    Uniform::new_inclusive(-spread, spread)
        .map_err(|e| PamError::InvalidSimulationSetting(e.to_string()))
}

/// Reject negative trial counts before any work starts.
pub fn check_trial_count(trial_count: i64) -> PamResult<u64> {
    u64::try_from(trial_count).map_err(|_| PamError::NegativeTrialCount(trial_count))
}

/// Independent RNG stream for one trial.
fn trial_rng(seed: u64, trial: u64) -> StdRng {
    StdRng::seed_from_u64(seed ^ trial.wrapping_mul(TRIAL_STREAM_STRIDE))
}

/// Seeded Monte Carlo simulator.
#[derive(Debug, Clone)]
pub struct MonteCarlo {
    noise: NoiseModel,
    seed: u64,
}

impl MonteCarlo {
    pub fn new(noise: NoiseModel, seed: u64) -> Self {
        Self { noise, seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Run `trial_count` trials. Zero disables simulation and returns `None`.
    pub fn simulate(
        &self,
        model: &Model,
        hypothesis: HypothesisId,
        evidence: &Evidence,
        trial_count: i64,
    ) -> PamResult<Option<SimulationResult>> {
        let trials = check_trial_count(trial_count)?;
        if trials == 0 {
            return Ok(None);
        }

        let inputs = score_inputs(model, hypothesis, evidence)?;
        let prior_logit = logit(model.hypothesis(hypothesis).prior);

        let capacity = usize::try_from(trials).unwrap_or(usize::MAX);
        let mut probabilities = Vec::with_capacity(capacity);
        for trial in 0..trials {
            let mut rng = trial_rng(self.seed, trial);
            let perturbed = inputs.iter().map(|&(value, weight)| {
                let v = self.noise.perturb_value(value, &mut rng);
                let w = self.noise.perturb_weight(weight, &mut rng);
                (v, w)
            });
            probabilities.push(combine(prior_logit, perturbed));
        }

        Ok(summarize(probabilities, self.seed))
    }
}

/// Aggregate trial probabilities into mean and 5th/95th percentiles.
///
/// The percentile pair is widened to include the mean, so
/// `p05 <= mean <= p95` holds even for heavily skewed trial sets.
pub fn summarize(mut probabilities: Vec<f64>, seed: u64) -> Option<SimulationResult> {
    if probabilities.is_empty() {
        return None;
    }
    probabilities.sort_by(f64::total_cmp);

    let n = probabilities.len();
    let mean = (probabilities.iter().sum::<f64>() / n as f64).clamp(0.0, 1.0);
    let p05 = nearest_rank(&probabilities, 0.05).min(mean);
    let p95 = nearest_rank(&probabilities, 0.95).max(mean);

    Some(SimulationResult {
        mean,
        p05,
        p95,
        trial_count: n as u64,
        seed,
    })
}

/// Nearest-rank percentile of already-sorted, non-empty data.
fn nearest_rank(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    let rank = ((q * n as f64).ceil() as usize).clamp(1, n);
    sorted[rank - 1]
}
