//! Hypothesis scoring by weighted log-odds combination.
//!
//! Starts from the prior's log-odds and adds one `value * weight` term per
//! signal, in the hypothesis's signal order:
//!
//!   z = ln(prior / (1 - prior)) + Σ value_i * weight_i
//!   p = 1 / (1 + exp(-z))

use serde::Serialize;

use crate::error::{PamError, PamResult};
use crate::model::{HypothesisId, Model};

use super::evidence::Evidence;

/// The signed effect of one signal on the hypothesis's log-odds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contribution {
    pub signal_name: String,
    pub value: f64,
    pub weight: f64,
    pub delta: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    pub hypothesis: String,
    pub prior: f64,
    pub probability: f64,
    /// Same order as the hypothesis's signal list.
    pub contributions: Vec<Contribution>,
}

/// Log-odds of `p`. Callers guarantee `p` lies in (0, 1).
pub fn logit(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}

pub fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// One `(evidence value, weight)` pair per signal, in hypothesis order.
///
/// Fails with an evidence error if any referenced signal has no value.
pub(crate) fn score_inputs(
    model: &Model,
    hypothesis: HypothesisId,
    evidence: &Evidence,
) -> PamResult<Vec<(f64, f64)>> {
    let hyp = model.hypothesis(hypothesis);
    hyp.signals
        .iter()
        .map(|&id| {
            let signal = model.signal(id);
            let value = evidence.get(id).ok_or_else(|| PamError::MissingEvidence {
                hypothesis: hyp.name.clone(),
                signal: signal.name.clone(),
            })?;
            Ok((value, signal.weight))
        })
        .collect()
}

/// Combine a prior log-odds with `(value, weight)` pairs into a probability.
pub(crate) fn combine(prior_logit: f64, inputs: impl IntoIterator<Item = (f64, f64)>) -> f64 {
    let z = inputs
        .into_iter()
        .fold(prior_logit, |z, (value, weight)| z + value * weight);
    let p = sigmoid(z);
    if p.is_nan() {
        return 0.0;
    }
    p.clamp(0.0, 1.0)
}

/// Score a hypothesis against the supplied evidence.
pub fn score(model: &Model, hypothesis: HypothesisId, evidence: &Evidence) -> PamResult<ScoreResult> {
    let hyp = model.hypothesis(hypothesis);
    let inputs = score_inputs(model, hypothesis, evidence)?;

    let contributions = hyp
        .signals
        .iter()
        .zip(&inputs)
        .map(|(&id, &(value, weight))| Contribution {
            signal_name: model.signal(id).name.clone(),
            value,
            weight,
            delta: value * weight,
        })
        .collect();

    let probability = combine(logit(hyp.prior), inputs);

    Ok(ScoreResult {
        hypothesis: hyp.name.clone(),
        prior: hyp.prior,
        probability,
        contributions,
    })
}
