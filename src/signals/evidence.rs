//! Signal evaluation: keyword match counts → normalized evidence in [0, 1].
//!
//! Within one source, hits from all of a signal's keyword sets (and the
//! run's focus term) add up. Per-source totals are then combined (sum or
//! max) and pushed through a saturating normalizer:
//!
//!   value = min(cap, 1 - exp(-k * hits))
//!
//! A handful of hits gives partial evidence and repetitive text cannot push
//! the value past `cap`. Structural signals (no keyword sets) take their
//! value from the caller and are only clamped.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::Aggregation;
use crate::error::{PamError, PamResult};
use crate::model::{Model, Signal, SignalId, SourceId};

/// Raw match counts for one signal, bucketed by the source the text came
/// from. Unattributed text (`None`) is a bucket of its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchCounts {
    per_source: BTreeMap<Option<SourceId>, usize>,
}

impl MatchCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, source: Option<SourceId>, count: usize) {
        *self.per_source.entry(source).or_insert(0) += count;
    }

    /// Hits recorded for a source; unseen sources count zero.
    pub fn get(&self, source: Option<SourceId>) -> usize {
        self.per_source.get(&source).copied().unwrap_or(0)
    }

    /// Combine per-source totals.
    pub fn aggregate(&self, aggregation: Aggregation) -> usize {
        let totals = self.per_source.values().copied();
        match aggregation {
            Aggregation::Sum => totals.sum(),
            Aggregation::Max => totals.max().unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvidenceValue {
    pub signal_name: String,
    pub value: f64,
}

/// `min(cap, 1 - exp(-saturation * hits))`, clamped to [0, 1].
pub fn saturate(hits: usize, saturation: f64, cap: f64) -> f64 {
    let raw = 1.0 - (-saturation * hits as f64).exp();
    raw.min(cap).clamp(0.0, 1.0)
}

/// Evaluate a keyword-driven signal from its match counts.
pub fn evaluate(signal: &Signal, matches: &MatchCounts) -> EvidenceValue {
    let hits = matches.aggregate(signal.aggregation);
    EvidenceValue {
        signal_name: signal.name.clone(),
        value: saturate(hits, signal.saturation, signal.cap),
    }
}

/// Accept a caller-supplied value for a structural signal, clamped to [0, 1].
pub fn pass_through(signal: &Signal, value: f64) -> PamResult<EvidenceValue> {
    if !value.is_finite() {
        return Err(PamError::NonFiniteEvidence {
            signal: signal.name.clone(),
            value,
        });
    }
    Ok(EvidenceValue {
        signal_name: signal.name.clone(),
        value: value.clamp(0.0, 1.0),
    })
}

/// Evidence values for one evaluation, indexed by signal handle.
///
/// A missing entry is distinct from a value of zero: zero means "no hits",
/// missing means the signal was never evaluated.
#[derive(Debug, Clone)]
pub struct Evidence {
    values: Vec<Option<f64>>,
}

impl Evidence {
    pub fn new(model: &Model) -> Self {
        Self {
            values: vec![None; model.signals().len()],
        }
    }

    /// Build evidence from `(signal name, value)` pairs, for any signal kind.
    pub fn from_named<'a, I>(model: &Model, pairs: I) -> PamResult<Self>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut evidence = Self::new(model);
        for (name, value) in pairs {
            let id = model.signal_by_name(name)?;
            evidence.set(model, id, value)?;
        }
        Ok(evidence)
    }

    pub fn insert(&mut self, id: SignalId, evidence: EvidenceValue) {
        self.values[id.index()] = Some(evidence.value);
    }

    /// Set a raw value, clamped to [0, 1]. Non-finite values are rejected.
    pub fn set(&mut self, model: &Model, id: SignalId, value: f64) -> PamResult<()> {
        let evidence = pass_through(model.signal(id), value)?;
        self.insert(id, evidence);
        Ok(())
    }

    pub fn get(&self, id: SignalId) -> Option<f64> {
        self.values.get(id.index()).copied().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::parse_config;

    fn model() -> Model {
        let config = parse_config(
            r#"{
                "sources": [
                    { "name": "wire", "url": "https://example.org/wire" },
                    { "name": "relief", "url": "https://example.org/relief" }
                ],
                "keyword_sets": { "a": ["alpha"], "b": ["beta"] },
                "signals": [
                    { "name": "summed", "weight": 1.0, "keyword_sets": ["a", "b"] },
                    { "name": "maxed", "weight": 1.0, "aggregation": "max", "keyword_sets": ["a"] },
                    { "name": "capped", "weight": 1.0, "cap": 0.5, "keyword_sets": ["a"] },
                    { "name": "structural", "weight": 1.0 }
                ],
                "hypotheses": []
            }"#,
        )
        .unwrap();
        Model::resolve(&config).unwrap()
    }

    fn signal<'m>(model: &'m Model, name: &str) -> &'m Signal {
        model.signal(model.signal_by_name(name).unwrap())
    }

    /// Counts with `wire` hits from the first source and `relief` from the second.
    fn counts(model: &Model, wire: usize, relief: usize) -> MatchCounts {
        let mut ids = model.source_ids();
        let mut m = MatchCounts::new();
        m.record(ids.next(), wire);
        m.record(ids.next(), relief);
        m
    }

    #[test]
    fn test_zero_hits_zero_evidence() {
        let model = model();
        let s = signal(&model, "summed");
        assert_eq!(evaluate(s, &MatchCounts::new()).value, 0.0);
    }

    #[test]
    fn test_saturating_response() {
        let one = saturate(1, 0.15, 1.0);
        let five = saturate(5, 0.15, 1.0);
        let hundred = saturate(100, 0.15, 1.0);
        assert!(one > 0.0 && one < five && five < hundred);
        assert!(hundred <= 1.0);
        assert!((saturate(1000, 0.15, 1.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_sum_adds_sources() {
        let model = model();
        let s = signal(&model, "summed");
        let value = evaluate(s, &counts(&model, 3, 4)).value;
        assert!((value - saturate(7, 0.15, 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_max_takes_strongest_source() {
        let model = model();
        let s = signal(&model, "maxed");
        let value = evaluate(s, &counts(&model, 3, 3)).value;
        assert!((value - saturate(3, 0.15, 1.0)).abs() < 1e-12);
        assert!(value < saturate(6, 0.15, 1.0));

        let lopsided = evaluate(s, &counts(&model, 1, 5)).value;
        assert!((lopsided - saturate(5, 0.15, 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_unattributed_text_is_its_own_bucket() {
        let model = model();
        let s = signal(&model, "maxed");
        let mut m = counts(&model, 2, 0);
        m.record(None, 4);
        assert_eq!(m.get(None), 4);
        assert!((evaluate(s, &m).value - saturate(4, 0.15, 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_cap_limits_value() {
        let model = model();
        let s = signal(&model, "capped");
        let value = evaluate(s, &counts(&model, 500, 0)).value;
        assert_eq!(value, 0.5);
    }

    #[test]
    fn test_deterministic() {
        let model = model();
        let s = signal(&model, "summed");
        let m = counts(&model, 2, 2);
        assert_eq!(evaluate(s, &m), evaluate(s, &m));
    }

    #[test]
    fn test_pass_through_clamps() {
        let model = model();
        let s = signal(&model, "structural");
        assert_eq!(pass_through(s, 1.7).unwrap().value, 1.0);
        assert_eq!(pass_through(s, -0.3).unwrap().value, 0.0);
        assert_eq!(pass_through(s, 0.42).unwrap().value, 0.42);
        assert!(matches!(
            pass_through(s, f64::NAN),
            Err(PamError::NonFiniteEvidence { .. })
        ));
    }

    #[test]
    fn test_missing_distinct_from_zero() {
        let model = model();
        let id = model.signal_by_name("summed").unwrap();
        let mut evidence = Evidence::new(&model);
        assert_eq!(evidence.get(id), None);
        evidence.set(&model, id, 0.0).unwrap();
        assert_eq!(evidence.get(id), Some(0.0));
    }

    #[test]
    fn test_from_named_unknown_signal() {
        let model = model();
        let err = Evidence::from_named(&model, [("nope", 0.5)]).unwrap_err();
        assert!(matches!(err, PamError::UnknownSignal(_)));
    }
}
