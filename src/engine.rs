//! Assessment pipeline: corpus → matches → evidence → score → simulation.
//!
//! Evidence does not depend on the hypothesis, so [`Assessor::assess_all`]
//! evaluates the corpus once and scores every hypothesis against it.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::corpus::Corpus;
use crate::error::{PamError, PamResult};
use crate::model::{HypothesisId, Model, Signal};
use crate::report::RiskBand;
use crate::signals::evidence::{evaluate, Evidence, MatchCounts};
use crate::signals::keywords::{count_matches, Term};
use crate::signals::sampling::{check_trial_count, MonteCarlo, NoiseModel, SimulationResult};
use crate::signals::scoring::{score, ScoreResult};

/// Per-run inputs that are not part of the world configuration.
#[derive(Debug, Clone, Default)]
pub struct AssessOptions {
    /// Ad-hoc focus term (e.g. a country name) added for this run only.
    pub focus: Option<String>,
    /// Monte Carlo trials; 0 disables simulation.
    pub trials: i64,
    pub seed: u64,
    /// Caller-supplied values for structural signals, by signal name.
    pub external: Vec<(String, f64)>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Assessment {
    pub hypothesis: String,
    pub description: String,
    pub band: RiskBand,
    pub score: ScoreResult,
    pub simulation: Option<SimulationResult>,
    pub focus: Option<String>,
    pub documents: usize,
    pub assessed_at: DateTime<Utc>,
}

pub struct Assessor<'m> {
    model: &'m Model,
    noise: NoiseModel,
}

impl<'m> Assessor<'m> {
    pub fn new(model: &'m Model) -> PamResult<Self> {
        let noise = NoiseModel::from_settings(model.simulation())?;
        Ok(Self { model, noise })
    }

    /// Use an explicit noise model instead of the configured one.
    pub fn with_noise(model: &'m Model, noise: NoiseModel) -> Self {
        Self { model, noise }
    }

    pub fn model(&self) -> &'m Model {
        self.model
    }

    /// Evaluate every signal against `corpus`.
    ///
    /// Keyword-driven signals are always evaluated (zero hits is a value of
    /// zero). Structural signals get a value only if the caller supplied one.
    pub fn collect_evidence(&self, corpus: &Corpus, options: &AssessOptions) -> PamResult<Evidence> {
        let model = self.model;
        let mut evidence = Evidence::new(model);

        for (name, value) in &options.external {
            let id = model.signal_by_name(name)?;
            if !model.signal(id).is_structural() {
                return Err(PamError::EvidenceNotAccepted(name.clone()));
            }
            evidence.set(model, id, *value)?;
        }

        let focus = match options.focus.as_deref() {
            Some(raw) => Term::new(raw).map_err(|e| PamError::InvalidTerm {
                keyword_set: "focus".to_string(),
                term: raw.to_string(),
                reason: e.to_string(),
            })?,
            None => None,
        };

        for id in model.signal_ids() {
            let signal = model.signal(id);
            if signal.is_structural() {
                continue;
            }
            let counts = self.match_signal(signal, corpus, focus.as_ref());
            evidence.insert(id, evaluate(signal, &counts));
        }

        Ok(evidence)
    }

    fn match_signal(&self, signal: &Signal, corpus: &Corpus, focus: Option<&Term>) -> MatchCounts {
        let mut counts = MatchCounts::new();
        let focus = focus.filter(|term| {
            !signal
                .keyword_sets
                .iter()
                .any(|&set| self.model.keyword_set(set).contains(term.text()))
        });

        for doc in corpus.documents_for(signal) {
            for &set in &signal.keyword_sets {
                let hits = count_matches(&doc.text, self.model.keyword_set(set));
                counts.record(doc.source, hits);
            }
            if let Some(term) = focus {
                counts.record(doc.source, term.count_in(&doc.text));
            }
        }
        counts
    }

    fn assess_with(
        &self,
        hypothesis: HypothesisId,
        evidence: &Evidence,
        corpus: &Corpus,
        options: &AssessOptions,
    ) -> PamResult<Assessment> {
        let hyp = self.model.hypothesis(hypothesis);
        let score = score(self.model, hypothesis, evidence)?;
        let simulation = MonteCarlo::new(self.noise.clone(), options.seed).simulate(
            self.model,
            hypothesis,
            evidence,
            options.trials,
        )?;

        Ok(Assessment {
            hypothesis: hyp.name.clone(),
            description: hyp.description.clone(),
            band: RiskBand::from_probability(score.probability),
            score,
            simulation,
            focus: options.focus.clone(),
            documents: corpus.len(),
            assessed_at: Utc::now(),
        })
    }

    /// Assess one hypothesis by name.
    pub fn assess(&self, hypothesis: &str, corpus: &Corpus, options: &AssessOptions) -> PamResult<Assessment> {
        let id = self.model.hypothesis_by_name(hypothesis)?;
        check_trial_count(options.trials)?;
        let evidence = self.collect_evidence(corpus, options)?;
        self.assess_with(id, &evidence, corpus, options)
    }

    /// Assess every hypothesis in configuration order.
    ///
    /// The outer error covers run-wide input problems (bad trial count or
    /// external evidence). Each hypothesis then succeeds or fails on its own.
    pub fn assess_all(
        &self,
        corpus: &Corpus,
        options: &AssessOptions,
    ) -> PamResult<Vec<(HypothesisId, PamResult<Assessment>)>> {
        check_trial_count(options.trials)?;
        let evidence = self.collect_evidence(corpus, options)?;
        Ok(self
            .model
            .hypothesis_ids()
            .map(|id| (id, self.assess_with(id, &evidence, corpus, options)))
            .collect())
    }
}
