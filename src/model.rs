//! The resolved world model.
//!
//! A [`WorldConfig`] names everything by string. [`Model::resolve`] checks
//! every cross reference once and swaps names for typed handles, so that
//! evaluation never performs string lookups or late binding. The model is
//! read-only after construction and is passed by reference into every
//! matching, scoring and simulation call.

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;

use crate::config::loader::validate_config;
use crate::config::{Aggregation, FeedKind, SimulationDef, WorldConfig};
use crate::error::{PamError, PamResult};
use crate::signals::keywords::KeywordSet;

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        pub struct $name(usize);

        impl $name {
            pub fn index(self) -> usize {
                self.0
            }
        }
    };
}

handle!(
    /// Handle to a [`KeywordSet`] in a [`Model`].
    KeywordSetId
);
handle!(
    /// Handle to a [`Signal`] in a [`Model`].
    SignalId
);
handle!(
    /// Handle to a [`Hypothesis`] in a [`Model`].
    HypothesisId
);
handle!(
    /// Handle to a [`Source`] in a [`Model`].
    SourceId
);

#[derive(Debug, Clone)]
pub struct Source {
    pub name: String,
    pub url: String,
    pub kind: FeedKind,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Signal {
    pub name: String,
    pub description: String,
    pub weight: f64,
    pub aggregation: Aggregation,
    pub saturation: f64,
    pub cap: f64,
    pub keyword_sets: Vec<KeywordSetId>,
    pub sources: Vec<SourceId>,
}

impl Signal {
    /// A structural signal has no keyword sets; its evidence is supplied by
    /// the caller rather than derived from the corpus.
    pub fn is_structural(&self) -> bool {
        self.keyword_sets.is_empty()
    }

    /// Whether a document from `source` feeds this signal. Unattributed
    /// documents feed every signal, and a signal without bound sources reads
    /// every document.
    pub fn reads(&self, source: Option<SourceId>) -> bool {
        match source {
            None => true,
            Some(id) => self.sources.is_empty() || self.sources.contains(&id),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Hypothesis {
    pub name: String,
    pub description: String,
    pub prior: f64,
    pub signals: Vec<SignalId>,
}

#[derive(Debug, Clone)]
pub struct Model {
    keyword_sets: Vec<KeywordSet>,
    signals: Vec<Signal>,
    hypotheses: Vec<Hypothesis>,
    sources: Vec<Source>,
    hypothesis_index: HashMap<String, HypothesisId>,
    signal_index: HashMap<String, SignalId>,
    simulation: SimulationDef,
}

impl Model {
    /// Validate `config` and resolve every name reference into a handle.
    pub fn resolve(config: &WorldConfig) -> PamResult<Self> {
        validate_config(config)?;

        let mut keyword_sets = Vec::with_capacity(config.keyword_sets.len());
        let mut keyword_index = HashMap::new();
        for (name, terms) in &config.keyword_sets {
            keyword_index.insert(name.as_str(), KeywordSetId(keyword_sets.len()));
            keyword_sets.push(KeywordSet::new(name, terms)?);
        }

        let sources: Vec<Source> = config
            .sources
            .iter()
            .map(|s| {
                let timeout = Duration::try_from_secs_f64(s.timeout).map_err(|e| {
                    PamError::InvalidSourceParameter {
                        source_name: s.name.clone(),
                        reason: format!("timeout {}: {}", s.timeout, e),
                    }
                })?;
                Ok(Source {
                    name: s.name.clone(),
                    url: s.url.clone(),
                    kind: s.kind,
                    timeout,
                })
            })
            .collect::<PamResult<_>>()?;
        let source_index: HashMap<&str, SourceId> = sources
            .iter()
            .enumerate()
            .map(|(i, s)| (s.name.as_str(), SourceId(i)))
            .collect();

        for name in config.signal_bindings.keys() {
            if !config.signals.iter().any(|s| &s.name == name) {
                return Err(PamError::DanglingBinding(name.clone()));
            }
        }

        let mut signals = Vec::with_capacity(config.signals.len());
        let mut signal_index = HashMap::new();
        for def in &config.signals {
            let binding = config.signal_bindings.get(&def.name);
            let set_names = def
                .keyword_sets
                .iter()
                .chain(binding.into_iter().flat_map(|b| b.keywords.iter()));
            let source_names = def
                .sources
                .iter()
                .chain(binding.into_iter().flat_map(|b| b.sources.iter()));

            let mut bound_sets = Vec::new();
            for set_name in set_names {
                let id = keyword_index.get(set_name.as_str()).copied().ok_or_else(|| {
                    PamError::DanglingKeywordSet {
                        signal: def.name.clone(),
                        keyword_set: set_name.clone(),
                    }
                })?;
                if !bound_sets.contains(&id) {
                    bound_sets.push(id);
                }
            }

            let mut bound_sources = Vec::new();
            for source_name in source_names {
                let id = source_index.get(source_name.as_str()).copied().ok_or_else(|| {
                    PamError::DanglingSource {
                        signal: def.name.clone(),
                        source_name: source_name.clone(),
                    }
                })?;
                if !bound_sources.contains(&id) {
                    bound_sources.push(id);
                }
            }

            signal_index.insert(def.name.clone(), SignalId(signals.len()));
            signals.push(Signal {
                name: def.name.clone(),
                description: def.description.clone(),
                weight: def.weight,
                aggregation: def.aggregation,
                saturation: def.saturation,
                cap: def.cap,
                keyword_sets: bound_sets,
                sources: bound_sources,
            });
        }

        let mut hypotheses = Vec::with_capacity(config.hypotheses.len());
        let mut hypothesis_index = HashMap::new();
        for def in &config.hypotheses {
            let mut refs = Vec::with_capacity(def.signals.len());
            for signal_name in &def.signals {
                let id = signal_index.get(signal_name).copied().ok_or_else(|| {
                    PamError::DanglingSignal {
                        hypothesis: def.name.clone(),
                        signal: signal_name.clone(),
                    }
                })?;
                if refs.contains(&id) {
                    return Err(PamError::DuplicateSignalRef {
                        hypothesis: def.name.clone(),
                        signal: signal_name.clone(),
                    });
                }
                refs.push(id);
            }
            hypothesis_index.insert(def.name.clone(), HypothesisId(hypotheses.len()));
            hypotheses.push(Hypothesis {
                name: def.name.clone(),
                description: def.description.clone(),
                prior: def.prior,
                signals: refs,
            });
        }

        log::debug!(
            "Resolved world model: {} hypotheses, {} signals, {} keyword sets, {} sources",
            hypotheses.len(),
            signals.len(),
            keyword_sets.len(),
            sources.len()
        );

        Ok(Self {
            keyword_sets,
            signals,
            hypotheses,
            sources,
            hypothesis_index,
            signal_index,
            simulation: config.simulation.clone(),
        })
    }

    pub fn keyword_set(&self, id: KeywordSetId) -> &KeywordSet {
        &self.keyword_sets[id.0]
    }

    pub fn signal(&self, id: SignalId) -> &Signal {
        &self.signals[id.0]
    }

    pub fn hypothesis(&self, id: HypothesisId) -> &Hypothesis {
        &self.hypotheses[id.0]
    }

    pub fn source(&self, id: SourceId) -> &Source {
        &self.sources[id.0]
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    pub fn hypotheses(&self) -> &[Hypothesis] {
        &self.hypotheses
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// Hypothesis handles in configuration order.
    pub fn hypothesis_ids(&self) -> impl Iterator<Item = HypothesisId> {
        (0..self.hypotheses.len()).map(HypothesisId)
    }

    pub fn signal_ids(&self) -> impl Iterator<Item = SignalId> {
        (0..self.signals.len()).map(SignalId)
    }

    pub fn source_ids(&self) -> impl Iterator<Item = SourceId> {
        (0..self.sources.len()).map(SourceId)
    }

    pub fn hypothesis_by_name(&self, name: &str) -> PamResult<HypothesisId> {
        self.hypothesis_index
            .get(name)
            .copied()
            .ok_or_else(|| PamError::UnknownHypothesis(name.to_string()))
    }

    pub fn signal_by_name(&self, name: &str) -> PamResult<SignalId> {
        self.signal_index
            .get(name)
            .copied()
            .ok_or_else(|| PamError::UnknownSignal(name.to_string()))
    }

    pub fn simulation(&self) -> &SimulationDef {
        &self.simulation
    }

    /// Sources read by any signal of the given hypotheses, deduplicated, in
    /// configuration order.
    pub fn sources_for(&self, hypotheses: &[HypothesisId]) -> Vec<SourceId> {
        let mut needed = vec![false; self.sources.len()];
        for &h in hypotheses {
            for &s in &self.hypothesis(h).signals {
                let signal = self.signal(s);
                if signal.is_structural() {
                    continue;
                }
                if signal.sources.is_empty() {
                    needed.iter_mut().for_each(|n| *n = true);
                } else {
                    for src in &signal.sources {
                        needed[src.0] = true;
                    }
                }
            }
        }
        needed
            .into_iter()
            .enumerate()
            .filter_map(|(i, n)| n.then_some(SourceId(i)))
            .collect()
    }
}
