use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The world configuration document: sources to read, keyword sets to scan
/// for, signals built from them, and the hypotheses those signals feed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorldConfig {
    #[serde(default)]
    pub sources: Vec<SourceDef>,
    #[serde(default)]
    pub signals: Vec<SignalDef>,
    #[serde(default)]
    pub hypotheses: Vec<HypothesisDef>,
    /// Keyword set name → term list. Ordered so that resolved handles are
    /// stable across runs.
    #[serde(default)]
    pub keyword_sets: BTreeMap<String, Vec<String>>,
    /// Older layout that kept bindings apart from the signal definitions.
    /// Merged into the matching signal at resolve time.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub signal_bindings: BTreeMap<String, SignalBinding>,
    #[serde(default)]
    pub simulation: SimulationDef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDef {
    pub name: String,
    pub url: String,
    #[serde(rename = "type", default)]
    pub kind: FeedKind,
    /// Seconds.
    #[serde(default = "default_timeout")]
    pub timeout: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    #[default]
    Rss,
    Atom,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalDef {
    pub name: String,
    pub weight: f64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub aggregation: Aggregation,
    /// Rate `k` of the `1 - exp(-k * hits)` normalizer.
    #[serde(default = "default_saturation")]
    pub saturation: f64,
    /// Upper bound on the evidence value.
    #[serde(default = "default_cap")]
    pub cap: f64,
    #[serde(default)]
    pub keyword_sets: Vec<String>,
    #[serde(default)]
    pub sources: Vec<String>,
}

/// How match counts across a signal's keyword sets are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    #[default]
    Sum,
    Max,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignalBinding {
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HypothesisDef {
    pub name: String,
    pub prior: f64,
    pub signals: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationDef {
    #[serde(default)]
    pub noise: NoiseKind,
    #[serde(default = "default_evidence_spread")]
    pub evidence_spread: f64,
    /// Relative: a weight `w` is perturbed within `w * (1 ± spread)`.
    #[serde(default)]
    pub weight_spread: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for SimulationDef {
    fn default() -> Self {
        Self {
            noise: NoiseKind::default(),
            evidence_spread: default_evidence_spread(),
            weight_spread: 0.0,
            seed: None,
        }
    }
}

/// Shape of the per-trial evidence perturbation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseKind {
    /// value ± U[-spread, spread]
    #[default]
    Uniform,
    /// value + N(0, spread)
    Normal,
    /// 1 with probability `value`, otherwise 0
    Bernoulli,
}

fn default_timeout() -> f64 {
    10.0
}

fn default_saturation() -> f64 {
    0.15
}

fn default_cap() -> f64 {
    1.0
}

fn default_evidence_spread() -> f64 {
    0.1
}
