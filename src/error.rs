//! Error types for hypothesis evaluation
//!
//! Errors are classified by what went wrong:
//! - Configuration: the loaded world model is unusable (bad file, dangling
//!   references, invalid priors or parameters)
//! - Evidence: a referenced signal has no usable evidence at scoring time
//! - Simulation: Monte Carlo parameters were rejected before any trial ran
//!
//! A matching condition (empty corpus, zero hits, empty keyword set) is never
//! an error; it produces an evidence value of zero.

use std::path::PathBuf;
use thiserror::Error;

/// Error types for loading, scoring and simulating hypotheses
#[derive(Debug, Error)]
pub enum PamError {
    // Configuration errors
    #[error("Failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("Unknown hypothesis: {0}")]
    UnknownHypothesis(String),

    #[error("Unknown signal: {0}")]
    UnknownSignal(String),

    #[error("Duplicate {kind} name: {name}")]
    DuplicateName { kind: &'static str, name: String },

    #[error("Hypothesis '{hypothesis}' references unknown signal '{signal}'")]
    DanglingSignal { hypothesis: String, signal: String },

    #[error("Signal '{signal}' references unknown keyword set '{keyword_set}'")]
    DanglingKeywordSet { signal: String, keyword_set: String },

    #[error("Signal '{signal}' references unknown source '{source_name}'")]
    DanglingSource { signal: String, source_name: String },

    #[error("Keyword set '{keyword_set}' has unusable term '{term}': {reason}")]
    InvalidTerm {
        keyword_set: String,
        term: String,
        reason: String,
    },

    #[error("Bindings given for unknown signal '{0}'")]
    DanglingBinding(String),

    #[error("Hypothesis '{hypothesis}' lists signal '{signal}' more than once")]
    DuplicateSignalRef { hypothesis: String, signal: String },

    #[error("Hypothesis '{hypothesis}' has prior {prior}; priors must lie strictly between 0 and 1")]
    InvalidPrior { hypothesis: String, prior: f64 },

    #[error("Signal '{signal}' has malformed weight {weight}")]
    InvalidWeight { signal: String, weight: f64 },

    #[error("Invalid parameter for signal '{signal}': {reason}")]
    InvalidSignalParameter { signal: String, reason: String },

    #[error("Invalid parameter for source '{source_name}': {reason}")]
    InvalidSourceParameter { source_name: String, reason: String },

    #[error("Invalid simulation setting: {0}")]
    InvalidSimulationSetting(String),

    #[error("Signal '{0}' is keyword-driven; its evidence comes from the corpus")]
    EvidenceNotAccepted(String),

    // Evidence errors
    #[error("No evidence supplied for signal '{signal}' (hypothesis '{hypothesis}')")]
    MissingEvidence { hypothesis: String, signal: String },

    #[error("Evidence for signal '{signal}' is not a finite number: {value}")]
    NonFiniteEvidence { signal: String, value: f64 },

    // Simulation errors
    #[error("Trial count must be non-negative, got {0}")]
    NegativeTrialCount(i64),
}

/// Coarse classification of a [`PamError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Configuration,
    Evidence,
    Simulation,
}

impl PamError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PamError::MissingEvidence { .. } | PamError::NonFiniteEvidence { .. } => {
                ErrorKind::Evidence
            }
            PamError::NegativeTrialCount(_) => ErrorKind::Simulation,
            _ => ErrorKind::Configuration,
        }
    }

    /// Returns true if this error points at a setup defect in the world config
    pub fn is_configuration(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }

    /// Returns true if scoring failed because evidence was missing or unusable
    pub fn is_evidence(&self) -> bool {
        self.kind() == ErrorKind::Evidence
    }

    /// Get a user-friendly recovery suggestion
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            PamError::ConfigRead { .. } => "Check the --config path and file permissions.",
            PamError::ConfigParse(_) => "Check the config file is valid JSON.",
            PamError::UnknownHypothesis(_) => "Run with --list to see available scenarios.",
            PamError::UnknownSignal(_) | PamError::EvidenceNotAccepted(_) => {
                "Only structural signals (no keyword sets) accept --evidence values."
            }
            PamError::MissingEvidence { .. } => {
                "Supply the structural signal's value with --evidence name=value."
            }
            PamError::NonFiniteEvidence { .. } => "Evidence values must be numbers in [0, 1].",
            PamError::NegativeTrialCount(_) => "Use --simulate 0 to disable simulation.",
            _ => "Fix the referenced entry in the world config.",
        }
    }
}

pub type PamResult<T> = Result<T, PamError>;
