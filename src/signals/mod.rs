//! Signal pipeline: keyword matching, evidence normalization, log-odds
//! scoring and Monte Carlo simulation.

pub mod evidence;
pub mod keywords;
pub mod sampling;
pub mod scoring;

pub use evidence::{Evidence, EvidenceValue, MatchCounts};
pub use keywords::{count_matches, KeywordSet, Term};
pub use sampling::{MonteCarlo, NoiseModel, SimulationResult};
pub use scoring::{score, Contribution, ScoreResult};
