//! Human-readable reports for scored hypotheses.
//!
//! Everything here is a pure function of a [`ScoreResult`] and an optional
//! [`SimulationResult`]; nothing is rescored.

use std::fmt::Write;

use serde::Serialize;

use crate::signals::{ScoreResult, SimulationResult};

/// Qualitative risk band. Bands are contiguous and cover [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBand {
    /// [0%, 5%)
    Minimal,
    /// [5%, 15%)
    LowButNotable,
    /// [15%, 35%)
    Moderate,
    /// [35%, 60%)
    Significant,
    /// [60%, 85%)
    High,
    /// [85%, 100%]
    Severe,
}

impl RiskBand {
    pub fn from_probability(p: f64) -> Self {
        match p {
            p if p < 0.05 => RiskBand::Minimal,
            p if p < 0.15 => RiskBand::LowButNotable,
            p if p < 0.35 => RiskBand::Moderate,
            p if p < 0.60 => RiskBand::Significant,
            p if p < 0.85 => RiskBand::High,
            _ => RiskBand::Severe,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskBand::Minimal => "minimal",
            RiskBand::LowButNotable => "low but notable",
            RiskBand::Moderate => "moderate, warrants attention",
            RiskBand::Significant => "significant and rising",
            RiskBand::High => "high",
            RiskBand::Severe => "severe",
        }
    }
}

impl std::fmt::Display for RiskBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

fn pct(p: f64) -> f64 {
    p * 100.0
}

/// Render a full report: headline, optional simulation line, and with
/// `explain` the per-signal contribution breakdown.
pub fn render(result: &ScoreResult, simulation: Option<&SimulationResult>, explain: bool) -> String {
    let band = RiskBand::from_probability(result.probability);
    let mut out = format!(
        "P.A.M. assesses the scenario '{}' at {:.1}%: {}.\n",
        result.hypothesis,
        pct(result.probability),
        band
    );

    if let Some(sim) = simulation {
        let _ = writeln!(
            out,
            "Monte Carlo mean: {:.1}% (5–95% range {:.1}%–{:.1}%, {} trials)",
            pct(sim.mean),
            pct(sim.p05),
            pct(sim.p95),
            sim.trial_count
        );
    }

    if explain {
        let _ = writeln!(out, "\nSignal contributions (prior {:.1}%):", pct(result.prior));
        if result.contributions.is_empty() {
            out.push_str("  (no signals)\n");
        }
        for c in &result.contributions {
            let _ = writeln!(
                out,
                "  {:<24} value={:.3} weight={:+.2} → delta={:+.3}",
                c.signal_name, c.value, c.weight, c.delta
            );
        }
    }

    out
}

/// One line per scenario for run-all output:
/// `name → point% (avg avg%, range lo–hi%)`.
pub fn summary_line(result: &ScoreResult, simulation: Option<&SimulationResult>) -> String {
    let mut line = format!("{:<28} → {:5.1}%", result.hypothesis, pct(result.probability));
    if let Some(sim) = simulation {
        let _ = write!(
            line,
            " (avg {:4.1}%, range {:4.1}–{:4.1}%)",
            pct(sim.mean),
            pct(sim.p05),
            pct(sim.p95)
        );
    }
    line
}
