//! worldpam - score global risk scenarios from live news feeds
//!
//! Usage:
//!   worldpam --list
//!   worldpam --scenario civil_war_risk --country Sudan --simulate 5000 --explain
//!   worldpam --run-all --simulate 2000 --seed 7
//!   worldpam --scenario coup_risk --offline --corpus headlines.txt --json

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};

use worldpam_lib::config::load_world;
use worldpam_lib::corpus::Corpus;
use worldpam_lib::feeds::{ingest, HttpFetcher};
use worldpam_lib::model::HypothesisId;
use worldpam_lib::report::{render, summary_line};
use worldpam_lib::{AssessOptions, Assessor, Model};

const EXAMPLES: &str = "\
Examples:
  worldpam --list
  worldpam --scenario global_war_risk --simulate 5000 --explain
  worldpam --scenario civil_war_risk --country Ukraine
  worldpam --run-all --simulate 2000
  worldpam --scenario coup_risk --offline --corpus notes.txt

Configuration is read from --config, ./world_config.json,
~/.worldpam/world_config.json, or the built-in world model.
Set RUST_LOG=info to see feed ingestion progress.";

#[derive(Parser)]
#[command(name = "worldpam")]
#[command(about = "World P.A.M.: predictive analytic machine for global risk scenarios")]
#[command(version)]
#[command(after_help = EXAMPLES)]
#[command(group(ArgGroup::new("mode").required(true).args(["list", "run_all", "scenario"])))]
struct Cli {
    /// World configuration file (JSON)
    #[arg(long, env = "WORLDPAM_CONFIG")]
    config: Option<PathBuf>,

    /// List the configured scenarios and exit
    #[arg(long)]
    list: bool,

    /// Evaluate every configured scenario
    #[arg(long)]
    run_all: bool,

    /// Scenario (hypothesis) to evaluate
    #[arg(long)]
    scenario: Option<String>,

    /// Country or region to focus on, added as an extra keyword for this run
    #[arg(long)]
    country: Option<String>,

    /// Monte Carlo trials (0 disables simulation)
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    simulate: i64,

    /// Seed for the simulation (defaults to the configured seed, else random)
    #[arg(long)]
    seed: Option<u64>,

    /// Show per-signal contributions
    #[arg(long)]
    explain: bool,

    /// Emit JSON instead of text
    #[arg(long)]
    json: bool,

    /// Value for a structural signal, as NAME=VALUE (repeatable)
    #[arg(long = "evidence", value_name = "NAME=VALUE", value_parser = parse_evidence)]
    evidence: Vec<(String, f64)>,

    /// Local text file to add to the corpus (repeatable)
    #[arg(long = "corpus", value_name = "FILE")]
    corpus: Vec<PathBuf>,

    /// Do not fetch feeds; score only --corpus text
    #[arg(long)]
    offline: bool,
}

fn parse_evidence(raw: &str) -> Result<(String, f64), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", raw))?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid value for '{}': {}", name, e))?;
    Ok((name.trim().to_string(), value))
}

fn list_scenarios(model: &Model) {
    println!("Available scenarios:");
    for h in model.hypotheses() {
        println!("  {:<24} prior {:>5.1}%  {}", h.name, h.prior * 100.0, h.description);
    }
}

fn build_corpus(cli: &Cli, model: &Model, targets: &[HypothesisId]) -> Result<Corpus> {
    let mut corpus = if cli.offline {
        Corpus::new()
    } else {
        let fetcher = HttpFetcher::new().context("Failed to build HTTP client")?;
        let sources = model.sources_for(targets);
        log::info!("Fetching {} feed sources", sources.len());
        ingest(model, &sources, &fetcher)
    };

    for path in &cli.corpus {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read corpus file {}", path.display()))?;
        corpus.push_unattributed(text);
    }

    if corpus.is_empty() {
        log::warn!("Corpus is empty; scores will equal the priors");
    }
    Ok(corpus)
}

fn run_one(cli: &Cli, assessor: &Assessor, name: &str, options: &AssessOptions) -> Result<()> {
    let model = assessor.model();
    let id = model.hypothesis_by_name(name)?;
    let corpus = build_corpus(cli, model, &[id])?;
    let assessment = assessor.assess(name, &corpus, options)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&assessment)?);
        return Ok(());
    }

    println!(
        "World P.A.M. assessment, {} ({} documents)",
        assessment.assessed_at.format("%Y-%m-%d %H:%M UTC"),
        assessment.documents
    );
    if let Some(focus) = &assessment.focus {
        println!("Focus: {}", focus);
    }
    if !assessment.description.is_empty() {
        println!("{}", assessment.description);
    }
    println!();
    print!(
        "{}",
        render(&assessment.score, assessment.simulation.as_ref(), cli.explain)
    );
    Ok(())
}

fn run_all(cli: &Cli, assessor: &Assessor, options: &AssessOptions) -> Result<()> {
    let model = assessor.model();
    let targets: Vec<HypothesisId> = model.hypothesis_ids().collect();
    let corpus = build_corpus(cli, model, &targets)?;
    let results = assessor.assess_all(&corpus, options)?;

    if cli.json {
        let ok: Vec<_> = results.iter().filter_map(|(_, r)| r.as_ref().ok()).collect();
        for (id, result) in &results {
            if let Err(e) = result {
                eprintln!("{}: {}", model.hypothesis(*id).name, e);
            }
        }
        println!("{}", serde_json::to_string_pretty(&ok)?);
        return Ok(());
    }

    println!("Running all scenarios:");
    for (id, result) in &results {
        match result {
            Ok(a) => println!("  {}", summary_line(&a.score, a.simulation.as_ref())),
            Err(e) => eprintln!(
                "  {}: {} ({})",
                model.hypothesis(*id).name,
                e,
                e.recovery_suggestion()
            ),
        }
    }
    println!();
    println!("Tip: use --scenario NAME --explain for a per-signal breakdown.");
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let (config, origin) = load_world(cli.config.as_deref())?;
    let model = Model::resolve(&config)
        .with_context(|| format!("Invalid world configuration ({})", origin))?;

    if cli.list {
        list_scenarios(&model);
        return Ok(());
    }

    let seed = cli
        .seed
        .or(model.simulation().seed)
        .unwrap_or_else(rand::random);
    if cli.simulate > 0 {
        log::info!("Simulation seed: {}", seed);
    }

    let options = AssessOptions {
        focus: cli.country.clone(),
        trials: cli.simulate,
        seed,
        external: cli.evidence.clone(),
    };
    let assessor = Assessor::new(&model)?;

    match cli.scenario.as_deref() {
        Some(name) => run_one(&cli, &assessor, name, &options),
        None => run_all(&cli, &assessor, &options),
    }
}
