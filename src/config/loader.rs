use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PamError, PamResult};

use super::embedded;
use super::schema::WorldConfig;

/// File name looked up in the working directory and in `~/.worldpam/`.
pub const DEFAULT_FILE_NAME: &str = "world_config.json";

/// Where the active world configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    File(PathBuf),
    Embedded,
}

impl std::fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigOrigin::File(path) => write!(f, "{}", path.display()),
            ConfigOrigin::Embedded => write!(f, "<embedded default>"),
        }
    }
}

/// Parse a world configuration from JSON text.
pub fn parse_config(json: &str) -> PamResult<WorldConfig> {
    Ok(serde_json::from_str(json)?)
}

/// Read, parse and validate a world configuration file.
pub fn load_config_file(path: &Path) -> PamResult<WorldConfig> {
    let content = fs::read_to_string(path).map_err(|source| PamError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Pick the config file to load.
///
/// An explicit path is always returned, even if it does not exist, so the
/// read error reaches the caller instead of silently falling back.
pub fn locate_config(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let local = PathBuf::from(DEFAULT_FILE_NAME);
    if local.exists() {
        return Some(local);
    }

    let user = dirs::home_dir()?.join(".worldpam").join(DEFAULT_FILE_NAME);
    user.exists().then_some(user)
}

/// Load the world configuration, falling back to the embedded default.
pub fn load_world(explicit: Option<&Path>) -> PamResult<(WorldConfig, ConfigOrigin)> {
    match locate_config(explicit) {
        Some(path) => {
            log::info!("Loading world config from {}", path.display());
            let config = load_config_file(&path)?;
            Ok((config, ConfigOrigin::File(path)))
        }
        None => {
            log::info!("No world config file found, using embedded default");
            let config = parse_config(embedded::default_world())?;
            validate_config(&config)?;
            Ok((config, ConfigOrigin::Embedded))
        }
    }
}

/// Validate values that do not depend on cross references.
///
/// Dangling references are caught when the config is resolved into a
/// [`crate::model::Model`].
pub fn validate_config(config: &WorldConfig) -> PamResult<()> {
    check_unique("source", config.sources.iter().map(|s| s.name.as_str()))?;
    check_unique("signal", config.signals.iter().map(|s| s.name.as_str()))?;
    check_unique("hypothesis", config.hypotheses.iter().map(|h| h.name.as_str()))?;

    for source in &config.sources {
        if !(source.timeout.is_finite() && source.timeout > 0.0) {
            return Err(PamError::InvalidSourceParameter {
                source_name: source.name.clone(),
                reason: format!("timeout must be a positive number of seconds, got {}", source.timeout),
            });
        }
    }

    for signal in &config.signals {
        if !signal.weight.is_finite() {
            return Err(PamError::InvalidWeight {
                signal: signal.name.clone(),
                weight: signal.weight,
            });
        }
        if !(signal.saturation.is_finite() && signal.saturation > 0.0) {
            return Err(PamError::InvalidSignalParameter {
                signal: signal.name.clone(),
                reason: format!("saturation must be positive, got {}", signal.saturation),
            });
        }
        if !(signal.cap > 0.0 && signal.cap <= 1.0) {
            return Err(PamError::InvalidSignalParameter {
                signal: signal.name.clone(),
                reason: format!("cap must lie in (0, 1], got {}", signal.cap),
            });
        }
    }

    for hypothesis in &config.hypotheses {
        if !(hypothesis.prior > 0.0 && hypothesis.prior < 1.0) {
            return Err(PamError::InvalidPrior {
                hypothesis: hypothesis.name.clone(),
                prior: hypothesis.prior,
            });
        }
    }

    let sim = &config.simulation;
    for (label, spread) in [
        ("evidence_spread", sim.evidence_spread),
        ("weight_spread", sim.weight_spread),
    ] {
        if !(spread.is_finite() && spread >= 0.0) {
            return Err(PamError::InvalidSimulationSetting(format!(
                "{} must be a non-negative number, got {}",
                label, spread
            )));
        }
    }

    Ok(())
}

fn check_unique<'a>(kind: &'static str, names: impl Iterator<Item = &'a str>) -> PamResult<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(PamError::DuplicateName {
                kind,
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"{
        "sources": [{ "name": "wire", "url": "https://example.org/rss" }],
        "keyword_sets": { "coup": ["coup", "junta"] },
        "signals": [{ "name": "coup_talk", "weight": 2.0, "keyword_sets": ["coup"], "sources": ["wire"] }],
        "hypotheses": [{ "name": "coup_risk", "prior": 0.05, "signals": ["coup_talk"] }]
    }"#;

    fn minimal() -> WorldConfig {
        parse_config(MINIMAL).unwrap()
    }

    #[test]
    fn test_defaults_applied() {
        let config = minimal();
        assert_eq!(config.sources[0].timeout, 10.0);
        assert_eq!(config.sources[0].kind, crate::config::FeedKind::Rss);
        assert_eq!(config.signals[0].saturation, 0.15);
        assert_eq!(config.signals[0].cap, 1.0);
        assert_eq!(config.simulation.evidence_spread, 0.1);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_load_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();
        let config = load_config_file(file.path()).expect("should load");
        assert_eq!(config.hypotheses[0].name, "coup_risk");
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config_file(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, PamError::ConfigRead { .. }));
    }

    #[test]
    fn test_explicit_missing_path_does_not_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.json");
        assert!(load_world(Some(&missing)).is_err());
    }

    #[test]
    fn test_malformed_weight_is_parse_error() {
        let json = MINIMAL.replace("\"weight\": 2.0", "\"weight\": \"heavy\"");
        assert!(matches!(parse_config(&json), Err(PamError::ConfigParse(_))));
    }

    #[test]
    fn test_prior_outside_open_interval_rejected() {
        for prior in [0.0, 1.0, -0.2, 1.3] {
            let mut config = minimal();
            config.hypotheses[0].prior = prior;
            let err = validate_config(&config).unwrap_err();
            assert!(matches!(err, PamError::InvalidPrior { .. }), "prior {}", prior);
        }
    }

    #[test]
    fn test_duplicate_signal_name_rejected() {
        let mut config = minimal();
        let dup = config.signals[0].clone();
        config.signals.push(dup);
        assert!(matches!(
            validate_config(&config),
            Err(PamError::DuplicateName { kind: "signal", .. })
        ));
    }

    #[test]
    fn test_bad_signal_parameters_rejected() {
        let mut config = minimal();
        config.signals[0].saturation = 0.0;
        assert!(validate_config(&config).is_err());

        let mut config = minimal();
        config.signals[0].cap = 1.5;
        assert!(validate_config(&config).is_err());

        let mut config = minimal();
        config.signals[0].weight = f64::NAN;
        assert!(matches!(
            validate_config(&config),
            Err(PamError::InvalidWeight { .. })
        ));
    }

    #[test]
    fn test_negative_spread_rejected() {
        let mut config = minimal();
        config.simulation.evidence_spread = -0.1;
        assert!(matches!(
            validate_config(&config),
            Err(PamError::InvalidSimulationSetting(_))
        ));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = minimal();
        config.sources[0].timeout = 0.0;
        assert!(matches!(
            validate_config(&config),
            Err(PamError::InvalidSourceParameter { .. })
        ));
    }
}
