const WORLD_CONFIG: &str = include_str!("../../presets/world_config.json");

/// The default world configuration compiled into the binary.
pub fn default_world() -> &'static str {
    WORLD_CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::{parse_config, validate_config};
    use crate::model::Model;

    #[test]
    fn test_embedded_world_parses_and_resolves() {
        let config = parse_config(default_world()).expect("embedded config should parse");
        validate_config(&config).expect("embedded config should validate");
        let model = Model::resolve(&config).expect("embedded config should resolve");
        assert!(model.hypotheses().len() >= 5);
        assert!(model.hypothesis_by_name("civil_war_risk").is_ok());
    }
}
