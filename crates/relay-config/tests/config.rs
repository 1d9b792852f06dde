//! Tests for loading relay configuration.

use std::time::Duration;

use relay_config::{ConfigError, RelayConfig, RetryPolicy};
use relay_model::{MappingRuleSource, Region};

const SAMPLE: &str = r#"
region = "SEQ"

[retry]
max_attempts = 5
multiplier_ms = 200
max_delay_ms = 1000

[logging]
level = "debug"
format = "json"

[tables]
excluded_patterns = ["RTU"]
substation_map = { T8 = "GYM", T124 = "" }
tally_lockout_patterns = ["RC01", "OSM"]

[[tables.suffix_expansions]]
suffix = "A+B"
components = ["A", "B"]

[[curve_mapping]]
description = "IEC very inverse"
code = "2"
curve = "IEC Very Inverse"

[[cb_alt_names]]
substation = "GYM"
cb_name = "CB12"
new_name = "CB12A"

[patterns."CAPM4"]
target_type = "Generic CAPM4"
rules = [
    ["Relay Model", "OC1", "Ipset", "Group 1", "Pickup", "use_setting", "primary"],
    ["Relay Model", "OC1", "outserv", "Group 1", "Enable", "use_setting", "None", "[off]"],
]
"#;

#[test]
fn loads_sample_config() {
    let config = RelayConfig::from_toml_str(SAMPLE).expect("parse sample config");

    assert_eq!(config.region, Some(Region::Energex));
    assert_eq!(config.retry.max_attempts, 5);
    assert_eq!(config.logging.format, "json");
    assert_eq!(config.mapped_patterns(), ["CAPM4"]);
    assert!(config.patterns.uses_lockout_tally("OSM45_Energex"));
    // Sections left out keep their built-in tables.
    assert!(config.patterns.is_out_of_service("SOLKOR-RF_Energex"));
}

#[test]
fn serves_rule_tables_through_source() {
    let config = RelayConfig::from_toml_str(SAMPLE).expect("parse sample config");

    let table = config
        .load_rules("CAPM4")
        .expect("load rules")
        .expect("CAPM4 is mapped");
    assert_eq!(table.target_type, "Generic CAPM4");
    assert_eq!(table.rules.len(), 2);
    assert_eq!(table.rules[1].last(), "[off]");

    assert!(config.load_rules("SEL351").expect("load rules").is_none());
}

#[test]
fn empty_substation_values_mean_unscoped() {
    let config = RelayConfig::from_toml_str(SAMPLE).expect("parse sample config");
    let map = config.load_substation_mapping().expect("substation map");

    assert_eq!(map.get("T8"), Some(&Some("GYM".to_string())));
    assert_eq!(map.get("T124"), Some(&None));
    assert!(!map.contains_key("T11"));
}

#[test]
fn default_config_carries_builtin_tables() {
    let config = RelayConfig::default();
    let tables = config.load_region_tables().expect("region tables");

    assert!(tables.is_excluded("SEL2505_Energex"));
    assert_eq!(tables.substation_map.get("T8"), Some(&Some("GYM".to_string())));
    assert_eq!(tables.substation_map.get("T124"), Some(&None));
    let first = &tables.suffix_expansions[0];
    assert!(first.suffix == "A+B+CP11" || first.suffix == "A+B+CP12");
    assert!(tables.suffix_expansions.iter().any(|e| e.suffix == "A+CP14"));
    assert_eq!(tables.suffix_expansions.last().map(|e| e.suffix.as_str()), Some("A+B"));
}

#[test]
fn pattern_without_target_type_is_rejected() {
    let err = RelayConfig::from_toml_str(
        r#"
[patterns."X"]
target_type = " "
"#,
    )
    .expect_err("blank target type");
    assert!(matches!(err, ConfigError::Invalid { .. }));
}

#[test]
fn malformed_toml_reports_parse_error() {
    let err = RelayConfig::from_toml_str("region = [").expect_err("bad toml");
    assert!(matches!(err, ConfigError::Toml { .. }));
}

#[test]
fn backoff_ceiling_grows_and_caps() {
    let policy = RetryPolicy {
        max_attempts: 3,
        multiplier: Duration::from_millis(1000),
        max_delay: Duration::from_millis(5000),
    };
    assert_eq!(policy.backoff_ceiling(1), Duration::from_millis(1000));
    assert_eq!(policy.backoff_ceiling(2), Duration::from_millis(2000));
    assert_eq!(policy.backoff_ceiling(4), Duration::from_millis(5000));
    assert_eq!(RetryPolicy::immediate(3).backoff_ceiling(2), Duration::ZERO);
}

#[test]
fn default_out_of_service_patterns() {
    let config = RelayConfig::default();
    insta::assert_json_snapshot!(config.patterns.out_of_service, @r#"
    [
      "7PG21 (SOLKOR-RF)",
      "7SG18 (SOLKOR-N)",
      "RED615 2.6 - 2.8",
      "SOLKOR-N_Energex",
      "SOLKOR-RF_Energex"
    ]
    "#);
}
