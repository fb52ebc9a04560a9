use pretty_assertions::assert_eq;
use symgen_config::{ConfigError, GeneratorConfig};

#[test]
fn default_catalogue_survives_a_generator_only_file() {
    let config = GeneratorConfig::load_from_str(
        r#"
[generator]
utility_class = "Dsl"
test_interface_suffix = "Spec"
"#,
    )
    .expect("config should parse");

    assert_eq!(config.generator.utility_class, "Dsl");
    assert_eq!(config.generator.reserved_prefix, "z$");
    assert_eq!(config.generator.test_interface_suffix, "Spec");
    let sql = config.archetype("Sql").expect("default archetype");
    let verbs: Vec<&str> = sql.methods.iter().map(|m| m.verb.as_str()).collect();
    assert_eq!(verbs, ["prepare", "sqlOf"]);
    assert_eq!(sql.methods[1].compose.as_deref(), Some("SqlTerms.compose"));
}

#[test]
fn blank_utility_class_is_invalid() {
    let err = GeneratorConfig::load_from_str("[generator]\nutility_class = \"  \"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)), "{err}");
}

#[test]
fn repeated_verbs_are_invalid() {
    let err = GeneratorConfig::load_from_str(
        r#"
[[archetypes]]
kind = "Sql"
[[archetypes.methods]]
verb = "prepare"
[[archetypes.methods]]
verb = "prepare"
"#,
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid config: archetype Sql declares verb prepare twice"
    );
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let err = GeneratorConfig::load_from_str("[generator\n").unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)), "{err}");
}

#[test]
fn logging_section_is_read() {
    let config = GeneratorConfig::load_from_str("[logging]\nlevel = \"debug\"\njson = true\n")
        .expect("config should parse");
    assert_eq!(config.logging.level, "debug");
    assert!(config.logging.json);
}
