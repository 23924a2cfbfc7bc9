//! Tests for configuration loading and validation.

use super::config::*;

#[test]
fn test_default_config() {
    let config = GraphConfig::default();

    assert_eq!(config.node_id_type, IdType::Integer);
    assert_eq!(config.edge_id_type, IdType::Integer);
    assert!(config.edge_weight_column);
    assert_eq!(config.edge_weight_kind, WeightKind::Static);
    assert_eq!(config.time_representation, TimeRepresentation::Timestamp);
    assert!(config.auto_locking);
    assert!(config.enable_observers);
    assert!(config.enable_index_time);
    assert!(!config.view_auto_include);
}

#[test]
fn test_default_config_validates() {
    assert!(GraphConfig::default().validate().is_ok());
}

#[test]
fn test_dynamic_weight_requires_weight_column() {
    let config = GraphConfig {
        edge_weight_column: false,
        edge_weight_kind: WeightKind::Dynamic,
        ..GraphConfig::default()
    };

    let err = config.validate().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { .. }));
}

#[test]
fn test_partial_toml_keeps_defaults() {
    let config: GraphConfig = toml::from_str(
        r#"
        node_id_type = "string"
        time_representation = "interval"
        "#,
    )
    .expect("partial config should deserialize");

    assert_eq!(config.node_id_type, IdType::String);
    assert_eq!(config.time_representation, TimeRepresentation::Interval);
    // Untouched fields fall back to defaults.
    assert_eq!(config.edge_id_type, IdType::Integer);
    assert!(config.auto_locking);
}

#[test]
fn test_load_missing_file_uses_defaults() {
    let config = GraphConfig::load("/definitely/not/here/hypha.toml")
        .expect("missing file should fall back to defaults");
    assert_eq!(config, GraphConfig::default());
}

#[test]
fn test_enum_snake_case_round_trip() {
    let config = GraphConfig {
        edge_weight_kind: WeightKind::Dynamic,
        time_representation: TimeRepresentation::Interval,
        ..GraphConfig::default()
    };

    let text = toml::to_string(&config).expect("serialize");
    assert!(text.contains("edge_weight_kind = \"dynamic\""));
    assert!(text.contains("time_representation = \"interval\""));

    let back: GraphConfig = toml::from_str(&text).expect("deserialize");
    assert_eq!(back, config);
}
