//! # Configuration Tests
//!
//! Tests for configuration defaults, JSON deserialization, file loading, and
//! validation.

use std::io::Write;

use irqsim_core::SimError;
use irqsim_core::config::*;
use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;

#[test]
fn test_config_default() {
    let config = Config::default();
    assert_eq!(config.general.seed, None);
    assert!(config.general.initial_masks.is_empty());
    assert_eq!(config.devices.len(), 3);
    assert_eq!(config.generator, GeneratorConfig::default());
}

#[test]
fn test_generator_config_defaults() {
    let generator = GeneratorConfig::default();
    assert_eq!(generator.min_interval_ms, 1000);
    assert_eq!(generator.interval_range_ms, 2000);
    assert_eq!(generator.min_interval().as_millis(), 1000);
    assert_eq!(generator.interval_range().as_millis(), 2000);
    assert!(generator.validate().is_ok());
}

#[test]
fn test_empty_json_yields_defaults() {
    let config = Config::from_json("{}").expect("empty object");
    let defaults = Config::default();
    assert_eq!(config.devices, defaults.devices);
    assert_eq!(config.generator, defaults.generator);
}

#[test]
fn test_partial_json_fills_missing_fields() {
    let json = r#"{
        "general": { "initial_masks": ["Printer"] },
        "devices": [ { "label": "Timer", "priority": 0 } ],
        "generator": { "min_interval_ms": 3 }
    }"#;
    let config = Config::from_json(json).expect("valid json");

    assert_eq!(config.general.initial_masks, vec!["Printer".to_string()]);
    assert_eq!(
        config.devices,
        vec![DeviceConfig {
            label: "Timer".to_string(),
            priority: 0,
            handler_ms: 1000,
        }]
    );
    assert_eq!(config.generator.min_interval_ms, 3);
    assert_eq!(config.generator.interval_range_ms, 2000);
}

#[test]
fn test_device_without_priority_is_rejected() {
    let err = Config::from_json(r#"{ "devices": [ { "label": "Disk" } ] }"#).unwrap_err();
    assert!(matches!(err, SimError::ConfigParse(_)), "got {err:?}");
}

#[test]
fn test_malformed_json_is_rejected() {
    let err = Config::from_json("{ devices: ").unwrap_err();
    assert!(matches!(err, SimError::ConfigParse(_)), "got {err:?}");
}

#[test]
fn test_zero_interval_fails_validation() {
    let generator = GeneratorConfig {
        min_interval_ms: 0,
        interval_range_ms: 0,
    };
    let err = generator.validate().unwrap_err();
    assert!(
        matches!(
            err,
            SimError::InvalidInterval {
                min_ms: 0,
                range_ms: 0
            }
        ),
        "got {err:?}"
    );
}

#[test]
fn test_config_from_file() {
    let mut file = NamedTempFile::new().expect("temp file");
    write!(
        file,
        r#"{{ "general": {{ "seed": 99 }}, "generator": {{ "interval_range_ms": 0 }} }}"#
    )
    .expect("write config");

    let config = Config::from_file(file.path()).expect("load config");
    assert_eq!(config.general.seed, Some(99));
    assert_eq!(config.generator.interval_range_ms, 0);
    assert_eq!(config.generator.min_interval_ms, 1000);
}

#[test]
fn test_missing_file_reports_path() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("absent.json");

    let err = Config::from_file(&path).unwrap_err();
    match err {
        SimError::ConfigIo { path: reported, .. } => {
            assert_eq!(reported, path.display().to_string());
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
