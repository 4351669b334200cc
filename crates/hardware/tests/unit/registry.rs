//! Device Registry Tests.
//!
//! Verifies construction from configuration, rejection of invalid device sets,
//! and selector lookup by index or label.

use irqsim_core::SimError;
use irqsim_core::soc::{DeviceId, DeviceRegistry};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::time::Duration;

use crate::common::harness::{device, fast_config};

#[test]
fn registry_keeps_configuration_order() {
    let config = fast_config();
    let registry = DeviceRegistry::from_config(&config.devices).expect("valid devices");

    let labels: Vec<&str> = registry.iter().map(|d| d.label()).collect();
    assert_eq!(labels, vec!["Keyboard", "Mouse", "Printer"]);
    assert_eq!(registry.len(), 3);

    for (idx, dev) in registry.iter().enumerate() {
        assert_eq!(dev.id(), DeviceId(idx));
    }
    let mouse = registry.get(DeviceId(1)).expect("mouse");
    assert_eq!(mouse.priority(), 2);
    assert_eq!(mouse.handler_duration(), Duration::from_millis(10));
}

#[test]
fn registry_default_devices_match_reference_set() {
    let config = irqsim_core::Config::default();
    let registry = DeviceRegistry::from_config(&config.devices).expect("valid devices");

    let rows: Vec<(String, u32, u128)> = registry
        .iter()
        .map(|d| {
            (
                d.label().to_string(),
                d.priority(),
                d.handler_duration().as_millis(),
            )
        })
        .collect();
    assert_eq!(
        rows,
        vec![
            ("Keyboard".to_string(), 1, 500),
            ("Mouse".to_string(), 2, 1000),
            ("Printer".to_string(), 3, 1000),
        ]
    );
}

#[test]
fn registry_rejects_empty_device_set() {
    let err = DeviceRegistry::from_config(&[]).unwrap_err();
    assert!(matches!(err, SimError::EmptyRegistry));
}

#[test]
fn registry_rejects_duplicate_priority() {
    let devices = vec![device("Disk", 4, 1), device("Net", 4, 1)];
    let err = DeviceRegistry::from_config(&devices).unwrap_err();
    assert!(
        matches!(err, SimError::DuplicatePriority { priority: 4, .. }),
        "got {err:?}"
    );
}

#[test]
fn registry_rejects_duplicate_label_ignoring_case() {
    let devices = vec![device("Disk", 1, 1), device("DISK", 2, 1)];
    let err = DeviceRegistry::from_config(&devices).unwrap_err();
    assert!(matches!(err, SimError::DuplicateLabel(_)), "got {err:?}");
}

#[test]
fn registry_rejects_blank_label() {
    let devices = vec![device("Disk", 1, 1), device("  ", 2, 1)];
    let err = DeviceRegistry::from_config(&devices).unwrap_err();
    assert!(matches!(err, SimError::EmptyLabel(1)), "got {err:?}");
}

#[test]
fn registry_allows_rank_zero_and_gaps() {
    let devices = vec![device("Timer", 0, 1), device("Disk", 40, 1)];
    let registry = DeviceRegistry::from_config(&devices).expect("valid devices");
    assert_eq!(registry.len(), 2);
}

#[rstest]
#[case("1", "Keyboard")]
#[case("2", "Mouse")]
#[case("3", "Printer")]
#[case("keyboard", "Keyboard")]
#[case("MOUSE", "Mouse")]
#[case(" Printer ", "Printer")]
fn registry_find_resolves_selector(#[case] selector: &str, #[case] expected: &str) {
    let registry = DeviceRegistry::from_config(&fast_config().devices).expect("valid devices");
    let dev = registry.find(selector).expect("known selector");
    assert_eq!(dev.label(), expected);
}

#[rstest]
#[case("0")]
#[case("4")]
#[case("-1")]
#[case("Scanner")]
#[case("")]
fn registry_find_rejects_unknown_selector(#[case] selector: &str) {
    let registry = DeviceRegistry::from_config(&fast_config().devices).expect("valid devices");
    let err = registry.find(selector).unwrap_err();
    assert!(matches!(err, SimError::UnknownDevice(_)), "got {err:?}");
}

#[rstest]
#[case("7")]
#[case("3")]
#[case(" 12 ")]
fn registry_rejects_numeric_label(#[case] label: &str) {
    let devices = vec![device("Timer", 0, 1), device(label, 1, 1)];
    let err = DeviceRegistry::from_config(&devices).unwrap_err();
    assert!(matches!(err, SimError::NumericLabel(_)), "got {err:?}");
}

#[test]
fn registry_accepts_label_mixing_digits_and_letters() {
    let devices = vec![device("Timer", 0, 1), device("uart2", 1, 1), device("+3", 2, 1)];
    let registry = DeviceRegistry::from_config(&devices).expect("valid devices");

    assert_eq!(registry.find("UART2").expect("label").id(), DeviceId(1));
    assert_eq!(registry.find("+3").expect("label").id(), DeviceId(2));
    assert_eq!(registry.find("3").expect("index").id(), DeviceId(2));
}

#[test]
fn registry_folds_non_ascii_labels_the_same_way_everywhere() {
    let devices = vec![device("Écran", 1, 1), device("Ärger", 2, 1)];
    let registry = DeviceRegistry::from_config(&devices).expect("valid devices");
    assert_eq!(registry.find("écran").expect("label").id(), DeviceId(0));
    assert_eq!(registry.find("äRGER").expect("label").id(), DeviceId(1));

    let clash = vec![device("Écran", 1, 1), device("écran", 2, 1)];
    let err = DeviceRegistry::from_config(&clash).unwrap_err();
    assert!(matches!(err, SimError::DuplicateLabel(_)), "got {err:?}");
}
