//! Mask Table Tests.
//!
//! Verifies toggle semantics and that concurrent toggles are never lost.

use std::sync::Arc;
use std::thread;

use irqsim_core::soc::{DeviceId, MaskTable};
use pretty_assertions::assert_eq;

#[test]
fn mask_starts_unmasked() {
    let masks = MaskTable::with_len(3);
    assert_eq!(masks.snapshot(), vec![false, false, false]);
}

#[test]
fn mask_toggle_returns_new_state() {
    let masks = MaskTable::with_len(2);
    assert_eq!(masks.toggle(DeviceId(1)), Some(true));
    assert!(masks.is_masked(DeviceId(1)));
    assert!(!masks.is_masked(DeviceId(0)));
    assert_eq!(masks.toggle(DeviceId(1)), Some(false));
    assert!(!masks.is_masked(DeviceId(1)));
}

#[test]
fn mask_toggle_twice_restores_state() {
    let masks = MaskTable::with_len(3);
    let _ = masks.set(DeviceId(2), true);
    let before = masks.snapshot();
    let _ = masks.toggle(DeviceId(2));
    let _ = masks.toggle(DeviceId(2));
    assert_eq!(masks.snapshot(), before);
}

#[test]
fn mask_unknown_device_is_rejected() {
    let masks = MaskTable::with_len(1);
    assert_eq!(masks.toggle(DeviceId(5)), None);
    assert_eq!(masks.set(DeviceId(5), true), None);
    assert!(!masks.is_masked(DeviceId(5)));
}

#[test]
fn mask_set_returns_previous_state() {
    let masks = MaskTable::with_len(1);
    assert_eq!(masks.set(DeviceId(0), true), Some(false));
    assert_eq!(masks.set(DeviceId(0), true), Some(true));
    assert_eq!(masks.set(DeviceId(0), false), Some(true));
}

#[test]
fn mask_concurrent_even_toggles_cancel_out() {
    const THREADS: usize = 8;
    const TOGGLES: usize = 1_000;

    let masks = Arc::new(MaskTable::with_len(2));
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let masks = Arc::clone(&masks);
            thread::spawn(move || {
                for _ in 0..TOGGLES {
                    let _ = masks.toggle(DeviceId(0));
                }
            })
        })
        .collect();
    for h in handles {
        h.join().expect("toggler panicked");
    }

    // 8000 flips in total: an even count always lands back on unmasked.
    assert!(!masks.is_masked(DeviceId(0)));
    assert!(!masks.is_masked(DeviceId(1)));
}

#[test]
fn mask_concurrent_odd_toggles_end_masked() {
    let masks = Arc::new(MaskTable::with_len(1));
    let handles: Vec<_> = (0..3)
        .map(|_| {
            let masks = Arc::clone(&masks);
            thread::spawn(move || {
                for _ in 0..333 {
                    let _ = masks.toggle(DeviceId(0));
                }
            })
        })
        .collect();
    for h in handles {
        h.join().expect("toggler panicked");
    }
    assert!(masks.is_masked(DeviceId(0)));
}
