//! Host-level tests for the adaptive tolerance windows.

use rf433_kit::band::Band;
use rf433_kit::constants::{BAND_MAX_D, BAND_MIN_D, MAX_DURATION};

#[test]
fn init_learns_a_quarter_wide_window() {
    let mut band = Band::new();
    assert!(band.init(1000));
    assert!(band.is_set());
    assert!(band.test_value(750));
    assert!(band.test_value(1250));
    assert!(!band.test_value(749));
    assert!(!band.test_value(1251));
}

#[test]
fn init_rejects_out_of_range_durations() {
    let mut band = Band::new();
    assert!(!band.init(BAND_MIN_D - 1));
    assert!(!band.is_set());
    assert!(!band.init(BAND_MAX_D + 1));
    assert!(!band.is_set());

    // The bounds themselves are in range.
    assert!(band.init(BAND_MIN_D));
    let mut band = Band::new();
    assert!(band.init(BAND_MAX_D));
}

#[test]
fn separator_band_has_no_upper_bound() {
    let mut band = Band::new();
    assert!(band.init_sep(11000));
    // Lower bound is 5/8 of the learned duration.
    assert!(!band.test_value(6874));
    assert!(band.test_value(6875));
    assert!(band.test_value(MAX_DURATION));
}

#[test]
fn unset_band_accepts_nothing() {
    let mut band = Band::new();
    assert!(!band.test_value(1000));
}

#[test]
fn first_test_initializes_instead_of_rejecting() {
    // The classifier bootstrap: an unset band learns the first duration
    // it is asked about.
    let mut band = Band::new();
    assert!(band.test_value_init_if_needed(1000));
    assert!(band.is_set());
    // From then on it really tests.
    assert!(band.test_value_init_if_needed(1100));
    assert!(!band.test_value_init_if_needed(2000));
}

#[test]
fn reset_forgets_the_window() {
    let mut band = Band::new();
    band.init(1000);
    band.reset();
    assert!(!band.is_set());
    assert!(!band.test_value(1000));
}
