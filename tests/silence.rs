//! Host-level tests for the channel-activity window.

use rf433_kit::constants::{SILENCE_MAX_D, SILENCE_MIN_D, SILENCE_THRESHOLD, SILENCE_WINDOW};
use rf433_kit::silence::ActivityWindow;

#[test]
fn not_idle_before_a_full_window() {
    let mut window = ActivityWindow::new();
    for _ in 0..SILENCE_WINDOW - 1 {
        window.record(500);
        assert!(!window.is_idle());
    }
    window.record(500);
    assert!(window.is_idle());
}

#[test]
fn out_of_range_edges_do_not_count() {
    let mut window = ActivityWindow::new();
    for _ in 0..SILENCE_WINDOW {
        window.record(SILENCE_MIN_D - 1);
    }
    assert!(!window.is_idle());

    let mut window = ActivityWindow::new();
    for _ in 0..SILENCE_WINDOW {
        window.record(SILENCE_MAX_D + 1);
    }
    assert!(!window.is_idle());
}

#[test]
fn range_bounds_are_inclusive() {
    let mut window = ActivityWindow::new();
    for _ in 0..SILENCE_WINDOW / 2 {
        window.record(SILENCE_MIN_D);
        window.record(SILENCE_MAX_D);
    }
    assert!(window.is_idle());
}

#[test]
fn threshold_tolerates_a_few_outliers() {
    // 12 in-range of 16 is enough; 11 is not.
    let mut window = ActivityWindow::new();
    for i in 0..SILENCE_WINDOW {
        window.record(if i < SILENCE_THRESHOLD { 500 } else { 100 });
    }
    assert!(window.is_idle());

    let mut window = ActivityWindow::new();
    for i in 0..SILENCE_WINDOW {
        window.record(if i < SILENCE_THRESHOLD - 1 { 500 } else { 100 });
    }
    assert!(!window.is_idle());
}

#[test]
fn old_edges_slide_out_of_the_window() {
    let mut window = ActivityWindow::new();
    for _ in 0..SILENCE_WINDOW {
        window.record(500);
    }
    assert!(window.is_idle());
    // A burst of noise pushes the good edges out.
    for _ in 0..5 {
        window.record(50);
    }
    assert!(!window.is_idle());
}

#[test]
fn reset_starts_the_observation_over() {
    let mut window = ActivityWindow::new();
    for _ in 0..SILENCE_WINDOW {
        window.record(500);
    }
    window.reset();
    assert!(!window.is_idle());
}
