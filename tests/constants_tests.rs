// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use friedcamera::app::log_slider;
use friedcamera::constants::{crunch, pipeline, shaders, timing, window};

#[test]
fn test_crunch_defaults_within_ranges() {
    assert!((crunch::BASE_MIN..=crunch::BASE_MAX).contains(&crunch::BASE_DEFAULT));
    assert!(
        (crunch::HORIZONTAL_MIN..=crunch::HORIZONTAL_MAX).contains(&crunch::HORIZONTAL_DEFAULT)
    );
    assert!((crunch::VERTICAL_MIN..=crunch::VERTICAL_MAX).contains(&crunch::VERTICAL_DEFAULT));
}

#[test]
fn test_crunch_ranges_are_positive() {
    // Log sliders need strictly positive bounds
    for min in [crunch::BASE_MIN, crunch::HORIZONTAL_MIN, crunch::VERTICAL_MIN] {
        assert!(min > 0.0);
    }
}

#[test]
fn test_slider_defaults_round_trip() {
    let base = log_slider::BASE.value(log_slider::BASE.position(crunch::BASE_DEFAULT));
    assert!((base - crunch::BASE_DEFAULT).abs() < 1e-4);
}

#[test]
fn test_window_defaults() {
    assert_eq!((window::DEFAULT_WIDTH, window::DEFAULT_HEIGHT), (1280.0, 720.0));
    assert!(window::MIN_WIDTH <= window::DEFAULT_WIDTH);
    assert!(window::MIN_HEIGHT <= window::DEFAULT_HEIGHT);
}

#[test]
fn test_pipeline_prefers_nv12() {
    assert!(pipeline::SINK_CAPS.starts_with("video/x-raw,format=NV12"));
    assert!(pipeline::MAX_BUFFERS >= 1);
}

#[test]
fn test_tile_is_two_blocks_wide() {
    assert_eq!(shaders::TILE_SIZE, 16);
    assert!(timing::FRAME_POLL_INTERVAL < timing::PERMISSION_POLL_INTERVAL);
}
