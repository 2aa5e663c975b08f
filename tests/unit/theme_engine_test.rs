//! Unit tests for the ThemeEngine.
//!
//! Covers the calibrated gradient transform, the stored theme shape and the
//! nearest named container color.

use arc2zen::services::theme_engine::{ThemeEngine, ThemeEngineTrait};
use arc2zen::types::settings::ThemeCalibration;
use arc2zen::types::tree::SpaceColor;
use rstest::rstest;
use serde_json::Value;

#[rstest]
#[case::black(0.0, 0.0, 0.0, [185, 225, 150])]
#[case::white(1.0, 1.0, 1.0, [255, 250, 255])]
#[case::grey(0.5, 0.5, 0.5, [221, 237, 235])]
#[case::mixed(0.2, 0.4, 0.8, [199, 235, 255])]
fn test_gradient_rgb_transform(#[case] r: f64, #[case] g: f64, #[case] b: f64, #[case] expected: [u8; 3]) {
    let engine = ThemeEngine::default();
    assert_eq!(engine.gradient_rgb(&SpaceColor::clamped(r, g, b)), expected);
}

#[test]
fn test_workspace_theme_shape() {
    let engine = ThemeEngine::default();
    let theme = engine.workspace_theme(&SpaceColor::clamped(0.0, 0.0, 0.0));
    assert_eq!(theme.theme_type, "gradient");
    assert_eq!(theme.opacity, 1.0);
    assert_eq!(theme.rotation, 0);
    assert_eq!(theme.texture, 0.0);

    let stops: Value = serde_json::from_str(&theme.colors).unwrap();
    let stops = stops.as_array().unwrap();
    assert_eq!(stops.len(), 1);
    assert_eq!(stops[0]["c"], serde_json::json!([185, 225, 150]));
    assert_eq!(stops[0]["type"], "explicit-lightness");
    assert_eq!(stops[0]["lightness"], "75");
}

#[test]
fn test_workspace_theme_is_deterministic() {
    let engine = ThemeEngine::default();
    let color = SpaceColor::clamped(0.3, 0.6, 0.9);
    assert_eq!(engine.workspace_theme(&color), engine.workspace_theme(&color));
}

#[test]
fn test_custom_calibration() {
    let engine = ThemeEngine::new(ThemeCalibration {
        base: [0.0, 0.0, 0.0],
        scale: [255.0, 255.0, 255.0],
        lightness: "50".to_string(),
        opacity: 0.5,
    });
    let color = SpaceColor::clamped(1.0, 0.5, 0.0);
    assert_eq!(engine.gradient_rgb(&color), [255, 127, 0]);
    let theme = engine.workspace_theme(&color);
    assert_eq!(theme.opacity, 0.5);
    assert!(theme.colors.contains("\"lightness\":\"50\""));
}

#[rstest]
#[case::red(1.0, 0.0, 0.0, "red")]
#[case::sky(0.0, 0.6, 1.0, "blue")]
#[case::leaf(0.3, 0.8, 0.0, "green")]
#[case::gold(1.0, 0.8, 0.0, "yellow")]
fn test_nearest_container_color(#[case] r: f64, #[case] g: f64, #[case] b: f64, #[case] expected: &str) {
    let engine = ThemeEngine::default();
    assert_eq!(engine.nearest_container_color(&SpaceColor::clamped(r, g, b)), expected);
}
