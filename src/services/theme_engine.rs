//! Theme Engine: maps a source space color to a workspace gradient theme and
//! to the nearest named container color.

use serde_json::json;

use crate::types::destination::WorkspaceTheme;
use crate::types::settings::ThemeCalibration;
use crate::types::tree::SpaceColor;

/// Trait defining the theme engine interface.
pub trait ThemeEngineTrait {
    fn gradient_rgb(&self, color: &SpaceColor) -> [u8; 3];
    fn workspace_theme(&self, color: &SpaceColor) -> WorkspaceTheme;
    fn nearest_container_color(&self, color: &SpaceColor) -> &'static str;
}

/// Named container colors and their display values.
struct ContainerPalette;
impl ContainerPalette {
    const COLORS: [(&'static str, &'static str); 8] = [
        ("blue", "#37adff"),
        ("turquoise", "#00c79a"),
        ("green", "#51cd00"),
        ("yellow", "#ffcb00"),
        ("orange", "#ff9f00"),
        ("red", "#ff613d"),
        ("pink", "#ff4bda"),
        ("purple", "#af51f5"),
    ];
}

/// Parses a `#rrggbb` or `#rgb` hex color.
fn parse_hex_color(color: &str) -> Option<[u8; 3]> {
    let hex = color.strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        6 => Some([channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?]),
        3 => {
            let short = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 17);
            Some([short(0)?, short(1)?, short(2)?])
        }
        _ => None,
    }
}

/// The theme engine implementation.
pub struct ThemeEngine {
    calibration: ThemeCalibration,
}

impl ThemeEngine {
    pub fn new(calibration: ThemeCalibration) -> Self {
        Self { calibration }
    }

    /// JSON for the single explicit-lightness color stop.
    fn color_stops(&self, rgb: [u8; 3]) -> String {
        json!([{
            "c": rgb,
            "isCustom": false,
            "algorithm": "floating",
            "isPrimary": true,
            "lightness": self.calibration.lightness,
            "position": {"x": 228, "y": 253},
            "type": "explicit-lightness",
        }])
        .to_string()
    }
}

impl Default for ThemeEngine {
    fn default() -> Self {
        Self::new(ThemeCalibration::default())
    }
}

impl ThemeEngineTrait for ThemeEngine {
    /// `clamp(trunc(base + c * scale), 0, 255)` per channel.
    fn gradient_rgb(&self, color: &SpaceColor) -> [u8; 3] {
        let channels = [color.r, color.g, color.b];
        let mut out = [0u8; 3];
        for (i, c) in channels.iter().enumerate() {
            let value = (self.calibration.base[i] + c * self.calibration.scale[i]).trunc();
            out[i] = if value.is_finite() {
                value.clamp(0.0, 255.0) as u8
            } else {
                0
            };
        }
        out
    }

    fn workspace_theme(&self, color: &SpaceColor) -> WorkspaceTheme {
        WorkspaceTheme {
            theme_type: "gradient".to_string(),
            colors: self.color_stops(self.gradient_rgb(color)),
            opacity: self.calibration.opacity,
            rotation: 0,
            texture: 0.0,
        }
    }

    /// Closest palette entry by squared RGB distance; ties keep palette order.
    fn nearest_container_color(&self, color: &SpaceColor) -> &'static str {
        let target = [color.r * 255.0, color.g * 255.0, color.b * 255.0];
        let mut best = ("blue", f64::MAX);
        for (name, hex) in ContainerPalette::COLORS {
            let Some(rgb) = parse_hex_color(hex) else {
                continue;
            };
            let distance: f64 = rgb
                .iter()
                .zip(target.iter())
                .map(|(a, b)| (f64::from(*a) - b).powi(2))
                .sum();
            if distance < best.1 {
                best = (name, distance);
            }
        }
        best.0
    }
}
