use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level migration settings container.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MigrationSettings {
    #[serde(default)]
    pub extractor: ExtractorSettings,
    #[serde(default)]
    pub importer: ImportSettings,
}

/// Source-side extraction and essential-tab heuristics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExtractorSettings {
    /// Profile name used for `profile.default` and the personal space.
    pub default_profile: String,
    /// A space with this name and no profile maps to `default_profile`.
    pub personal_space_name: String,
    pub min_score: u32,
    pub strong_match_weight: u32,
    pub loose_match_weight: u32,
    /// Shorter space names never take part in scoring.
    pub min_space_name_len: usize,
    /// Space names (case-insensitive) excluded from scoring.
    pub heuristic_excluded_spaces: Vec<String>,
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self {
            default_profile: "Default".to_string(),
            personal_space_name: "Personal".to_string(),
            min_score: 4,
            strong_match_weight: 3,
            loose_match_weight: 1,
            min_space_name_len: 3,
            heuristic_excluded_spaces: Vec::new(),
        }
    }
}

/// Destination-side import behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ImportSettings {
    /// Container used when a space has no mapping entry.
    pub default_container_id: i64,
    pub container_icons: Vec<String>,
    pub container_colors: Vec<String>,
    pub theme: ThemeCalibration,
    /// Where `places.sqlite` backups go. Defaults to `<profile>/arc2zen-backups`.
    pub backup_dir: Option<PathBuf>,
    /// Inject imported pins into `sessionstore.jsonlz4`.
    pub update_session: bool,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            default_container_id: 1,
            container_icons: Self::default_icons(),
            container_colors: Self::default_colors(),
            theme: ThemeCalibration::default(),
            backup_dir: None,
            update_session: true,
        }
    }
}

impl ImportSettings {
    pub fn default_icons() -> Vec<String> {
        [
            "fingerprint",
            "briefcase",
            "dollar",
            "cart",
            "vacation",
            "gift",
            "food",
            "fruit",
            "pet",
            "tree",
            "chill",
            "fence",
            "circle",
            "user",
            "lock",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    pub fn default_colors() -> Vec<String> {
        [
            "blue",
            "turquoise",
            "green",
            "yellow",
            "orange",
            "red",
            "pink",
            "purple",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }
}

/// Linear map from a unit RGB color to the gradient color stop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ThemeCalibration {
    pub base: [f64; 3],
    pub scale: [f64; 3],
    pub lightness: String,
    pub opacity: f64,
}

impl Default for ThemeCalibration {
    fn default() -> Self {
        Self {
            base: [185.0, 225.0, 150.0],
            scale: [72.0, 25.0, 170.0],
            lightness: "75".to_string(),
            opacity: 1.0,
        }
    }
}
