// arc2zen Settings Engine
// Loads, saves and overrides migration settings.
// Settings are stored as a JSON file; every field has a default, so partial files are valid.

use std::fs;
use std::path::{Path, PathBuf};

use crate::types::errors::SettingsError;
use crate::types::settings::MigrationSettings;

/// Trait defining the settings engine interface.
pub trait SettingsEngineTrait {
    fn load(&mut self) -> Result<MigrationSettings, SettingsError>;
    fn save(&self) -> Result<(), SettingsError>;
    fn get_settings(&self) -> &MigrationSettings;
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError>;
    fn get_config_path(&self) -> Option<&Path>;
}

/// Settings engine backed by an optional JSON file.
pub struct SettingsEngine {
    config_path: Option<PathBuf>,
    settings: MigrationSettings,
}

impl SettingsEngine {
    /// Creates a new SettingsEngine.
    ///
    /// With no path, settings live in memory only and `save` is a no-op.
    pub fn new(config_path: Option<PathBuf>) -> Self {
        Self {
            config_path,
            settings: MigrationSettings::default(),
        }
    }

    /// Rejects values that would make a run meaningless.
    fn validate(settings: &MigrationSettings) -> Result<(), SettingsError> {
        let importer = &settings.importer;
        if importer.container_icons.is_empty() {
            return Err(SettingsError::Invalid {
                key: "importer.container_icons".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if importer.container_colors.is_empty() {
            return Err(SettingsError::Invalid {
                key: "importer.container_colors".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if importer.default_container_id < 1 {
            return Err(SettingsError::Invalid {
                key: "importer.default_container_id".to_string(),
                message: format!("must be positive, got {}", importer.default_container_id),
            });
        }
        Ok(())
    }
}

impl SettingsEngineTrait for SettingsEngine {
    /// Loads settings from the JSON config file.
    ///
    /// If the file does not exist, returns default settings.
    /// If the file exists but is malformed, returns a parse error.
    fn load(&mut self) -> Result<MigrationSettings, SettingsError> {
        let Some(path) = self.config_path.as_deref() else {
            self.settings = MigrationSettings::default();
            return Ok(self.settings.clone());
        };

        if !path.exists() {
            self.settings = MigrationSettings::default();
            return Ok(self.settings.clone());
        }

        let content = fs::read_to_string(path)?;
        let settings: MigrationSettings = serde_json::from_str(&content)?;
        Self::validate(&settings)?;

        self.settings = settings;
        Ok(self.settings.clone())
    }

    /// Saves the current settings to the JSON config file.
    ///
    /// Creates parent directories if they don't exist.
    fn save(&self) -> Result<(), SettingsError> {
        let Some(path) = self.config_path.as_deref() else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.settings)?;
        fs::write(path, json)?;
        Ok(())
    }

    fn get_settings(&self) -> &MigrationSettings {
        &self.settings
    }

    /// Overrides one setting by dot-notation key path, in memory.
    ///
    /// # Examples
    /// - `"extractor.min_score"` → updates `settings.extractor.min_score`
    /// - `"importer.update_session"` → updates `settings.importer.update_session`
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError> {
        if key.is_empty() {
            return Err(SettingsError::Invalid {
                key: key.to_string(),
                message: "key cannot be empty".to_string(),
            });
        }
        let not_found = || SettingsError::Invalid {
            key: key.to_string(),
            message: "not found in settings".to_string(),
        };

        let parts: Vec<&str> = key.split('.').collect();
        let mut json_value = serde_json::to_value(&self.settings)?;

        {
            let (last, parents) = parts.split_last().ok_or_else(not_found)?;
            let mut current = &mut json_value;
            for part in parents {
                current = current.get_mut(*part).ok_or_else(not_found)?;
            }
            match current {
                serde_json::Value::Object(map) if map.contains_key(*last) => {
                    map.insert(last.to_string(), value);
                }
                _ => return Err(not_found()),
            }
        }

        // Deserialize back to validate the new value
        let new_settings: MigrationSettings =
            serde_json::from_value(json_value).map_err(|e| SettingsError::Invalid {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        Self::validate(&new_settings)?;

        self.settings = new_settings;
        Ok(())
    }

    fn get_config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}

/// Parses `KEY=VALUE` overrides as given on the command line. The value is
/// read as JSON when it parses, else taken as a plain string.
pub fn parse_setting_arg(arg: &str) -> Result<(String, serde_json::Value), String> {
    let (key, raw) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", arg))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty setting key in '{}'", arg));
    }
    let value = serde_json::from_str(raw.trim())
        .unwrap_or_else(|_| serde_json::Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}
