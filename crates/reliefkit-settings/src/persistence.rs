//! Settings Persistence
//!
//! Resolves where the configuration lives, loads it (falling back to
//! defaults when no file has been written yet), and writes it back.

use crate::config::Config;
use crate::error::{SettingsError, SettingsResult};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "reliefkit";
const CONFIG_FILE: &str = "config.toml";

/// Settings persistence layer
#[derive(Debug, Clone, Default)]
pub struct SettingsPersistence {
    config: Config,
    path: Option<PathBuf>,
}

impl SettingsPersistence {
    /// Create new persistence layer with default config and no backing file
    pub fn new() -> Self {
        Self::default()
    }

    /// Platform configuration file: `<config_dir>/reliefkit/config.toml`
    pub fn default_path() -> SettingsResult<PathBuf> {
        let base = dirs::config_dir().ok_or_else(|| {
            SettingsError::ConfigDirectory("no configuration directory on this platform".into())
        })?;
        Ok(base.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load settings from an explicit file; the file must exist
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let config = Config::load_from_file(path)?;
        Ok(Self {
            config,
            path: Some(path.to_path_buf()),
        })
    }

    /// Load settings from `path`, or from the platform default location.
    ///
    /// An explicit path that does not exist is an error. A missing file at
    /// the default location yields the built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> SettingsResult<Self> {
        if let Some(path) = path {
            if !path.exists() {
                return Err(SettingsError::LoadError(format!(
                    "{}: file not found",
                    path.display()
                )));
            }
            return Self::load_from_file(path);
        }

        let default = Self::default_path()?;
        if default.exists() {
            Self::load_from_file(&default)
        } else {
            tracing::debug!(
                "No configuration at {}, using defaults",
                default.display()
            );
            Ok(Self {
                config: Config::default(),
                path: Some(default),
            })
        }
    }

    /// Save settings to `path`, creating parent directories as needed
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        self.config.save_to_file(path)?;
        tracing::info!("Wrote configuration to {}", path.display());
        Ok(())
    }

    /// Save settings back to the file they were loaded from
    pub fn save(&self) -> SettingsResult<()> {
        match &self.path {
            Some(path) => self.save_to_file(path),
            None => Err(SettingsError::SaveError(
                "no file associated with these settings".into(),
            )),
        }
    }

    /// Get reference to config
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get mutable reference to config
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Consume the layer and return the config
    pub fn into_config(self) -> Config {
        self.config
    }

    /// File these settings are associated with, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Validate settings
    pub fn validate(&self) -> SettingsResult<()> {
        self.config.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_missing_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let result = SettingsPersistence::load_or_default(Some(&missing));
        assert!(matches!(result, Err(SettingsError::LoadError(_))));
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut persistence = SettingsPersistence::new();
        persistence.config_mut().generator.steps_per_mm = 4.0;
        persistence.save_to_file(&path).unwrap();

        let loaded = SettingsPersistence::load_or_default(Some(&path)).unwrap();
        assert_eq!(loaded.config().generator.steps_per_mm, 4.0);
        assert_eq!(loaded.path(), Some(path.as_path()));
    }

    #[test]
    fn test_save_without_path_fails() {
        let persistence = SettingsPersistence::new();
        assert!(matches!(
            persistence.save(),
            Err(SettingsError::SaveError(_))
        ));
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[gerador]\npassos_por_mm = -1.0\n").unwrap();

        let result = SettingsPersistence::load_from_file(&path);
        assert!(matches!(
            result,
            Err(SettingsError::InvalidSetting { .. })
        ));
    }
}
