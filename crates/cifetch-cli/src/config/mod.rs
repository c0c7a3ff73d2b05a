//! Settings discovery

use anyhow::{Context, Result};
use cifetch_core::{ConfigManager, Settings};
use std::path::{Path, PathBuf};

/// Where the resolved settings came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsSource {
    File(PathBuf),
    Defaults,
}

impl std::fmt::Display for SettingsSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsSource::File(path) => write!(f, "{}", path.display()),
            SettingsSource::Defaults => write!(f, "built-in defaults"),
        }
    }
}

pub struct SettingsManager;

impl SettingsManager {
    /// Get the cifetch home directory (~/.cifetch)
    pub fn cifetch_home() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("CIFETCH_HOME") {
            return Ok(PathBuf::from(path));
        }
        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(".cifetch"))
    }

    /// Get the user-level settings file path
    pub fn settings_path() -> Result<PathBuf> {
        Ok(Self::cifetch_home()?.join("settings.json"))
    }

    /// Resolve settings and apply environment overrides
    pub fn load(explicit: Option<&Path>) -> Result<(Settings, SettingsSource)> {
        let cwd = std::env::current_dir().context("Could not determine current directory")?;
        let user_settings = Self::settings_path().ok();

        let (mut settings, source) = Self::resolve(explicit, &cwd, user_settings.as_deref())?;
        settings.apply_process_env();
        Ok((settings, source))
    }

    /// Pick the settings file without looking at the environment.
    ///
    /// Order: explicit path, a config file in `cwd`, the user settings file,
    /// then defaults. An explicit path must exist.
    pub fn resolve(
        explicit: Option<&Path>,
        cwd: &Path,
        user_settings: Option<&Path>,
    ) -> Result<(Settings, SettingsSource)> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => ConfigManager::find_config_file(cwd)
                .or_else(|| user_settings.filter(|p| p.exists()).map(Path::to_path_buf)),
        };

        match path {
            Some(path) => {
                let settings = ConfigManager::load(&path)
                    .with_context(|| format!("Failed to load settings from {:?}", path))?;
                Ok((settings, SettingsSource::File(path)))
            }
            None => Ok((Settings::default(), SettingsSource::Defaults)),
        }
    }
}
