//! Configuration management for cifetch

use crate::error::{CifetchError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration file names to search for
pub const CONFIG_FILE_NAMES: &[&str] = &[
    "cifetch.config.yaml",
    "cifetch.config.yml",
    "cifetch.config.json",
];

/// Placeholder left in the default endpoint until the user fills it in
pub const ENDPOINT_PLACEHOLDER: &str = "<resource-name>";

pub const ENV_ENDPOINT: &str = "AZURE_OPENAI_ENDPOINT";
pub const ENV_API_KEY: &str = "AZURE_OPENAI_API_KEY";
pub const ENV_AD_TOKEN: &str = "AZURE_OPENAI_AD_TOKEN";
pub const ENV_DEPLOYMENT: &str = "AZURE_OPENAI_DEPLOYMENT";
pub const ENV_API_VERSION: &str = "AZURE_OPENAI_API_VERSION";

/// How requests are authenticated
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// Microsoft Entra ID bearer token
    #[default]
    EntraId,
    /// `api-key` header
    ApiKey,
}

impl AuthMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::EntraId => "entra_id",
            AuthMode::ApiKey => "api_key",
        }
    }
}

impl std::fmt::Display for AuthMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Service and download settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub endpoint: String,
    pub api_version: String,
    pub deployment: String,
    pub auth: AuthMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bearer_token: Option<String>,
    pub download_dir: PathBuf,
    pub instructions: String,
    pub prompt: String,
    pub request_timeout_secs: u64,
    pub fetch_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: format!("https://{}.openai.azure.com/openai/v1/", ENDPOINT_PLACEHOLDER),
            api_version: "preview".to_string(),
            deployment: "gpt-4o".to_string(),
            auth: AuthMode::default(),
            api_key: None,
            bearer_token: None,
            download_dir: PathBuf::from("./downloads"),
            instructions: "You are a personal assistant that writes and runs code using the Python tool to answer the question.".to_string(),
            prompt: "Please use the Python tool to create a file called test.txt and write the word 'hello world' to it.".to_string(),
            request_timeout_secs: 60,
            fetch_timeout_secs: 30,
        }
    }
}

impl Settings {
    /// Apply environment overrides through `lookup`.
    ///
    /// An API key from the environment also switches authentication to key mode.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(endpoint) = get(ENV_ENDPOINT) {
            self.endpoint = endpoint;
        }
        if let Some(deployment) = get(ENV_DEPLOYMENT) {
            self.deployment = deployment;
        }
        if let Some(api_version) = get(ENV_API_VERSION) {
            self.api_version = api_version;
        }
        if let Some(token) = get(ENV_AD_TOKEN) {
            self.bearer_token = Some(token);
        }
        if let Some(key) = get(ENV_API_KEY) {
            self.api_key = Some(key);
            self.auth = AuthMode::ApiKey;
        }
    }

    /// Apply process environment overrides
    pub fn apply_process_env(&mut self) {
        self.apply_env(|key| std::env::var(key).ok());
    }

    /// Endpoint with a guaranteed trailing slash
    pub fn normalized_endpoint(&self) -> String {
        let endpoint = self.endpoint.trim();
        if endpoint.ends_with('/') {
            endpoint.to_string()
        } else {
            format!("{}/", endpoint)
        }
    }

    /// Credential for the selected auth mode
    pub fn credential(&self) -> Option<&str> {
        let credential = match self.auth {
            AuthMode::ApiKey => self.api_key.as_deref(),
            AuthMode::EntraId => self.bearer_token.as_deref(),
        };
        credential.filter(|c| !c.trim().is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Check the settings are usable for talking to the service
    pub fn validate(&self) -> Result<()> {
        let endpoint = self.endpoint.trim();
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(CifetchError::InvalidConfig(format!(
                "endpoint must start with http:// or https://, got '{}'",
                endpoint
            )));
        }
        if endpoint.contains(ENDPOINT_PLACEHOLDER) {
            return Err(CifetchError::InvalidConfig(format!(
                "endpoint still contains the {} placeholder; set it in the config file or {}",
                ENDPOINT_PLACEHOLDER, ENV_ENDPOINT
            )));
        }
        if self.deployment.trim().is_empty() {
            return Err(CifetchError::InvalidConfig(
                "deployment must not be empty".to_string(),
            ));
        }
        if self.credential().is_none() {
            let hint = match self.auth {
                AuthMode::ApiKey => ENV_API_KEY,
                AuthMode::EntraId => ENV_AD_TOKEN,
            };
            return Err(CifetchError::InvalidConfig(format!(
                "no credential for auth mode '{}'; set it in the config file or {}",
                self.auth, hint
            )));
        }
        if self.request_timeout_secs == 0 || self.fetch_timeout_secs == 0 {
            return Err(CifetchError::InvalidConfig(
                "timeouts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Loads and saves settings files
pub struct ConfigManager;

impl ConfigManager {
    /// Find configuration file in a directory
    pub fn find_config_file(dir: &Path) -> Option<PathBuf> {
        for name in CONFIG_FILE_NAMES {
            let path = dir.join(name);
            if path.exists() {
                return Some(path);
            }
        }
        None
    }

    /// Load settings from a file; JSON by extension, YAML otherwise
    pub fn load(config_path: &Path) -> Result<Settings> {
        let content = std::fs::read_to_string(config_path)?;
        let settings = if is_json(config_path) {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };
        Ok(settings)
    }

    /// Load settings from a directory (searches for config files)
    pub fn load_from_directory(dir: &Path) -> Result<(Settings, PathBuf)> {
        let config_path = Self::find_config_file(dir)
            .ok_or_else(|| CifetchError::ConfigNotFound(dir.display().to_string()))?;

        let settings = Self::load(&config_path)?;
        Ok((settings, config_path))
    }

    /// Save settings to a file
    pub fn save(settings: &Settings, config_path: &Path) -> Result<()> {
        let content = if is_json(config_path) {
            serde_json::to_string_pretty(settings)?
        } else {
            serde_yaml::to_string(settings)?
        };

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(config_path, content)?;

        Ok(())
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().map(|e| e == "json").unwrap_or(false)
}
