//! Config command - Inspect and create configuration

use crate::config::SettingsManager;
use anyhow::{Context, Result};
use cifetch_core::{ConfigManager, Settings, CONFIG_FILE_NAMES};
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Show the resolved configuration
pub async fn show(config_path: Option<&Path>) -> Result<()> {
    let (settings, source) = SettingsManager::load(config_path).context("Failed to load settings")?;

    println!("{}", "cifetch Configuration".bold().underline());
    println!();
    println!("  Source:       {}", source.to_string().dimmed());
    println!();

    println!("{}", "Service:".cyan().bold());
    println!("  Endpoint:     {}", settings.normalized_endpoint());
    println!("  API version:  {}", settings.api_version);
    println!("  Deployment:   {}", settings.deployment);
    println!("  Auth mode:    {}", settings.auth);
    println!("  API key:      {}", secret_state(settings.api_key.as_deref()));
    println!("  Bearer token: {}", secret_state(settings.bearer_token.as_deref()));
    println!(
        "  Timeouts:     {}s request, {}s fetch",
        settings.request_timeout_secs, settings.fetch_timeout_secs
    );
    println!();

    println!("{}", "Downloads:".cyan().bold());
    println!("  Directory:    {}", settings.download_dir.display());
    println!();

    match settings.validate() {
        Ok(()) => println!("{}", "✓ Configuration is valid".green()),
        Err(e) => println!("{} {}", "✗".red(), e),
    }

    Ok(())
}

/// Write a default config file in the current directory
pub async fn init(force: bool) -> Result<()> {
    let cwd = std::env::current_dir().context("Could not determine current directory")?;
    let path = init_in(&cwd, force)?;

    println!("{} Wrote {}", "✓".green(), path.display().to_string().cyan());
    println!(
        "{}",
        "  Set endpoint and a credential before running: cifetch run".dimmed()
    );
    Ok(())
}

pub fn init_in(dir: &Path, force: bool) -> Result<PathBuf> {
    let path = dir.join(CONFIG_FILE_NAMES[0]);
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite it.",
            path.display()
        );
    }

    ConfigManager::save(&Settings::default(), &path)
        .with_context(|| format!("Failed to write {:?}", path))?;
    Ok(path)
}

fn secret_state(secret: Option<&str>) -> colored::ColoredString {
    match secret {
        Some(s) if !s.is_empty() => "set".green(),
        _ => "not set".dimmed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_loadable_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();

        let path = init_in(temp_dir.path(), false).unwrap();
        assert_eq!(path, temp_dir.path().join("cifetch.config.yaml"));
        assert_eq!(ConfigManager::load(&path).unwrap(), Settings::default());

        assert!(init_in(temp_dir.path(), false).is_err());
        assert!(init_in(temp_dir.path(), true).is_ok());
    }
}
