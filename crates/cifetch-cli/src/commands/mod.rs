//! CLI command implementations

pub mod config;
pub mod fetch;
pub mod files;
pub mod run;
pub mod scan;
pub mod verify;

use anyhow::Result;
use cifetch_core::{MaterializeReport, Settings};
use colored::Colorize;
use std::path::Path;

pub(crate) fn print_step(step: usize, total: usize, message: &str) {
    println!("{} {}", format!("[{}/{}]", step, total).blue().bold(), message);
}

pub(crate) fn print_kv(key: &str, value: impl std::fmt::Display) {
    println!("  - {}: {}", key, value);
}

/// Load settings and make sure they can reach the service
pub(crate) fn load_service_settings(config_path: Option<&Path>) -> Result<Settings> {
    let (settings, source) = crate::config::SettingsManager::load(config_path)?;
    tracing::debug!("Using settings from {}", source);
    settings.validate()?;
    Ok(settings)
}

pub(crate) fn print_report(report: &MaterializeReport) {
    for saved in &report.saved {
        let path = saved
            .path
            .canonicalize()
            .unwrap_or_else(|_| saved.path.clone());
        println!(
            "   {} Saved: {}  ({} bytes)",
            "✓".green(),
            path.display(),
            saved.bytes
        );
    }
    for skipped in &report.skipped {
        println!(
            "   {} Skipped {} ({}): {}",
            "✗".red(),
            skipped.reference.display_name(),
            skipped.reference.file_id,
            skipped.reason
        );
    }
}
