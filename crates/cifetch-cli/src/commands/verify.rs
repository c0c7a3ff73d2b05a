//! Verify command - show what is in the download directory

use anyhow::Result;
use cifetch_core::{preview_directory, PreviewDetail};
use colored::Colorize;
use std::path::{Path, PathBuf};

pub async fn execute(config_path: Option<&Path>, download_dir: Option<PathBuf>) -> Result<()> {
    let dir = match download_dir {
        Some(dir) => dir,
        None => crate::config::SettingsManager::load(config_path)?.0.download_dir,
    };

    println!(
        "{}",
        format!("Contents of {}", dir.display()).blue().bold()
    );
    print_previews(&dir).await;
    Ok(())
}

pub(crate) async fn print_previews(dir: &Path) {
    match preview_directory(dir).await {
        Ok(previews) if previews.is_empty() => {
            println!("   {}", "(empty)".dimmed());
        }
        Ok(previews) => {
            for preview in previews {
                match &preview.detail {
                    PreviewDetail::Unreadable(_) => {
                        println!("   {} {}", "⚠".yellow(), preview);
                    }
                    _ => println!("   {}", preview),
                }
            }
        }
        Err(e) => {
            println!(
                "   {} Could not read {}: {}",
                "⚠".yellow(),
                dir.display(),
                e
            );
        }
    }
}
