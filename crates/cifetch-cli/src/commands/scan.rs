//! Scan command - list file references in a saved response document

use anyhow::{Context, Result};
use cifetch_core::{collect_file_references, reference_table, FileReference};
use colored::Colorize;
use std::path::Path;
use tokio::io::AsyncReadExt;

pub async fn execute(path: &Path, json: bool) -> Result<()> {
    let references = scan_file(path).await?;
    if references.is_empty() {
        anyhow::bail!("No files found in annotations");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&references)?);
    } else {
        println!(
            "{}",
            format!("Found {} file reference(s)", references.len())
                .green()
                .bold()
        );
        println!("{}", reference_table(&references));
    }

    Ok(())
}

/// Read a response document from `path` (`-` for stdin) and extract its references
pub async fn scan_file(path: &Path) -> Result<Vec<FileReference>> {
    let content = if path == Path::new("-") {
        let mut buffer = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buffer)
            .await
            .context("Failed to read response from stdin")?;
        buffer
    } else {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read response from {:?}", path))?
    };

    let document: serde_json::Value =
        serde_json::from_str(&content).context("Failed to parse response document")?;
    Ok(collect_file_references(&document))
}
