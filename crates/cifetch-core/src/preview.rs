//! Quick look at what ended up in the download directory

use crate::error::Result;
use std::path::Path;

const TEXT_EXTENSIONS: &[&str] = &["txt", "csv", "md"];
const MAX_TEXT_PREVIEW_BYTES: u64 = 64 * 1024;
const MAX_LINE_CHARS: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewDetail {
    FirstLine(String),
    Size(u64),
    Unreadable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadPreview {
    pub name: String,
    pub detail: PreviewDetail,
}

impl std::fmt::Display for DownloadPreview {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.detail {
            PreviewDetail::FirstLine(line) => write!(f, "{}: '{}'", self.name, line),
            PreviewDetail::Size(size) => write!(f, "{}: {} bytes", self.name, size),
            PreviewDetail::Unreadable(e) => write!(f, "Could not read {}: {}", self.name, e),
        }
    }
}

/// Describe every entry in `dir`, sorted by name.
///
/// Small text files show their first line; everything else shows its size.
pub async fn preview_directory(dir: &Path) -> Result<Vec<DownloadPreview>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut previews = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().to_string();
        let detail = match describe(&entry.path()).await {
            Ok(detail) => detail,
            Err(e) => PreviewDetail::Unreadable(e.to_string()),
        };
        previews.push(DownloadPreview { name, detail });
    }

    previews.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(previews)
}

async fn describe(path: &Path) -> std::io::Result<PreviewDetail> {
    let metadata = tokio::fs::metadata(path).await?;
    let is_text = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| TEXT_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false);

    if metadata.is_file() && is_text && metadata.len() < MAX_TEXT_PREVIEW_BYTES {
        let raw = tokio::fs::read(path).await?;
        let text = String::from_utf8_lossy(&raw);
        let first_line: String = text
            .lines()
            .next()
            .unwrap_or("")
            .chars()
            .take(MAX_LINE_CHARS)
            .collect();
        Ok(PreviewDetail::FirstLine(first_line))
    } else {
        Ok(PreviewDetail::Size(metadata.len()))
    }
}
