//! Core type definitions for cifetch

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Field names that may hold the byte content of a fetched file, checked in order.
///
/// Different service versions have exposed the payload under each of these.
pub const PAYLOAD_FIELDS: &[&str] = &["content", "body", "data"];

/// A file produced inside a code-execution container, as referenced by a
/// response annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReference {
    pub file_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl FileReference {
    pub fn new(
        file_id: impl Into<String>,
        container_id: Option<String>,
        filename: Option<String>,
    ) -> Self {
        Self {
            file_id: file_id.into(),
            container_id,
            filename,
        }
    }

    /// Name used for display and, once sanitized, on disk
    pub fn display_name(&self) -> String {
        match self.filename.as_deref() {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => self.synthesized_name(),
        }
    }

    /// Fallback name for references without a usable filename
    pub fn synthesized_name(&self) -> String {
        format!("{}.bin", self.file_id)
    }

    /// `(container_id, file_id)` when both are present and non-empty
    pub fn locator(&self) -> Option<(&str, &str)> {
        let container_id = self.container_id.as_deref().filter(|c| !c.is_empty())?;
        if self.file_id.is_empty() {
            return None;
        }
        Some((container_id, self.file_id.as_str()))
    }
}

/// Container provisioning mode for the code interpreter tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContainerSpec {
    /// The service creates (or reuses) a container on demand
    Auto,
}

/// Tool declarations accepted by the response-creation call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Tool {
    CodeInterpreter { container: ContainerSpec },
}

/// Body of `POST {endpoint}responses`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseRequest {
    pub model: String,
    pub tools: Vec<Tool>,
    pub instructions: String,
    pub input: String,
}

impl ResponseRequest {
    /// Request with a single code interpreter tool on an auto-provisioned container
    pub fn code_interpreter(
        model: impl Into<String>,
        instructions: impl Into<String>,
        input: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            tools: vec![Tool::CodeInterpreter {
                container: ContainerSpec::Auto,
            }],
            instructions: instructions.into(),
            input: input.into(),
        }
    }
}

/// Identifying details of a response document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseSummary {
    pub id: Option<String>,
    pub output_text: Option<String>,
}

impl ResponseSummary {
    /// Read the id and assistant text from a response document.
    ///
    /// A top-level `output_text` wins; otherwise every `output_text` block
    /// under `output[].content[]` is concatenated.
    pub fn from_document(document: &serde_json::Value) -> Self {
        let id = document
            .get("id")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        let output_text = match document.get("output_text").and_then(|v| v.as_str()) {
            Some(text) => Some(text.to_string()),
            None => {
                let text: String = document
                    .get("output")
                    .and_then(|v| v.as_array())
                    .into_iter()
                    .flatten()
                    .filter_map(|item| item.get("content").and_then(|c| c.as_array()))
                    .flatten()
                    .filter(|block| block.get("type").and_then(|t| t.as_str()) == Some("output_text"))
                    .filter_map(|block| block.get("text").and_then(|t| t.as_str()))
                    .collect();
                if text.is_empty() {
                    None
                } else {
                    Some(text)
                }
            }
        };

        Self { id, output_text }
    }

    /// Assistant text cut to `max_chars` characters, with `...` when cut
    pub fn preview(&self, max_chars: usize) -> Option<String> {
        let text = self.output_text.as_deref()?;
        if text.chars().count() > max_chars {
            let head: String = text.chars().take(max_chars).collect();
            Some(format!("{}...", head))
        } else {
            Some(text.to_string())
        }
    }
}

/// Entry of a container file listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerFile {
    pub id: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub bytes: Option<u64>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub source: Option<String>,
}

/// `GET {endpoint}containers/{id}/files` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerFileList {
    pub data: Vec<ContainerFile>,
    #[serde(default)]
    pub has_more: bool,
}

/// Result of a file content fetch
#[derive(Debug, Clone, PartialEq)]
pub enum FilePayload {
    /// Raw body bytes
    Bytes(bytes::Bytes),
    /// Structured envelope carrying the bytes under one of [`PAYLOAD_FIELDS`]
    Document(serde_json::Value),
}

impl FilePayload {
    /// Locate the byte content, or `None` when no candidate field holds bytes.
    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            FilePayload::Bytes(bytes) => Some(bytes.to_vec()),
            FilePayload::Document(document) => PAYLOAD_FIELDS
                .iter()
                .find_map(|field| document.get(*field))
                .and_then(value_bytes),
        }
    }
}

fn value_bytes(value: &serde_json::Value) -> Option<Vec<u8>> {
    match value {
        serde_json::Value::String(s) => Some(s.as_bytes().to_vec()),
        serde_json::Value::Array(items) => items
            .iter()
            .map(|item| item.as_u64().and_then(|n| u8::try_from(n).ok()))
            .collect(),
        _ => None,
    }
}

/// Why a reference was not written to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingIdentifiers,
    FetchFailed(String),
    EmptyPayload,
    /// Both the file name and the synthesized name were already written in this batch
    DuplicateDestination(PathBuf),
    WriteFailed(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MissingIdentifiers => write!(f, "missing container_id or file_id"),
            SkipReason::FetchFailed(e) => write!(f, "fetch failed: {}", e),
            SkipReason::EmptyPayload => write!(f, "empty or missing content"),
            SkipReason::DuplicateDestination(path) => {
                write!(f, "{} already written in this batch", path.display())
            }
            SkipReason::WriteFailed(e) => write!(f, "write failed: {}", e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    pub reference: FileReference,
    pub path: PathBuf,
    pub bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub reference: FileReference,
    pub reason: SkipReason,
}

/// Outcome of one materialization batch, in input order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterializeReport {
    pub saved: Vec<SavedFile>,
    pub skipped: Vec<SkippedFile>,
}

impl MaterializeReport {
    pub fn total(&self) -> usize {
        self.saved.len() + self.skipped.len()
    }

    pub fn all_failed(&self) -> bool {
        self.saved.is_empty() && !self.skipped.is_empty()
    }
}
