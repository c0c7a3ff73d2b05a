//! Download referenced container files to a local directory

use crate::error::Result;
use crate::types::{FilePayload, FileReference, MaterializeReport, SavedFile, SkipReason, SkippedFile};
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Source of container file content
///
/// Implemented by the HTTP client; tests plug in in-memory stubs.
#[async_trait]
pub trait ContainerFileSource: Send + Sync {
    /// Fetch the content of `file_id` from `container_id`
    async fn retrieve_content(&self, container_id: &str, file_id: &str) -> Result<FilePayload>;
}

/// Writes fetched files into a single download directory
pub struct Materializer {
    download_dir: PathBuf,
}

impl Materializer {
    pub fn new(download_dir: impl Into<PathBuf>) -> Self {
        Self {
            download_dir: download_dir.into(),
        }
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Local path a reference is written to. Always directly inside the download directory.
    pub fn destination(&self, reference: &FileReference) -> PathBuf {
        let display = reference.display_name();
        let name = match sanitize_file_name(&display) {
            Some(name) => name.to_string(),
            None => reference.synthesized_name(),
        };
        self.download_dir.join(name)
    }

    /// Fetch and write every reference in order.
    ///
    /// Per-reference failures are recorded in the report and never stop the
    /// batch. Only a failure to create the download directory is returned as
    /// an error. No two references in one batch write the same path: a name
    /// already written falls back to the synthesized name.
    pub async fn materialize(
        &self,
        source: &dyn ContainerFileSource,
        references: &[FileReference],
    ) -> Result<MaterializeReport> {
        tokio::fs::create_dir_all(&self.download_dir).await?;

        let mut report = MaterializeReport::default();
        let mut written: HashSet<PathBuf> = HashSet::new();
        for reference in references {
            match self.materialize_one(source, reference, &written).await {
                Ok(saved) => {
                    written.insert(saved.path.clone());
                    info!(
                        "Saved {} ({} bytes) to {}",
                        reference.file_id,
                        saved.bytes,
                        saved.path.display()
                    );
                    report.saved.push(saved);
                }
                Err(reason) => {
                    warn!("Skipping {} ({}): {}", reference.file_id, reference.display_name(), reason);
                    report.skipped.push(SkippedFile {
                        reference: reference.clone(),
                        reason,
                    });
                }
            }
        }

        Ok(report)
    }

    async fn materialize_one(
        &self,
        source: &dyn ContainerFileSource,
        reference: &FileReference,
        written: &HashSet<PathBuf>,
    ) -> std::result::Result<SavedFile, SkipReason> {
        let (container_id, file_id) = reference.locator().ok_or(SkipReason::MissingIdentifiers)?;
        let path = self.unused_destination(reference, written)?;

        debug!("Fetching {} from container {}", file_id, container_id);
        let payload = source
            .retrieve_content(container_id, file_id)
            .await
            .map_err(|e| SkipReason::FetchFailed(e.to_string()))?;

        let data = payload
            .into_bytes()
            .filter(|data| !data.is_empty())
            .ok_or(SkipReason::EmptyPayload)?;

        tokio::fs::write(&path, &data)
            .await
            .map_err(|e| SkipReason::WriteFailed(e.to_string()))?;

        Ok(SavedFile {
            reference: reference.clone(),
            path,
            bytes: data.len(),
        })
    }

    fn unused_destination(
        &self,
        reference: &FileReference,
        written: &HashSet<PathBuf>,
    ) -> std::result::Result<PathBuf, SkipReason> {
        let path = self.destination(reference);
        if !written.contains(&path) {
            return Ok(path);
        }

        let fallback = self.download_dir.join(reference.synthesized_name());
        if written.contains(&fallback) {
            return Err(SkipReason::DuplicateDestination(path));
        }
        debug!(
            "{} is already written in this batch, saving {} as {}",
            path.display(),
            reference.file_id,
            fallback.display()
        );
        Ok(fallback)
    }
}

/// Reduce a display name to its final path component.
///
/// Both `/` and `\` count as separators. Returns `None` when nothing usable
/// is left (empty, `.` or `..`).
pub fn sanitize_file_name(name: &str) -> Option<&str> {
    let base = name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(name)
        .trim();
    match base {
        "" | "." | ".." => None,
        base => Some(base),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CifetchError;
    use crate::extractor::collect_file_references;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubSource {
        files: HashMap<(String, String), FilePayload>,
        calls: Mutex<Vec<String>>,
    }

    impl StubSource {
        fn with(mut self, container_id: &str, file_id: &str, payload: FilePayload) -> Self {
            self.files
                .insert((container_id.to_string(), file_id.to_string()), payload);
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ContainerFileSource for StubSource {
        async fn retrieve_content(&self, container_id: &str, file_id: &str) -> Result<FilePayload> {
            self.calls.lock().unwrap().push(file_id.to_string());
            self.files
                .get(&(container_id.to_string(), file_id.to_string()))
                .cloned()
                .ok_or_else(|| CifetchError::Api {
                    status: 404,
                    message: format!("{} not found", file_id),
                })
        }
    }

    fn raw(data: &'static [u8]) -> FilePayload {
        FilePayload::Bytes(bytes::Bytes::from_static(data))
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), Some("passwd"));
        assert_eq!(sanitize_file_name("/mnt/data/plot.png"), Some("plot.png"));
        assert_eq!(sanitize_file_name("..\\..\\boot.ini"), Some("boot.ini"));
        assert_eq!(sanitize_file_name("test.txt"), Some("test.txt"));
        assert_eq!(sanitize_file_name("dir/"), None);
        assert_eq!(sanitize_file_name(".."), None);
        assert_eq!(sanitize_file_name(""), None);
    }

    #[test]
    fn test_destination_never_escapes() {
        let materializer = Materializer::new("/tmp/downloads");
        let traversal = FileReference::new("f1", Some("c1".into()), Some("../../etc/passwd".into()));
        assert_eq!(
            materializer.destination(&traversal),
            PathBuf::from("/tmp/downloads/passwd")
        );

        let dots = FileReference::new("f2", Some("c1".into()), Some("..".into()));
        assert_eq!(
            materializer.destination(&dots),
            PathBuf::from("/tmp/downloads/f2.bin")
        );
    }

    #[tokio::test]
    async fn test_end_to_end_single_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let download_dir = temp_dir.path().join("downloads");

        let doc: serde_json::Value = serde_json::from_str(
            r#"{"output":[{"content":[{"annotations":[{"file_id":"f1","container_id":"c1","filename":"test.txt"}]}]}]}"#,
        )
        .unwrap();
        let refs = collect_file_references(&doc);
        let source = StubSource::default().with("c1", "f1", raw(b"hello world"));

        let report = Materializer::new(&download_dir)
            .materialize(&source, &refs)
            .await
            .unwrap();

        assert_eq!(report.saved.len(), 1);
        assert!(report.skipped.is_empty());
        let written = std::fs::read_to_string(download_dir.join("test.txt")).unwrap();
        assert_eq!(written, "hello world");
        assert_eq!(std::fs::read_dir(&download_dir).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_traversal_name_stays_in_download_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let download_dir = temp_dir.path().join("nested").join("downloads");
        let refs = vec![FileReference::new(
            "f1",
            Some("c1".into()),
            Some("../../etc/passwd".into()),
        )];
        let source = StubSource::default().with("c1", "f1", raw(b"root:x:0:0"));

        let report = Materializer::new(&download_dir)
            .materialize(&source, &refs)
            .await
            .unwrap();

        assert_eq!(report.saved[0].path, download_dir.join("passwd"));
        assert!(download_dir.join("passwd").exists());
        assert!(!temp_dir.path().join("etc").exists());
    }

    #[tokio::test]
    async fn test_missing_identifiers_skipped_and_batch_continues() {
        let temp_dir = tempfile::tempdir().unwrap();
        let refs = vec![
            FileReference::new("f0", None, Some("orphan.txt".into())),
            FileReference::new("", Some("c1".into()), Some("blank.txt".into())),
            FileReference::new("f1", Some("c1".into()), Some("good.txt".into())),
        ];
        let source = StubSource::default().with("c1", "f1", raw(b"ok"));

        let report = Materializer::new(temp_dir.path())
            .materialize(&source, &refs)
            .await
            .unwrap();

        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.skipped[0].reason, SkipReason::MissingIdentifiers);
        assert_eq!(report.skipped[1].reason, SkipReason::MissingIdentifiers);
        assert_eq!(report.saved.len(), 1);
        assert_eq!(source.calls(), vec!["f1".to_string()]);
        assert!(temp_dir.path().join("good.txt").exists());
    }

    #[tokio::test]
    async fn test_empty_payload_is_failure_without_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let refs = vec![
            FileReference::new("f1", Some("c1".into()), Some("empty.txt".into())),
            FileReference::new("f2", Some("c1".into()), Some("nobytes.txt".into())),
        ];
        let source = StubSource::default()
            .with("c1", "f1", raw(b""))
            .with("c1", "f2", FilePayload::Document(serde_json::json!({"id": "f2"})));

        let report = Materializer::new(temp_dir.path())
            .materialize(&source, &refs)
            .await
            .unwrap();

        assert!(report.saved.is_empty());
        assert!(report.all_failed());
        assert!(report
            .skipped
            .iter()
            .all(|s| s.reason == SkipReason::EmptyPayload));
        assert!(!temp_dir.path().join("empty.txt").exists());
        assert!(!temp_dir.path().join("nobytes.txt").exists());
    }

    #[tokio::test]
    async fn test_fetch_failure_does_not_abort() {
        let temp_dir = tempfile::tempdir().unwrap();
        let refs = vec![
            FileReference::new("missing", Some("c1".into()), Some("a.txt".into())),
            FileReference::new("f2", Some("c1".into()), None),
        ];
        let source = StubSource::default().with(
            "c1",
            "f2",
            FilePayload::Document(serde_json::json!({"body": "from body"})),
        );

        let report = Materializer::new(temp_dir.path())
            .materialize(&source, &refs)
            .await
            .unwrap();

        assert_eq!(report.total(), 2);
        assert!(matches!(report.skipped[0].reason, SkipReason::FetchFailed(_)));
        assert_eq!(report.saved[0].path, temp_dir.path().join("f2.bin"));
        assert_eq!(
            std::fs::read_to_string(temp_dir.path().join("f2.bin")).unwrap(),
            "from body"
        );
    }

    #[tokio::test]
    async fn test_write_failure_is_reported() {
        let temp_dir = tempfile::tempdir().unwrap();
        // A directory where the file should go makes the write fail
        std::fs::create_dir(temp_dir.path().join("taken")).unwrap();
        let refs = vec![
            FileReference::new("f1", Some("c1".into()), Some("taken".into())),
            FileReference::new("f2", Some("c1".into()), Some("free.txt".into())),
        ];
        let source = StubSource::default()
            .with("c1", "f1", raw(b"one"))
            .with("c1", "f2", raw(b"two"));

        let report = Materializer::new(temp_dir.path())
            .materialize(&source, &refs)
            .await
            .unwrap();

        assert!(matches!(report.skipped[0].reason, SkipReason::WriteFailed(_)));
        assert_eq!(report.saved.len(), 1);
        assert_eq!(report.saved[0].bytes, 3);
    }

    #[tokio::test]
    async fn test_shared_basename_does_not_overwrite() {
        let temp_dir = tempfile::tempdir().unwrap();
        let refs = vec![
            FileReference::new("missing", Some("c1".into()), Some("x.txt".into())),
            FileReference::new("f1", Some("c1".into()), Some("a/x.txt".into())),
            FileReference::new("f2", Some("c1".into()), Some("b/x.txt".into())),
            FileReference::new("f2", Some("c2".into()), Some("c/x.txt".into())),
        ];
        let source = StubSource::default()
            .with("c1", "f1", raw(b"first"))
            .with("c1", "f2", raw(b"second"))
            .with("c2", "f2", raw(b"third"));

        let report = Materializer::new(temp_dir.path())
            .materialize(&source, &refs)
            .await
            .unwrap();

        let saved: Vec<PathBuf> = report.saved.iter().map(|s| s.path.clone()).collect();
        assert_eq!(
            saved,
            vec![temp_dir.path().join("x.txt"), temp_dir.path().join("f2.bin")]
        );
        assert_eq!(std::fs::read(temp_dir.path().join("x.txt")).unwrap(), b"first");
        assert_eq!(std::fs::read(temp_dir.path().join("f2.bin")).unwrap(), b"second");

        assert_eq!(report.skipped.len(), 2);
        assert!(matches!(report.skipped[0].reason, SkipReason::FetchFailed(_)));
        assert_eq!(
            report.skipped[1].reason,
            SkipReason::DuplicateDestination(temp_dir.path().join("x.txt"))
        );
        // The duplicate is refused before any fetch.
        assert_eq!(source.calls(), vec!["missing", "f1", "f2"]);
    }

    #[tokio::test]
    async fn test_unusable_download_dir_is_fatal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let blocker = temp_dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();

        let result = Materializer::new(blocker.join("downloads"))
            .materialize(&StubSource::default(), &[])
            .await;

        assert!(matches!(result, Err(CifetchError::Io(_))));
    }
}
