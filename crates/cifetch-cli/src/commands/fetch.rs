//! Fetch command - download one container file

use crate::api::Client;
use crate::commands::{load_service_settings, print_report};
use anyhow::{Context, Result};
use cifetch_core::{FileReference, MaterializeReport, Materializer, Settings};
use std::path::{Path, PathBuf};

pub struct FetchOptions {
    pub container_id: String,
    pub file_id: String,
    pub name: Option<String>,
    pub download_dir: Option<PathBuf>,
}

pub async fn execute(config_path: Option<&Path>, options: FetchOptions) -> Result<()> {
    let settings = load_service_settings(config_path)?;
    let report = fetch_with_settings(&settings, options).await?;
    print_report(&report);

    if let Some(skipped) = report.skipped.first() {
        anyhow::bail!(
            "Failed to download {}: {}",
            skipped.reference.file_id,
            skipped.reason
        );
    }
    Ok(())
}

pub async fn fetch_with_settings(
    settings: &Settings,
    options: FetchOptions,
) -> Result<MaterializeReport> {
    let client = Client::from_settings(settings)?;
    let download_dir = options
        .download_dir
        .unwrap_or_else(|| settings.download_dir.clone());

    let reference = FileReference::new(options.file_id, Some(options.container_id), options.name);
    Materializer::new(&download_dir)
        .materialize(&client, std::slice::from_ref(&reference))
        .await
        .with_context(|| format!("Failed to prepare download directory {}", download_dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cifetch_core::{AuthMode, SkipReason};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_single_file() {
        let mock_server = MockServer::start().await;
        let temp_dir = tempfile::tempdir().unwrap();

        Mock::given(method("GET"))
            .and(path("/openai/v1/containers/c1/files/f1/content"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"a,b\n1,2\n".to_vec()))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/openai/v1/containers/c1/files/empty/content"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let settings = Settings {
            endpoint: format!("{}/openai/v1/", mock_server.uri()),
            auth: AuthMode::EntraId,
            bearer_token: Some("token".to_string()),
            download_dir: temp_dir.path().to_path_buf(),
            ..Settings::default()
        };

        let report = fetch_with_settings(
            &settings,
            FetchOptions {
                container_id: "c1".to_string(),
                file_id: "f1".to_string(),
                name: Some("sub/data.csv".to_string()),
                download_dir: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(report.saved[0].path, temp_dir.path().join("data.csv"));

        let report = fetch_with_settings(
            &settings,
            FetchOptions {
                container_id: "c1".to_string(),
                file_id: "empty".to_string(),
                name: None,
                download_dir: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(report.skipped[0].reason, SkipReason::EmptyPayload);
        assert!(!temp_dir.path().join("empty.bin").exists());
    }
}
