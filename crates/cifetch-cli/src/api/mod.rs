//! API client for the Azure OpenAI Responses and Containers endpoints

use anyhow::{Context, Result};
use async_trait::async_trait;
use cifetch_core::{
    AuthMode, CifetchError, ContainerFile, ContainerFileList, ContainerFileSource, FilePayload,
    ResponseRequest, Settings,
};
use reqwest::{Client as ReqwestClient, RequestBuilder, Response, Url};
use std::time::Duration;
use tracing::{debug, warn};

enum Credential {
    ApiKey(String),
    Bearer(String),
}

pub struct Client {
    http: ReqwestClient,
    base_url: Url,
    api_version: String,
    credential: Credential,
    request_timeout: Duration,
    fetch_timeout: Duration,
}

impl Client {
    /// Create client from settings. The selected auth mode must have a credential.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let secret = settings
            .credential()
            .with_context(|| format!("No credential configured for auth mode '{}'", settings.auth))?
            .to_string();

        let credential = match settings.auth {
            AuthMode::ApiKey => Credential::ApiKey(secret),
            AuthMode::EntraId => Credential::Bearer(secret),
        };

        let endpoint = settings.normalized_endpoint();
        let base_url = Url::parse(&endpoint)
            .with_context(|| format!("Invalid endpoint URL: {}", endpoint))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Endpoint URL cannot take a path: {}", endpoint);
        }

        Ok(Self {
            http: ReqwestClient::new(),
            base_url,
            api_version: settings.api_version.clone(),
            credential,
            request_timeout: settings.request_timeout(),
            fetch_timeout: settings.fetch_timeout(),
        })
    }

    /// Endpoint URL with `segments` appended, each percent-encoded as one path segment.
    ///
    /// Ids come from response documents, so `/`, `?` and `#` inside them never
    /// change the path shape, and empty, `.` and `..` ids are refused.
    fn url(&self, segments: &[&str]) -> std::result::Result<Url, CifetchError> {
        if let Some(bad) = segments
            .iter()
            .find(|s| matches!(**s, "" | "." | ".."))
        {
            return Err(CifetchError::InvalidIdentifier(bad.to_string()));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                CifetchError::InvalidConfig(format!("endpoint {} cannot take a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.query(&[("api-version", self.api_version.as_str())]);
        match &self.credential {
            Credential::ApiKey(key) => builder.header("api-key", key),
            Credential::Bearer(token) => builder.bearer_auth(token),
        }
    }

    /// Create a response and return the raw document
    pub async fn create_response(&self, request: &ResponseRequest) -> Result<serde_json::Value> {
        let url = self.url(&["responses"])?;
        debug!("POST {}", url);

        let response = self
            .authorize(self.http.post(url))
            .timeout(self.request_timeout)
            .json(request)
            .send()
            .await
            .context("Failed to send response request")?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            anyhow::bail!(
                "Responses API failed: {} - {}",
                status.as_u16(),
                error_message(&body)
            );
        }

        serde_json::from_str(&body).context("Failed to parse response document")
    }

    /// List every file stored in a container, following `has_more` pages
    pub async fn list_container_files(&self, container_id: &str) -> Result<Vec<ContainerFile>> {
        let mut files: Vec<ContainerFile> = Vec::new();
        loop {
            let after = files.last().map(|f| f.id.clone());
            let page = self.list_container_files_page(container_id, after.as_deref()).await?;
            let page_len = page.data.len();
            files.extend(page.data);

            if !page.has_more {
                break;
            }
            if page_len == 0 {
                warn!("Container {} reported more files but returned an empty page", container_id);
                break;
            }
        }
        Ok(files)
    }

    async fn list_container_files_page(
        &self,
        container_id: &str,
        after: Option<&str>,
    ) -> Result<ContainerFileList> {
        let url = self.url(&["containers", container_id, "files"])?;
        debug!("GET {} (after: {:?})", url, after);

        let mut builder = self.authorize(self.http.get(url));
        if let Some(after) = after {
            builder = builder.query(&[("after", after)]);
        }

        let response = builder
            .timeout(self.fetch_timeout)
            .send()
            .await
            .context("Failed to list container files")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "Failed to list container files: {} - {}",
                status.as_u16(),
                error_message(&body)
            );
        }

        response
            .json()
            .await
            .context("Failed to parse container file list")
    }

    /// Fetch file content from a container.
    ///
    /// The REST endpoint returns the file's raw bytes whatever its type, so the
    /// body is always handed back as [`FilePayload::Bytes`], even when the
    /// `Content-Type` is JSON. A JSON file produced by the sandbox must be
    /// saved as-is, not unwrapped as an envelope.
    pub async fn retrieve_file_content(
        &self,
        container_id: &str,
        file_id: &str,
    ) -> std::result::Result<FilePayload, CifetchError> {
        let url = self.url(&["containers", container_id, "files", file_id, "content"])?;
        debug!("GET {}", url);

        let response = self
            .authorize(self.http.get(url))
            .timeout(self.fetch_timeout)
            .send()
            .await
            .map_err(|e| CifetchError::Fetch(e.to_string()))?;

        let response = check_status(response).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| CifetchError::Fetch(e.to_string()))?;

        Ok(FilePayload::Bytes(bytes))
    }
}

#[async_trait]
impl ContainerFileSource for Client {
    async fn retrieve_content(
        &self,
        container_id: &str,
        file_id: &str,
    ) -> cifetch_core::Result<FilePayload> {
        self.retrieve_file_content(container_id, file_id).await
    }
}

async fn check_status(response: Response) -> std::result::Result<Response, CifetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(CifetchError::Api {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

/// Pull `error.message` (or `message`) out of an error body, falling back to the raw text
fn error_message(body: &str) -> String {
    let parsed: serde_json::Value = serde_json::from_str(body).unwrap_or_default();
    parsed["error"]["message"]
        .as_str()
        .or_else(|| parsed["message"].as_str())
        .map(str::to_string)
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                "Unknown error".to_string()
            } else {
                body.trim().to_string()
            }
        })
}
