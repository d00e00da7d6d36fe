//! GitHub contents API backend.
//!
//! The rack document lives as a single file in a repository branch. Reads
//! return the blob sha, which is used as the version token; updates send that
//! sha back so GitHub rejects writes based on a stale revision.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::{header, Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{RemoteFile, StorageError, VersionedFileStore};

const API_VERSION: &str = "2022-11-28";

#[derive(Debug, Clone)]
pub struct GithubConfig {
    pub api_url: String,
    /// `owner/name`
    pub repo: String,
    pub branch: String,
    pub token: Option<String>,
    pub user_agent: String,
    pub timeout: Duration,
}

pub struct GithubVersionedStore {
    client: Client,
    config: GithubConfig,
}

#[derive(Deserialize)]
struct ContentsFile {
    sha: String,
    #[serde(default)]
    content: String,
}

#[derive(Serialize)]
struct PutContents<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Deserialize)]
struct PutResponse {
    content: PutContent,
}

#[derive(Deserialize)]
struct PutContent {
    sha: String,
}

#[derive(Deserialize)]
struct ApiMessage {
    message: String,
}

impl GithubVersionedStore {
    pub fn new(config: GithubConfig) -> Result<Self, StorageError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| StorageError::Unavailable(format!("cannot build http client: {e}")))?;
        Ok(Self { client, config })
    }

    fn contents_url(&self, path: &str) -> Result<Url, StorageError> {
        let invalid = || StorageError::Unavailable(format!("invalid GitHub api url {:?}", self.config.api_url));
        let mut url = Url::parse(&self.config.api_url).map_err(|_| invalid())?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| invalid())?;
            segments.pop_if_empty().push("repos");
            segments.extend(self.config.repo.split('/'));
            segments.push("contents");
            segments.extend(path.split('/'));
        }
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header(header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION);
        match &self.config.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn put(&self, path: &str, content: &[u8], sha: Option<&str>, message: &str) -> Result<String, StorageError> {
        let body = PutContents {
            message,
            content: base64::engine::general_purpose::STANDARD.encode(content),
            branch: &self.config.branch,
            sha,
        };
        let url = self.contents_url(path)?;
        let resp = self
            .request(reqwest::Method::PUT, url)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;
        if !resp.status().is_success() {
            return Err(error_for(resp, path).await);
        }
        let parsed: PutResponse = resp
            .json()
            .await
            .map_err(|e| StorageError::Unavailable(format!("unexpected GitHub response: {e}")))?;
        debug!(path, sha = %parsed.content.sha, commit_message = %message, "github contents written");
        Ok(parsed.content.sha)
    }
}

fn transport_error(e: reqwest::Error) -> StorageError {
    warn!(error = %e, "github request failed");
    StorageError::Unavailable(format!("GitHub request failed: {e}"))
}

async fn error_for(resp: reqwest::Response, path: &str) -> StorageError {
    let status = resp.status();
    let message = match resp.json::<ApiMessage>().await {
        Ok(m) => m.message,
        Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
    };
    match status {
        StatusCode::NOT_FOUND => StorageError::NotFound(path.to_string()),
        StatusCode::CONFLICT => StorageError::VersionMismatch,
        // Creating over an existing file is rejected because no sha was sent.
        StatusCode::UNPROCESSABLE_ENTITY if message.contains("sha") => StorageError::VersionMismatch,
        _ => {
            warn!(%status, %message, path, "github api error");
            StorageError::Unavailable(format!("GitHub API returned {status}: {message}"))
        }
    }
}

#[async_trait]
impl VersionedFileStore for GithubVersionedStore {
    async fn get(&self, path: &str) -> Result<RemoteFile, StorageError> {
        let mut url = self.contents_url(path)?;
        url.query_pairs_mut().append_pair("ref", &self.config.branch);
        let resp = self
            .request(reqwest::Method::GET, url)
            .send()
            .await
            .map_err(transport_error)?;
        if !resp.status().is_success() {
            return Err(error_for(resp, path).await);
        }
        let file: ContentsFile = resp
            .json()
            .await
            .map_err(|e| StorageError::Unavailable(format!("unexpected GitHub response: {e}")))?;
        // The API wraps base64 at 60 columns.
        let packed: String = file.content.split_whitespace().collect();
        let content = base64::engine::general_purpose::STANDARD
            .decode(packed)
            .map_err(|e| StorageError::Unavailable(format!("cannot decode GitHub content: {e}")))?;
        debug!(path, sha = %file.sha, bytes = content.len(), "github contents fetched");
        Ok(RemoteFile { content, version: file.sha })
    }

    async fn create(&self, path: &str, content: Vec<u8>, message: &str) -> Result<String, StorageError> {
        self.put(path, &content, None, message).await
    }

    async fn update(&self, path: &str, content: Vec<u8>, expected: &str, message: &str) -> Result<String, StorageError> {
        self.put(path, &content, Some(expected), message).await
    }
}
